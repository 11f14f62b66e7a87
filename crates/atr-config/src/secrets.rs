use rand::RngCore;
use rand::rngs::OsRng;

/// Generate a URL-safe hex secret, matching the width conventionally used
/// for auto-generated signing keys (32 bytes, 64 hex characters).
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_distinct_secrets_of_expected_length() {
        let a = generate_secret();
        let b = generate_secret();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }
}
