use atr_core::EngineResult;
use camino::Utf8Path;
use std::fs::File;
use std::io::Read;

const CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// BLAKE3 digest of a file's bytes, read in 4 MiB chunks so hashing a large
/// tarball never requires holding the whole thing in memory at once. This
/// is the `input_hash` that keys check-result cache reuse.
pub fn hash_file(path: &Utf8Path) -> EngineResult<String> {
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::io::Write;

    #[test]
    fn hashes_match_for_identical_content() {
        let dir = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        let a = base.join("a.bin");
        let b = base.join("b.bin");
        std::fs::File::create(&a)
            .unwrap()
            .write_all(b"identical content")
            .unwrap();
        std::fs::File::create(&b)
            .unwrap()
            .write_all(b"identical content")
            .unwrap();

        assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn hashes_differ_for_different_content() {
        let dir = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        let a = base.join("a.bin");
        let b = base.join("b.bin");
        std::fs::File::create(&a).unwrap().write_all(b"one").unwrap();
        std::fs::File::create(&b).unwrap().write_all(b"two").unwrap();

        assert_ne!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }
}
