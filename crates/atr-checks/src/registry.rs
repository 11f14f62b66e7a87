use atr_db::entities::TaskType;

/// Suffix-to-checker dispatch table. Order matters only in that a longer,
/// more specific suffix (`.tar.gz`, `.cdx.json`) must be tried before a
/// shorter one (`.gz`, `.json`) would otherwise shadow it — this table
/// never checks a bare `.gz` or `.json` at all, so no such shadowing exists.
pub fn checker_for_suffix(file_name: &str) -> Vec<TaskType> {
    let lower = file_name.to_ascii_lowercase();

    if lower.ends_with(".asc") {
        return vec![TaskType::SignatureCheck];
    }
    if lower.ends_with(".sha256") || lower.ends_with(".sha512") {
        return vec![TaskType::HashingCheck];
    }
    if lower.ends_with(".cdx.json") {
        return vec![TaskType::SbomToolScore];
    }
    if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
        return vec![
            TaskType::LicenseFiles,
            TaskType::LicenseHeaders,
            TaskType::RatCheck,
            TaskType::TargzIntegrity,
            TaskType::TargzStructure,
        ];
    }
    if lower.ends_with(".zip") {
        return vec![
            TaskType::LicenseFiles,
            TaskType::LicenseHeaders,
            TaskType::RatCheck,
            TaskType::ZipformatIntegrity,
            TaskType::ZipformatStructure,
        ];
    }
    Vec::new()
}

/// Checks run once per revision rather than once per file.
pub fn release_level_checks() -> Vec<TaskType> {
    vec![TaskType::PathsCheck]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tarballs_get_the_full_archive_checker_set() {
        let checks = checker_for_suffix("apache-foo-1.0.0-src.tar.gz");
        assert!(checks.contains(&TaskType::RatCheck));
        assert!(checks.contains(&TaskType::TargzIntegrity));
        assert_eq!(checks.len(), 5);
    }

    #[test]
    fn cyclonedx_sboms_are_not_mistaken_for_plain_json() {
        assert_eq!(checker_for_suffix("foo-1.0.0.cdx.json"), vec![TaskType::SbomToolScore]);
    }

    #[test]
    fn unrecognized_suffixes_get_no_checks() {
        assert!(checker_for_suffix("README.md").is_empty());
    }
}
