use atr_db::entities::{CheckResult, CheckResultIgnore, CheckResultIgnoreStatus};
use globset::Glob;

/// Applies committee-scoped ignore rules at display time: the underlying
/// [`CheckResult`] rows are never altered, only filtered out of the slice
/// returned here.
pub fn filter_ignored(results: &[CheckResult], release_name: &str, ignores: &[CheckResultIgnore]) -> Vec<CheckResult> {
    results
        .iter()
        .filter(|result| !matches_any(result, release_name, ignores))
        .cloned()
        .collect()
}

fn matches_any(result: &CheckResult, release_name: &str, ignores: &[CheckResultIgnore]) -> bool {
    ignores.iter().any(|rule| matches_rule(result, release_name, rule))
}

fn matches_rule(result: &CheckResult, release_name: &str, rule: &CheckResultIgnore) -> bool {
    if !glob_matches(&rule.release_glob, release_name) {
        return false;
    }
    if let Some(revision_number) = &rule.revision_number {
        if revision_number != &result.revision_number {
            return false;
        }
    }
    if !glob_matches(&rule.checker_glob, &result.checker) {
        return false;
    }
    if !glob_matches(&rule.primary_rel_path_glob, result.primary_rel_path.as_deref().unwrap_or("")) {
        return false;
    }
    if !glob_matches(&rule.member_rel_path_glob, result.member_rel_path.as_deref().unwrap_or("")) {
        return false;
    }
    if rule.status != CheckResultIgnoreStatus::Any && rule.status.to_string() != result.status.to_string() {
        return false;
    }
    glob_matches(&rule.message_glob, result.message.as_deref().unwrap_or(""))
}

fn glob_matches(pattern: &str, candidate: &str) -> bool {
    if pattern.is_empty() || pattern == "*" {
        return true;
    }
    Glob::new(pattern)
        .map(|g| g.compile_matcher().is_match(candidate))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_result() -> CheckResult {
        CheckResult {
            id: 1,
            release_name: "foo-1.0.0".to_string(),
            revision_number: "00001".to_string(),
            checker: "rat-check".to_string(),
            primary_rel_path: Some("foo-1.0.0-src.tar.gz".to_string()),
            member_rel_path: Some("foo-1.0.0/NOTICE".to_string()),
            created: Utc::now(),
            status: atr_db::entities::CheckResultStatus::Warning,
            message: Some("missing license header".to_string()),
            data: None,
            input_hash: None,
        }
    }

    fn sample_rule(status: CheckResultIgnoreStatus) -> CheckResultIgnore {
        CheckResultIgnore {
            id: 1,
            committee_name: "foo".to_string(),
            release_glob: "foo-*".to_string(),
            revision_number: None,
            checker_glob: "rat-check".to_string(),
            primary_rel_path_glob: "*".to_string(),
            member_rel_path_glob: "*NOTICE".to_string(),
            status,
            message_glob: "*".to_string(),
        }
    }

    #[test]
    fn a_matching_rule_filters_the_result_out() {
        let results = vec![sample_result()];
        let ignores = vec![sample_rule(CheckResultIgnoreStatus::Any)];
        assert!(filter_ignored(&results, "foo-1.0.0", &ignores).is_empty());
    }

    #[test]
    fn a_status_mismatch_keeps_the_result() {
        let results = vec![sample_result()];
        let ignores = vec![sample_rule(CheckResultIgnoreStatus::Failure)];
        assert_eq!(filter_ignored(&results, "foo-1.0.0", &ignores).len(), 1);
    }
}
