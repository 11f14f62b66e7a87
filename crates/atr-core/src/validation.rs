//! Grammar checks shared across the metadata store and the HTTP/ingest
//! boundary that consumes this engine. Kept here, rather than duplicated at
//! each call site, because §8 treats these as quantified invariants.

use crate::error::EngineError;
use once_cell::sync::Lazy;
use regex::Regex;

static VERSION_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9.+-]+$").unwrap());
static COMMITTEE_OR_PROJECT_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap());

/// Validate a release version string: non-empty, restricted to
/// `[A-Za-z0-9.+-]`, and must begin and end on an alphanumeric character.
pub fn validate_version_name(version: &str) -> Result<(), EngineError> {
    if version.is_empty() {
        return Err(EngineError::validation("version name must not be empty"));
    }
    if !VERSION_CHARS.is_match(version) {
        return Err(EngineError::validation(format!(
            "version name {version:?} contains disallowed characters"
        )));
    }
    let first = version.chars().next().unwrap();
    let last = version.chars().next_back().unwrap();
    if !first.is_alphanumeric() || !last.is_alphanumeric() {
        return Err(EngineError::validation(format!(
            "version name {version:?} must begin and end with an alphanumeric character"
        )));
    }
    Ok(())
}

/// Validate a committee or project name: lowercase alphanumeric segments
/// joined by single hyphens, e.g. `httpd`, `incubator-pie`.
pub fn validate_short_name(name: &str) -> Result<(), EngineError> {
    if !COMMITTEE_OR_PROJECT_NAME.is_match(name) {
        return Err(EngineError::validation(format!(
            "{name:?} must be lowercase alphanumeric segments joined by hyphens"
        )));
    }
    Ok(())
}

/// The minimum width of a zero-padded revision number, e.g. `00001`.
pub const REVISION_NUMBER_WIDTH: usize = 5;

/// Format a 1-based revision sequence number as a zero-padded string.
pub fn format_revision_number(seq: u32) -> String {
    format!("{seq:0width$}", width = REVISION_NUMBER_WIDTH)
}

/// Parse a zero-padded revision number back into its sequence number.
pub fn parse_revision_number(number: &str) -> Result<u32, EngineError> {
    number
        .parse::<u32>()
        .map_err(|_| EngineError::validation(format!("malformed revision number {number:?}")))
}

/// Canonical `(project, version) -> release name` join used as the
/// Release entity's natural key throughout the store.
pub fn release_name(project_name: &str, version_name: &str) -> String {
    format!("{project_name}-{version_name}")
}
