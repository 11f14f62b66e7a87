//! Minimal `{{placeholder}}` substitution for vote subject/body templates.
//!
//! The original system renders these with a full Jinja environment;
//! grounded here as a direct string-substitution layer since the
//! surrounding HTML templating engine is out of scope (see §1's
//! non-goals). Substitution must happen before the task is enqueued
//! rather than inside the task handler, because the call site (not the
//! worker) knows the caller's chosen recipient and revision.

use std::collections::BTreeMap;

/// The values a vote-start template may reference.
#[derive(Debug, Clone, Default)]
pub struct StartVoteOptions {
    pub asf_uid: String,
    pub fullname: String,
    pub project_name: String,
    pub version_name: String,
    pub vote_duration_hours: i64,
    pub vote_end: String,
    pub revision_number: String,
    pub committee_name: String,
}

impl StartVoteOptions {
    fn as_map(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("asf_uid", self.asf_uid.clone()),
            ("fullname", self.fullname.clone()),
            ("project_name", self.project_name.clone()),
            ("version_name", self.version_name.clone()),
            ("vote_duration", self.vote_duration_hours.to_string()),
            ("vote_end", self.vote_end.clone()),
            ("revision_number", self.revision_number.clone()),
            ("committee_name", self.committee_name.clone()),
        ])
    }
}

/// Substitutes every `{{key}}` occurrence in `template` with the matching
/// field of `options`. An unrecognized placeholder is left verbatim rather
/// than erroring, since a caller-supplied subject/body override may
/// legitimately contain literal double braces.
pub fn substitute(template: &str, options: &StartVoteOptions) -> String {
    let mut rendered = template.to_string();
    for (key, value) in options.as_map() {
        rendered = rendered.replace(&format!("{{{{{key}}}}}"), &value);
    }
    rendered
}
