use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, EnumString, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleasePhase {
    CandidateDraft,
    Candidate,
    Preview,
    Release,
}

impl ReleasePhase {
    /// Only the draft phase permits filesystem or metadata mutation.
    pub fn is_mutable(self) -> bool {
        matches!(self, Self::CandidateDraft)
    }
}

/// One versioned release of a project. Identity is the composite
/// `(project_name, version)`, canonicalized into `name`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Release {
    pub name: String,
    pub project_name: String,
    pub version: String,
    pub phase: ReleasePhase,
    pub created: DateTime<Utc>,
    pub released: Option<DateTime<Utc>>,
    pub release_policy_id: Option<i64>,
    /// The currently open or most recent vote thread id, if any.
    pub vote_thread_id: Option<String>,
    pub vote_started: Option<DateTime<Utc>>,
    pub vote_duration_hours: Option<i64>,
    /// Set on the first round of a two-round podling vote; the second
    /// round's resolution replies into this thread too.
    pub podling_thread_id: Option<String>,
    pub manual_vote: bool,
    /// The `<committee>/<path-suffix>` tail under `finished/`/`downloads/`
    /// this release was announced to. Unset until `announce` runs.
    pub path_suffix: Option<String>,
}
