use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::release::ReleasePhase;

/// One immutable snapshot of a release's content.
///
/// Revisions within a release form a total order by `seq`; numbering gaps
/// are forbidden. Once sealed, neither the row nor its directory mutates.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Revision {
    pub id: i64,
    pub release_name: String,
    pub seq: i64,
    /// Zero-padded, e.g. `00005`.
    pub number: String,
    pub asfuid: String,
    pub created: DateTime<Utc>,
    pub phase: ReleasePhase,
    pub parent_name: Option<String>,
    pub description: Option<String>,
}

impl Revision {
    /// The composite natural key `<release_name>-<number>`, used as the
    /// `parent_name` back-reference of the next revision created.
    pub fn name(&self) -> String {
        format!("{}-{}", self.release_name, self.number)
    }
}
