use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use strum::{Display, EnumString};

/// Polymorphic check outcome, mirrored in the database as a status column
/// (see the "polymorphic check results" design note).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum CheckResultStatus {
    Success,
    Warning,
    Failure,
    Exception,
}

/// One finding of a checker on a revision. Append-only within a revision;
/// cache reuse is keyed by `(checker, input_hash, primary_rel_path)`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CheckResult {
    pub id: i64,
    pub release_name: String,
    pub revision_number: String,
    pub checker: String,
    pub primary_rel_path: Option<String>,
    pub member_rel_path: Option<String>,
    pub created: DateTime<Utc>,
    pub status: CheckResultStatus,
    pub message: Option<String>,
    pub data: Option<Json<serde_json::Value>>,
    pub input_hash: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum CheckResultIgnoreStatus {
    Success,
    Warning,
    Failure,
    Exception,
    /// Ignore the row regardless of its recorded status.
    Any,
}

/// A committee-scoped glob-pattern rule applied to [`CheckResult`] rows at
/// *display* time only; the underlying rows are never altered or skipped
/// at record time.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CheckResultIgnore {
    pub id: i64,
    pub committee_name: String,
    pub release_glob: String,
    pub revision_number: Option<String>,
    pub checker_glob: String,
    pub primary_rel_path_glob: String,
    pub member_rel_path_glob: String,
    pub status: CheckResultIgnoreStatus,
    pub message_glob: String,
}
