use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum TaskStatus {
    Queued,
    Active,
    Completed,
    Failed,
}

/// Every task type tag the executor dispatches, registered statically
/// (see the "dynamic task dispatch" design note: no reflective resolution).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    DistributionWorkflow,
    HashingCheck,
    KeysImportFile,
    LicenseFiles,
    LicenseHeaders,
    MessageSend,
    MetadataUpdate,
    PathsCheck,
    RatCheck,
    SbomAugment,
    SbomGenerateCyclonedx,
    SbomOsvScan,
    SbomQsScore,
    SbomToolScore,
    SignatureCheck,
    SvnImportFiles,
    TargzIntegrity,
    TargzStructure,
    VoteInitiate,
    WorkflowStatus,
    ZipformatIntegrity,
    ZipformatStructure,
}

/// One unit of deferred work. Lifecycle: `QUEUED` -> (atomic claim) ->
/// `ACTIVE` -> `COMPLETED` or `FAILED`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub status: TaskStatus,
    pub task_type: TaskType,
    pub task_args: Json<serde_json::Value>,
    pub asf_uid: String,
    pub added: DateTime<Utc>,
    pub scheduled: Option<DateTime<Utc>>,
    pub started: Option<DateTime<Utc>>,
    pub pid: Option<i64>,
    pub completed: Option<DateTime<Utc>>,
    pub result: Option<Json<serde_json::Value>>,
    pub error: Option<String>,
    pub project_name: Option<String>,
    pub version_name: Option<String>,
    pub revision_number: Option<String>,
    pub primary_rel_path: Option<String>,
}
