use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum LicenseCheckMode {
    Lightweight,
    Rat,
    Off,
}

/// Per-project configuration governing how releases of that project (and
/// its derivatives) are checked, voted on, and announced.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ReleasePolicy {
    pub id: i64,
    pub source_artifact_globs: Json<Vec<String>>,
    pub binary_artifact_globs: Json<Vec<String>>,
    pub min_hours: Option<i64>,
    pub license_check_mode: LicenseCheckMode,
    pub strict_checking: bool,
    pub mailto_addresses: Json<Vec<String>>,
    pub manual_vote: bool,
    pub pause_for_rm: bool,
    pub preserve_download_files: bool,
    pub github_repository_name: Option<String>,
    pub github_compose_workflow_path: Json<Vec<String>>,
    pub github_vote_workflow_path: Json<Vec<String>>,
    pub github_finish_workflow_path: Json<Vec<String>>,
    pub release_checklist: Option<String>,
    pub vote_template_override: Option<String>,
    pub announce_template_override: Option<String>,
}

impl Default for ReleasePolicy {
    fn default() -> Self {
        Self {
            id: 0,
            source_artifact_globs: Json(vec!["*.tar.gz".to_string(), "*.zip".to_string()]),
            binary_artifact_globs: Json(Vec::new()),
            min_hours: Some(72),
            license_check_mode: LicenseCheckMode::Rat,
            strict_checking: false,
            mailto_addresses: Json(Vec::new()),
            manual_vote: false,
            pause_for_rm: false,
            preserve_download_files: false,
            github_repository_name: None,
            github_compose_workflow_path: Json(Vec::new()),
            github_vote_workflow_path: Json(Vec::new()),
            github_finish_workflow_path: Json(Vec::new()),
            release_checklist: None,
            vote_template_override: None,
            announce_template_override: None,
        }
    }
}
