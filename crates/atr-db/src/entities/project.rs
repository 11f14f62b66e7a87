use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ProjectStatus {
    Active,
    Retired,
}

/// A named release line under a committee.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub full_name: String,
    pub committee_name: String,
    pub status: ProjectStatus,
    pub super_project_name: Option<String>,
    pub categories: Json<Vec<String>>,
    pub languages: Json<Vec<String>>,
    pub release_policy_id: Option<i64>,
}
