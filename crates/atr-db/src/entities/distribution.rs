use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DistributionPlatform {
    Npm,
    PyPi,
    Maven,
    CratesIo,
    DockerHub,
    GitHubPackages,
}

/// A record that a release has been published to an external package
/// platform. `(release_name, platform, owner_namespace, package, version)`
/// is the primary key; staging rows may be upgraded in place.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Distribution {
    pub release_name: String,
    pub platform: DistributionPlatform,
    pub owner_namespace: String,
    pub package: String,
    pub version: String,
    pub staging: bool,
    pub upload_date: DateTime<Utc>,
    pub api_url: String,
    pub web_url: String,
}
