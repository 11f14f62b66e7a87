use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// An OpenPGP public key declared by a user, optionally bound to one or
/// more committees for release-signing purposes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PublicSigningKey {
    pub fingerprint: String,
    pub algorithm: String,
    pub length: i64,
    pub created: DateTime<Utc>,
    pub expires: Option<DateTime<Utc>>,
    pub primary_declared_uid: Option<String>,
    pub secondary_declared_uids: Json<Vec<String>>,
    pub apache_uid: Option<String>,
    pub ascii_armored_key: String,
}

/// An SSH public key used for authenticating rsync/SSH ingest (the ingest
/// server itself is out of scope; this is just the credential record).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SshKey {
    pub fingerprint: String,
    pub key: String,
    pub asf_uid: String,
}

/// A short-lived SSH key scoped to one project, used by CI workflows.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WorkflowSshKey {
    pub fingerprint: String,
    pub key: String,
    pub project_name: String,
    pub expires: i64,
    pub asf_uid: String,
    pub github_uid: Option<String>,
    pub github_nid: Option<i64>,
}

/// An API credential a user can present in place of interactive auth.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PersonalAccessToken {
    pub id: i64,
    pub asf_uid: String,
    pub token_hash: String,
    pub label: String,
    pub created: DateTime<Utc>,
    pub expires: Option<DateTime<Utc>>,
    pub last_used: Option<DateTime<Utc>>,
}
