use camino::Utf8PathBuf;
use serde::Deserialize;

/// The complete, exhaustive configuration surface from the external
/// interfaces section: one immutable struct, loaded once at startup,
/// passed by reference thereafter (see the "Configuration as one immutable
/// struct" design note).
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root of the filesystem hierarchy. Must be absolute.
    pub state_dir: Utf8PathBuf,
    /// Metadata store file, relative to `state_dir`.
    pub sqlite_db_path: Utf8PathBuf,
    /// Enables test-only accounts and admin endpoints.
    pub allow_tests: bool,
    /// Network bind points (opaque to this engine; carried for completeness).
    pub app_host: String,
    pub ssh_host: String,
    pub ssh_port: u16,
    /// Signing keys. Auto-generated if absent from the source file.
    pub jwt_secret_key: String,
    pub secret_key: String,
    /// Upload/archive limits.
    pub max_content_length: u64,
    pub max_extract_size: u64,
    pub extract_chunk_size: u64,
    /// External license-scanner invocation.
    pub apache_rat_jar_path: Option<Utf8PathBuf>,
    /// Foundation-admin set.
    pub admin_users: Vec<String>,
    pub admin_users_additional: Vec<String>,
    /// Opts out of check-result cache reuse.
    pub disable_check_cache: bool,
    /// External service credentials, carried opaquely.
    pub pubsub_url: Option<String>,
    pub ldap_url: Option<String>,
    pub svn_token: Option<String>,
}

impl AppConfig {
    /// `STATE_DIR/SQLITE_DB_PATH`.
    pub fn database_path(&self) -> Utf8PathBuf {
        self.state_dir.join(&self.sqlite_db_path)
    }

    /// The full set of users treated as foundation admins.
    pub fn all_admin_users(&self) -> Vec<String> {
        let mut users = self.admin_users.clone();
        users.extend(self.admin_users_additional.iter().cloned());
        users
    }

    pub fn is_admin(&self, asf_uid: &str) -> bool {
        self.admin_users.iter().any(|u| u == asf_uid) || self.admin_users_additional.iter().any(|u| u == asf_uid)
    }
}

/// The on-disk (TOML) representation. Every field is optional; absent
/// fields fall back to the hard defaults in [`RawConfig::into_app_config`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub state_dir: Option<String>,
    pub sqlite_db_path: Option<String>,
    pub allow_tests: Option<bool>,
    pub app_host: Option<String>,
    pub ssh_host: Option<String>,
    pub ssh_port: Option<u16>,
    pub jwt_secret_key: Option<String>,
    pub secret_key: Option<String>,
    pub max_content_length: Option<u64>,
    pub max_extract_size: Option<u64>,
    pub extract_chunk_size: Option<u64>,
    pub apache_rat_jar_path: Option<String>,
    pub admin_users: Option<Vec<String>>,
    pub admin_users_additional: Option<Vec<String>>,
    pub disable_check_cache: Option<bool>,
    pub pubsub_url: Option<String>,
    pub ldap_url: Option<String>,
    pub svn_token: Option<String>,
}

pub const DEFAULT_SQLITE_DB_PATH: &str = "atr.db";
pub const DEFAULT_MAX_CONTENT_LENGTH: u64 = 512 * 1024 * 1024;
pub const DEFAULT_MAX_EXTRACT_SIZE: u64 = 2 * 1024 * 1024 * 1024;
pub const DEFAULT_EXTRACT_CHUNK_SIZE: u64 = 8192;
pub const DEFAULT_SSH_PORT: u16 = 2222;
