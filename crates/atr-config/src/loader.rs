use atr_core::error::{EngineError, EngineResult};
use camino::Utf8PathBuf;
use tracing::info;

use crate::discovery::discover_config_path;
use crate::model::{
    AppConfig, DEFAULT_EXTRACT_CHUNK_SIZE, DEFAULT_MAX_CONTENT_LENGTH, DEFAULT_MAX_EXTRACT_SIZE,
    DEFAULT_SQLITE_DB_PATH, DEFAULT_SSH_PORT, RawConfig,
};
use crate::secrets::generate_secret;

/// Load configuration using the standard discovery order, falling back to
/// hard defaults when no file is found. `state_dir` must end up absolute;
/// a relative `STATE_DIR` in the file is rejected as a fatal startup error.
pub fn load() -> EngineResult<AppConfig> {
    match discover_config_path() {
        Some(path) => {
            info!(path = %path, "loading configuration");
            load_from_path(&path)
        }
        None => {
            info!("no configuration file found, using defaults");
            build(RawConfig::default())
        }
    }
}

pub fn load_from_path(path: &Utf8PathBuf) -> EngineResult<AppConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| EngineError::Fatal(format!("failed to read config file {path}: {e}")))?;
    let raw: RawConfig =
        toml::from_str(&contents).map_err(|e| EngineError::Fatal(format!("malformed config file {path}: {e}")))?;
    build(raw)
}

fn build(raw: RawConfig) -> EngineResult<AppConfig> {
    let state_dir = match raw.state_dir {
        Some(s) => Utf8PathBuf::from(s),
        None => Utf8PathBuf::from_path_buf(
            std::env::current_dir().map_err(|e| EngineError::Fatal(format!("cannot resolve cwd: {e}")))?,
        )
        .map_err(|_| EngineError::Fatal("current directory is not valid UTF-8".to_string()))?
        .join("state"),
    };
    if !state_dir.is_absolute() {
        return Err(EngineError::Fatal(format!("STATE_DIR must be an absolute path, got {state_dir}")));
    }

    Ok(AppConfig {
        state_dir,
        sqlite_db_path: Utf8PathBuf::from(raw.sqlite_db_path.unwrap_or_else(|| DEFAULT_SQLITE_DB_PATH.to_string())),
        allow_tests: raw.allow_tests.unwrap_or(false),
        app_host: raw.app_host.unwrap_or_else(|| "127.0.0.1:8080".to_string()),
        ssh_host: raw.ssh_host.unwrap_or_else(|| "127.0.0.1".to_string()),
        ssh_port: raw.ssh_port.unwrap_or(DEFAULT_SSH_PORT),
        jwt_secret_key: raw.jwt_secret_key.unwrap_or_else(generate_secret),
        secret_key: raw.secret_key.unwrap_or_else(generate_secret),
        max_content_length: raw.max_content_length.unwrap_or(DEFAULT_MAX_CONTENT_LENGTH),
        max_extract_size: raw.max_extract_size.unwrap_or(DEFAULT_MAX_EXTRACT_SIZE),
        extract_chunk_size: raw.extract_chunk_size.unwrap_or(DEFAULT_EXTRACT_CHUNK_SIZE),
        apache_rat_jar_path: raw.apache_rat_jar_path.map(Utf8PathBuf::from),
        admin_users: raw.admin_users.unwrap_or_default(),
        admin_users_additional: raw.admin_users_additional.unwrap_or_default(),
        disable_check_cache: raw.disable_check_cache.unwrap_or(false),
        pubsub_url: raw.pubsub_url,
        ldap_url: raw.ldap_url,
        svn_token: raw.svn_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_applied_when_file_is_mostly_empty() {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().join("state");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("atr.toml")).unwrap();
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "state_dir = {:?}", state_dir.to_str().unwrap()).unwrap();

        let config = load_from_path(&path).unwrap();
        assert_eq!(config.sqlite_db_path.as_str(), DEFAULT_SQLITE_DB_PATH);
        assert_eq!(config.max_content_length, DEFAULT_MAX_CONTENT_LENGTH);
        assert!(!config.jwt_secret_key.is_empty());
        assert!(!config.allow_tests);
    }

    #[test]
    fn relative_state_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("atr.toml")).unwrap();
        std::fs::write(&path, "state_dir = \"relative/path\"\n").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, EngineError::Fatal(_)));
    }
}
