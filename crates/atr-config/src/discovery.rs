use camino::{Utf8Path, Utf8PathBuf};

const CONFIG_FILE_NAME: &str = "atr.toml";
const ENV_OVERRIDE: &str = "ATR_CONFIG_PATH";

/// Resolve the configuration file to load, in precedence order:
/// 1. `ATR_CONFIG_PATH` environment variable, if set.
/// 2. `./atr.toml` in the current directory.
/// 3. `atr.toml` at the root of the enclosing git repository, found by
///    walking up from the current directory looking for `.git`.
/// 4. `$XDG_CONFIG_HOME/atr/config.toml` (or the platform equivalent).
///
/// Returns `None` if nothing is found at any of these locations, in which
/// case the caller should proceed with hard defaults.
pub fn discover_config_path() -> Option<Utf8PathBuf> {
    if let Ok(path) = std::env::var(ENV_OVERRIDE) {
        let path = Utf8PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd = std::env::current_dir().ok().and_then(|p| Utf8PathBuf::from_path_buf(p).ok())?;

    let local = cwd.join(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }

    if let Some(repo_root) = find_repo_root(&cwd) {
        let candidate = repo_root.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            return Some(candidate);
        }
    }

    let config_dir = dirs::config_dir().and_then(|p| Utf8PathBuf::from_path_buf(p).ok())?;
    let candidate = config_dir.join("atr").join("config.toml");
    if candidate.exists() {
        return Some(candidate);
    }

    None
}

fn find_repo_root(start: &Utf8Path) -> Option<Utf8PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(".git").exists() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_root_is_found_by_walking_up() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::create_dir(root.join(".git")).unwrap();
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_repo_root(&nested), Some(root));
    }

    #[test]
    fn no_repo_root_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let leaf = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        assert_eq!(find_repo_root(&leaf), None);
    }
}
