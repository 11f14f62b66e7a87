use atr_core::{EngineError, EngineResult};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

/// Age past which a lock is considered abandoned rather than held by a
/// live worker, absent other evidence. Crash recovery still prefers
/// checking whether the owning PID is alive over waiting out this window.
const STALE_THRESHOLD_SECS: u64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LockInfo {
    pid: u32,
    created_at: u64,
    release_name: String,
}

/// An advisory, crash-recoverable exclusive lock over one release's
/// content-store subtree. Revision creation and promotion both take this
/// lock before touching `unfinished/<project>/<version>` so that two
/// workers racing on the same release serialize instead of corrupting the
/// revision sequence.
pub struct ReleaseLock {
    lock_path: Utf8PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("release '{release_name}' is locked by another live process (pid {pid})")]
    Held { release_name: String, pid: u32 },

    #[error("failed to acquire release lock: {0}")]
    Acquisition(#[source] io::Error),
}

impl ReleaseLock {
    /// Acquires the lock for `release_name`, whose lock file lives at
    /// `<tmp>/locks/<release_name>.lock`. Stale locks (owning process no
    /// longer running) are reclaimed automatically; live locks fail fast.
    pub fn acquire(tmp_dir: &Utf8Path, release_name: &str) -> Result<Self, LockError> {
        let lock_dir = tmp_dir.join("locks");
        fs::create_dir_all(&lock_dir).map_err(LockError::Acquisition)?;
        let lock_path = lock_dir.join(format!("{release_name}.lock"));

        match fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&lock_path)
        {
            Ok(mut file) => {
                use std::io::Write;
                let info = LockInfo {
                    pid: process::id(),
                    created_at: now_secs(),
                    release_name: release_name.to_string(),
                };
                let json = serde_json::to_string(&info).expect("LockInfo always serializes");
                file.write_all(json.as_bytes())
                    .map_err(LockError::Acquisition)?;
                Ok(Self { lock_path })
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                Self::reclaim_or_fail(&lock_path, release_name)
            }
            Err(err) => Err(LockError::Acquisition(err)),
        }
    }

    fn reclaim_or_fail(lock_path: &Utf8Path, release_name: &str) -> Result<Self, LockError> {
        let existing = fs::read_to_string(lock_path).ok();
        let parsed: Option<LockInfo> = existing.and_then(|s| serde_json::from_str(&s).ok());

        let stale = match &parsed {
            Some(info) => {
                !process_is_alive(info.pid) || now_secs().saturating_sub(info.created_at) > STALE_THRESHOLD_SECS
            }
            None => true,
        };

        if !stale {
            let pid = parsed.map(|info| info.pid).unwrap_or(0);
            return Err(LockError::Held {
                release_name: release_name.to_string(),
                pid,
            });
        }

        fs::remove_file(lock_path).ok();
        Self::acquire_fresh(lock_path, release_name)
    }

    fn acquire_fresh(lock_path: &Utf8Path, release_name: &str) -> Result<Self, LockError> {
        use std::io::Write;
        let mut file = fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(lock_path)
            .map_err(LockError::Acquisition)?;
        let info = LockInfo {
            pid: process::id(),
            created_at: now_secs(),
            release_name: release_name.to_string(),
        };
        let json = serde_json::to_string(&info).expect("LockInfo always serializes");
        file.write_all(json.as_bytes())
            .map_err(LockError::Acquisition)?;
        Ok(Self {
            lock_path: lock_path.to_owned(),
        })
    }
}

impl Drop for ReleaseLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

impl From<LockError> for EngineError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Held { release_name, pid } => {
                EngineError::conflict(format!("release {release_name} locked by pid {pid}"))
            }
            LockError::Acquisition(io_err) => EngineError::Io(io_err),
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(unix)]
fn process_is_alive(pid: u32) -> bool {
    // Signal 0 performs no-op permission/existence checks per kill(2).
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
}

#[cfg(not(unix))]
fn process_is_alive(_pid: u32) -> bool {
    true
}

pub fn acquire(tmp_dir: &Utf8Path, release_name: &str) -> EngineResult<ReleaseLock> {
    ReleaseLock::acquire(tmp_dir, release_name).map_err(EngineError::from)
}
