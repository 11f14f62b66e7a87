//! A buffered, channel-backed JSON-lines writer.
//!
//! Disk I/O must never block the caller's transaction path (see the audit
//! log design note). Callers push a `serde_json::Value` onto an unbounded
//! channel; a dedicated background task drains it and appends one line per
//! message to the target file, fsyncing after every write so that the log
//! survives a crash of the writing process.

use camino::Utf8PathBuf;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// Handle to a background JSON-lines appender.
#[derive(Clone)]
pub struct JsonlChannelWriter {
    tx: mpsc::UnboundedSender<Value>,
}

impl JsonlChannelWriter {
    /// Spawn the writer task for `path`. The parent directory must already
    /// exist. Returns the handle and the background task's join handle, the
    /// latter useful only for orderly shutdown in tests.
    pub fn spawn(path: Utf8PathBuf) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Value>();

        let handle = tokio::spawn(async move {
            loop {
                let Some(value) = rx.recv().await else {
                    break;
                };
                if let Err(e) = Self::append_blocking(&path, &value) {
                    error!(error = %e, path = %path, "failed to append audit record");
                }
            }
        });

        (Self { tx }, handle)
    }

    /// Enqueue a record. Never blocks; drops the record with a warning if the
    /// writer task has already exited (e.g. during shutdown).
    pub fn send(&self, value: Value) {
        if self.tx.send(value).is_err() {
            warn!("audit writer channel closed, dropping record");
        }
    }

    fn append_blocking(path: &Utf8PathBuf, value: &Value) -> std::io::Result<()> {
        let mut line = serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string());
        line.push('\n');

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(line.as_bytes())?;
        file.sync_data()
    }
}
