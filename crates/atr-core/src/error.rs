use std::io;
use thiserror::Error;

/// The error taxonomy shared by every layer of the release engine.
///
/// Each variant corresponds to a propagation policy, not a type name:
/// see the component modules for which operations return which kinds.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The authorization facade refused the operation. Never retried.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Caller input failed a domain constraint.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Optimistic-concurrency failure: the caller should refresh and retry.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The target entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A revision-creation contract signal raised by the caller inside
    /// `create_and_manage` to abort cleanly. Not an error to end users.
    #[error("operation failed: {0}")]
    Failed(String),

    /// A subprocess, HTTP, or SSH collaborator failed.
    #[error("external collaborator failed: {0}")]
    External(String),

    /// A startup-time configuration error. The process should exit.
    #[error("fatal configuration error: {0}")]
    Fatal(String),

    #[error("filesystem error: {0}")]
    Io(#[from] io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(what: impl Into<String>) -> Self {
        Self::Conflict(what.into())
    }

    pub fn validation(what: impl Into<String>) -> Self {
        Self::Validation(what.into())
    }

    pub fn access_denied(what: impl Into<String>) -> Self {
        Self::AccessDenied(what.into())
    }

    pub fn failed(what: impl Into<String>) -> Self {
        Self::Failed(what.into())
    }

    /// True for the soft "Failed" signal that `create_and_manage` treats as
    /// a clean abort rather than a propagating exception.
    pub fn is_failed_signal(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}
