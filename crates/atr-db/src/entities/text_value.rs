use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A `(namespace, key) -> value` pair used for miscellaneous configuration
/// that does not warrant its own table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TextValue {
    pub ns: String,
    pub key: String,
    pub value: String,
}

/// Per-release allocation counter backing dense, monotonic revision
/// numbering under a write lock.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RevisionCounter {
    pub release_name: String,
    pub last_allocated_number: i64,
}
