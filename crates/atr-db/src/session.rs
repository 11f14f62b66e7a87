use atr_core::{EngineError, EngineResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use std::time::Duration;

/// Opens the pool and applies the pragmas the metadata store depends on
/// for correctness under concurrent writers: WAL journaling, a bounded
/// page cache, foreign-key enforcement, and a busy timeout so a writer
/// blocks briefly instead of failing immediately on `SQLITE_BUSY`.
pub async fn connect(database_path: &str) -> EngineResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{database_path}"))
        .map_err(|err| EngineError::Fatal(format!("invalid database path: {err}")))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_millis(5000))
        .pragma("cache_size", "-64000");

    let pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// A thin wrapper over a pooled connection or transaction, matching the
/// write-lock discipline the revision allocator and release state machine
/// both depend on: a caller that needs a monotonic counter or a guarded
/// phase transition calls [`Session::begin_immediate`] rather than `begin`,
/// taking SQLite's reserved lock up front instead of on first write.
pub struct Session {
    pool: SqlitePool,
}

impl Session {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn begin(&self) -> EngineResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Starts a transaction that takes SQLite's write lock immediately,
    /// rather than lazily on the first write statement. Used wherever two
    /// concurrent callers racing to read-then-write a counter or a phase
    /// column must be serialized rather than silently both succeeding.
    pub async fn begin_immediate(&self) -> EngineResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    pub async fn ns_text_get(&self, ns: &str, key: &str) -> EngineResult<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM text_value WHERE ns = ? AND key = ?")
                .bind(ns)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(value,)| value))
    }

    pub async fn ns_text_set(&self, ns: &str, key: &str, value: &str) -> EngineResult<()> {
        sqlx::query(
            "INSERT INTO text_value (ns, key, value) VALUES (?, ?, ?)
             ON CONFLICT (ns, key) DO UPDATE SET value = excluded.value",
        )
        .bind(ns)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn ns_text_del(&self, ns: &str, key: &str) -> EngineResult<()> {
        sqlx::query("DELETE FROM text_value WHERE ns = ? AND key = ?")
            .bind(ns)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn ns_text_del_all(&self, ns: &str) -> EngineResult<()> {
        sqlx::query("DELETE FROM text_value WHERE ns = ?")
            .bind(ns)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn ns_text_get_all(&self, ns: &str) -> EngineResult<Vec<(String, String)>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM text_value WHERE ns = ? ORDER BY key")
                .bind(ns)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }
}

impl Clone for Session {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}
