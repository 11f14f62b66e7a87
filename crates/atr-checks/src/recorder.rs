use atr_core::{EngineError, EngineResult};
use atr_db::entities::{CheckResult, CheckResultStatus};
use atr_db::CheckResultQuery;
use atr_storage::ContentStore;
use camino::Utf8PathBuf;
use chrono::Utc;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// The `.atr-no-cache` marker file: its presence in a revision directory
/// bypasses cache reuse for every checker run against that revision.
const NO_CACHE_MARKER: &str = ".atr-no-cache";

type RecorderFuture = Pin<Box<dyn Future<Output = EngineResult<Recorder>> + Send>>;

/// A factory a task handler hands to a checker so the checker can construct
/// its own [`Recorder`] lazily, only once it actually has something to
/// record — matching the "lazy recorder factory" design note.
pub type RecorderFactory = Box<dyn Fn() -> RecorderFuture + Send + Sync>;

/// The bundle of arguments a checker [`Task`](atr_db::entities::Task) is run
/// with: enough identity to resolve its own files plus a recorder factory,
/// rather than a pre-built recorder, since not every checker invocation
/// ends up recording anything.
pub struct FunctionArguments {
    pub recorder: RecorderFactory,
    pub asf_uid: String,
    pub project_name: String,
    pub version_name: String,
    pub revision_number: String,
    pub primary_rel_path: Option<String>,
    pub extra_args: serde_json::Map<String, Value>,
}

/// Writes a checker's findings as append-only [`CheckResult`] rows, and
/// reuses a prior revision's rows when `(checker, input_hash,
/// primary_rel_path)` matches one already recorded.
pub struct Recorder {
    pool: SqlitePool,
    pub checker: String,
    pub release_name: String,
    pub project_name: String,
    pub version_name: String,
    pub revision_number: String,
    pub primary_rel_path: Option<String>,
    pub member_rel_path: Option<String>,
    pub afresh: bool,
    constructed: bool,
    member_problems: HashMap<CheckResultStatus, i64>,
    cached: bool,
    input_hash: Option<String>,
}

impl Recorder {
    /// Builds a recorder and, if `afresh`, clears any rows already recorded
    /// for this `(checker, primary_rel_path, member_rel_path)` under this
    /// revision, so a checker re-run (e.g. after a cache invalidation)
    /// never leaves stale findings behind it.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        pool: SqlitePool,
        checker: impl Into<String>,
        project_name: impl Into<String>,
        version_name: impl Into<String>,
        revision_number: impl Into<String>,
        primary_rel_path: Option<String>,
        member_rel_path: Option<String>,
        afresh: bool,
    ) -> EngineResult<Self> {
        let project_name = project_name.into();
        let version_name = version_name.into();
        let release_name = atr_core::validation::release_name(&project_name, &version_name);
        let mut recorder = Self {
            pool,
            checker: checker.into(),
            release_name,
            project_name,
            version_name,
            revision_number: revision_number.into(),
            primary_rel_path,
            member_rel_path,
            afresh,
            constructed: false,
            member_problems: HashMap::new(),
            cached: false,
            input_hash: None,
        };
        if afresh {
            recorder
                .clear(recorder.primary_rel_path.clone(), recorder.member_rel_path.clone())
                .await?;
        }
        recorder.constructed = true;
        Ok(recorder)
    }

    pub fn cached(&self) -> bool {
        self.cached
    }

    pub fn input_hash(&self) -> Option<&str> {
        self.input_hash.as_deref()
    }

    pub fn member_problems(&self) -> &HashMap<CheckResultStatus, i64> {
        &self.member_problems
    }

    pub fn abs_path_base(&self, store: &ContentStore) -> Utf8PathBuf {
        store.revision_dir(&self.project_name, &self.version_name, &self.revision_number)
    }

    pub fn abs_path(&self, store: &ContentStore, rel_path: Option<&str>) -> Option<Utf8PathBuf> {
        let rel = rel_path.or(self.primary_rel_path.as_deref())?;
        Some(self.abs_path_base(store).join(rel))
    }

    /// Hashes `abs_path` and, unless caching is disabled or a `.atr-no-cache`
    /// marker is present, looks for a prior revision's results keyed on the
    /// same `(checker, input_hash, primary_rel_path)`. On a hit, every
    /// matching per-member row is copied forward under this revision number
    /// and `cached()` becomes true; on a miss, the hash is still recorded so
    /// a *later* revision can reuse *this* run's results.
    pub async fn check_cache(
        &mut self,
        store: &ContentStore,
        abs_path: &camino::Utf8Path,
        disable_cache: bool,
    ) -> EngineResult<bool> {
        if !abs_path.is_file() {
            return Ok(false);
        }
        if disable_cache {
            return Ok(false);
        }
        let no_cache_file = self.abs_path_base(store).join(NO_CACHE_MARKER);
        if no_cache_file.exists() {
            return Ok(false);
        }

        let input_hash = atr_storage::hash_file(abs_path)?;
        self.input_hash = Some(input_hash.clone());

        let primary = self
            .primary_rel_path
            .clone()
            .ok_or_else(|| EngineError::validation("check_cache requires a primary_rel_path"))?;
        let cached_rows = CheckResultQuery::new()
            .checker(&self.checker)
            .input_hash(&input_hash)
            .primary_rel_path(&primary)
            .all(&self.pool)
            .await?;
        if cached_rows.is_empty() {
            return Ok(false);
        }

        let latest_per_member = latest_by_member(cached_rows);
        for cached in latest_per_member {
            self.insert_row(
                cached.status,
                cached.message,
                cached.data.map(|j| j.0),
                self.primary_rel_path.clone(),
                cached.member_rel_path,
            )
            .await?;
        }
        self.cached = true;
        Ok(true)
    }

    /// Deletes previously recorded rows for this `(checker, primary_rel_path,
    /// member_rel_path)` under this revision.
    pub async fn clear(&self, primary_rel_path: Option<String>, member_rel_path: Option<String>) -> EngineResult<()> {
        sqlx::query(
            "DELETE FROM check_result
             WHERE release_name = ? AND revision_number = ? AND checker = ?
               AND primary_rel_path IS ? AND member_rel_path IS ?",
        )
        .bind(&self.release_name)
        .bind(&self.revision_number)
        .bind(&self.checker)
        .bind(&primary_rel_path)
        .bind(&member_rel_path)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_row(
        &mut self,
        status: CheckResultStatus,
        message: Option<String>,
        data: Option<Value>,
        primary_rel_path: Option<String>,
        member_rel_path: Option<String>,
    ) -> EngineResult<CheckResult> {
        if !self.constructed {
            return Err(EngineError::Fatal(
                "cannot add a check result to a recorder that has not been constructed".to_string(),
            ));
        }
        if member_rel_path.is_some() && status != CheckResultStatus::Success {
            *self.member_problems.entry(status).or_insert(0) += 1;
        }

        let now = Utc::now();
        let id: (i64,) = sqlx::query_as(
            "INSERT INTO check_result
                (release_name, revision_number, checker, primary_rel_path, member_rel_path,
                 created, status, message, data, input_hash)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&self.release_name)
        .bind(&self.revision_number)
        .bind(&self.checker)
        .bind(&primary_rel_path)
        .bind(&member_rel_path)
        .bind(now)
        .bind(status.to_string())
        .bind(&message)
        .bind(data.map(Json))
        .bind(&self.input_hash)
        .fetch_one(&self.pool)
        .await?;

        let row: CheckResult = sqlx::query_as("SELECT * FROM check_result WHERE id = ?")
            .bind(id.0)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn success(
        &mut self,
        message: impl Into<String>,
        data: Option<Value>,
        member_rel_path: Option<String>,
    ) -> EngineResult<CheckResult> {
        self.insert_row(
            CheckResultStatus::Success,
            Some(message.into()),
            data,
            self.primary_rel_path.clone(),
            member_rel_path,
        )
        .await
    }

    pub async fn warning(
        &mut self,
        message: impl Into<String>,
        data: Option<Value>,
        member_rel_path: Option<String>,
    ) -> EngineResult<CheckResult> {
        self.insert_row(
            CheckResultStatus::Warning,
            Some(message.into()),
            data,
            self.primary_rel_path.clone(),
            member_rel_path,
        )
        .await
    }

    pub async fn failure(
        &mut self,
        message: impl Into<String>,
        data: Option<Value>,
        member_rel_path: Option<String>,
    ) -> EngineResult<CheckResult> {
        self.insert_row(
            CheckResultStatus::Failure,
            Some(message.into()),
            data,
            self.primary_rel_path.clone(),
            member_rel_path,
        )
        .await
    }

    pub async fn exception(
        &mut self,
        message: impl Into<String>,
        data: Option<Value>,
        member_rel_path: Option<String>,
    ) -> EngineResult<CheckResult> {
        self.insert_row(
            CheckResultStatus::Exception,
            Some(message.into()),
            data,
            self.primary_rel_path.clone(),
            member_rel_path,
        )
        .await
    }
}

/// Keeps only the highest-id (most recent) row per `member_rel_path`,
/// mirroring the `GROUP BY member_rel_path, MAX(id)` join the original
/// cache lookup performs.
fn latest_by_member(rows: Vec<CheckResult>) -> Vec<CheckResult> {
    let mut by_member: HashMap<Option<String>, CheckResult> = HashMap::new();
    for row in rows {
        by_member
            .entry(row.member_rel_path.clone())
            .and_modify(|existing| {
                if row.id > existing.id {
                    *existing = row.clone();
                }
            })
            .or_insert(row);
    }
    by_member.into_values().collect()
}
