use atr_core::EngineResult;
use sqlx::SqlitePool;

use crate::entities::{CheckResult, CheckResultStatus};

#[derive(Debug, Default, Clone)]
pub struct CheckResultQuery {
    release_name: Option<String>,
    revision_number: Option<String>,
    checker: Option<String>,
    status: Option<CheckResultStatus>,
    input_hash: Option<String>,
    primary_rel_path: Option<String>,
}

impl CheckResultQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn release_name(mut self, release_name: impl Into<String>) -> Self {
        self.release_name = Some(release_name.into());
        self
    }

    pub fn revision_number(mut self, revision_number: impl Into<String>) -> Self {
        self.revision_number = Some(revision_number.into());
        self
    }

    pub fn checker(mut self, checker: impl Into<String>) -> Self {
        self.checker = Some(checker.into());
        self
    }

    pub fn status(mut self, status: CheckResultStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn input_hash(mut self, input_hash: impl Into<String>) -> Self {
        self.input_hash = Some(input_hash.into());
        self
    }

    pub fn primary_rel_path(mut self, primary_rel_path: impl Into<String>) -> Self {
        self.primary_rel_path = Some(primary_rel_path.into());
        self
    }

    fn build(&self) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut binds = Vec::new();

        if let Some(v) = &self.release_name {
            clauses.push("release_name = ?");
            binds.push(v.clone());
        }
        if let Some(v) = &self.revision_number {
            clauses.push("revision_number = ?");
            binds.push(v.clone());
        }
        if let Some(v) = &self.checker {
            clauses.push("checker = ?");
            binds.push(v.clone());
        }
        if let Some(v) = &self.status {
            clauses.push("status = ?");
            binds.push(v.to_string());
        }
        if let Some(v) = &self.input_hash {
            clauses.push("input_hash = ?");
            binds.push(v.clone());
        }
        if let Some(v) = &self.primary_rel_path {
            clauses.push("primary_rel_path = ?");
            binds.push(v.clone());
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        (where_sql, binds)
    }

    pub async fn all(&self, pool: &SqlitePool) -> EngineResult<Vec<CheckResult>> {
        let (where_sql, binds) = self.build();
        let sql = format!("SELECT * FROM check_result{where_sql} ORDER BY created");
        let mut query = sqlx::query_as::<_, CheckResult>(&sql);
        for bind in binds {
            query = query.bind(bind);
        }
        Ok(query.fetch_all(pool).await?)
    }

    pub async fn get(&self, pool: &SqlitePool) -> EngineResult<Option<CheckResult>> {
        Ok(self.all(pool).await?.into_iter().next())
    }

    /// Looks for a cached result keyed by `(checker, input_hash, primary_rel_path)`,
    /// the identity the check orchestrator reuses across revisions that did
    /// not change the underlying bytes.
    pub async fn cached(
        pool: &SqlitePool,
        checker: &str,
        input_hash: &str,
        primary_rel_path: &str,
    ) -> EngineResult<Option<CheckResult>> {
        CheckResultQuery::new()
            .checker(checker)
            .input_hash(input_hash)
            .primary_rel_path(primary_rel_path)
            .get(pool)
            .await
    }
}
