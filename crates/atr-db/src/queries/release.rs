use atr_core::{EngineError, EngineResult};
use sqlx::SqlitePool;

use crate::entities::{Release, ReleasePhase};

#[derive(Debug, Default, Clone)]
pub struct ReleaseQuery {
    name: Option<String>,
    project_name: Option<String>,
    version: Option<String>,
    phase: Option<ReleasePhase>,
}

impl ReleaseQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn project_name(mut self, project_name: impl Into<String>) -> Self {
        self.project_name = Some(project_name.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn phase(mut self, phase: ReleasePhase) -> Self {
        self.phase = Some(phase);
        self
    }

    fn build(&self) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut binds = Vec::new();

        if let Some(name) = &self.name {
            clauses.push("name = ?");
            binds.push(name.clone());
        }
        if let Some(project_name) = &self.project_name {
            clauses.push("project_name = ?");
            binds.push(project_name.clone());
        }
        if let Some(version) = &self.version {
            clauses.push("version = ?");
            binds.push(version.clone());
        }
        if let Some(phase) = &self.phase {
            clauses.push("phase = ?");
            binds.push(phase.to_string());
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        (where_sql, binds)
    }

    pub async fn all(&self, pool: &SqlitePool) -> EngineResult<Vec<Release>> {
        let (where_sql, binds) = self.build();
        let sql = format!("SELECT * FROM release{where_sql} ORDER BY created");
        let mut query = sqlx::query_as::<_, Release>(&sql);
        for bind in binds {
            query = query.bind(bind);
        }
        Ok(query.fetch_all(pool).await?)
    }

    pub async fn get(&self, pool: &SqlitePool) -> EngineResult<Option<Release>> {
        Ok(self.all(pool).await?.into_iter().next())
    }

    pub async fn demand(&self, pool: &SqlitePool, not_found_msg: &str) -> EngineResult<Release> {
        self.get(pool)
            .await?
            .ok_or_else(|| EngineError::not_found(not_found_msg))
    }
}
