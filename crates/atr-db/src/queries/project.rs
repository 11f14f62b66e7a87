use atr_core::{EngineError, EngineResult};
use sqlx::SqlitePool;

use crate::entities::{Project, ProjectStatus};

/// A typed, optional-predicate query over the `project` table. Every
/// filter defaults to "no constraint"; call the setters that apply and
/// finish with [`ProjectQuery::get`], [`ProjectQuery::demand`], or
/// [`ProjectQuery::all`].
#[derive(Debug, Default, Clone)]
pub struct ProjectQuery {
    name: Option<String>,
    committee_name: Option<String>,
    status: Option<ProjectStatus>,
    super_project_name: Option<String>,
}

impl ProjectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn committee_name(mut self, committee_name: impl Into<String>) -> Self {
        self.committee_name = Some(committee_name.into());
        self
    }

    pub fn status(mut self, status: ProjectStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn super_project_name(mut self, super_project_name: impl Into<String>) -> Self {
        self.super_project_name = Some(super_project_name.into());
        self
    }

    fn build(&self) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut binds = Vec::new();

        if let Some(name) = &self.name {
            clauses.push("name = ?");
            binds.push(name.clone());
        }
        if let Some(committee_name) = &self.committee_name {
            clauses.push("committee_name = ?");
            binds.push(committee_name.clone());
        }
        if let Some(status) = &self.status {
            clauses.push("status = ?");
            binds.push(status.to_string());
        }
        if let Some(super_project_name) = &self.super_project_name {
            clauses.push("super_project_name = ?");
            binds.push(super_project_name.clone());
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        (where_sql, binds)
    }

    pub async fn all(&self, pool: &SqlitePool) -> EngineResult<Vec<Project>> {
        let (where_sql, binds) = self.build();
        let sql = format!("SELECT * FROM project{where_sql} ORDER BY name");
        let mut query = sqlx::query_as::<_, Project>(&sql);
        for bind in binds {
            query = query.bind(bind);
        }
        Ok(query.fetch_all(pool).await?)
    }

    pub async fn get(&self, pool: &SqlitePool) -> EngineResult<Option<Project>> {
        Ok(self.all(pool).await?.into_iter().next())
    }

    pub async fn demand(&self, pool: &SqlitePool, not_found_msg: &str) -> EngineResult<Project> {
        self.get(pool)
            .await?
            .ok_or_else(|| EngineError::not_found(not_found_msg))
    }
}
