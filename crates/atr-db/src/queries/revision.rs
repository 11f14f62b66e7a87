use atr_core::{EngineError, EngineResult};
use sqlx::SqlitePool;

use crate::entities::Revision;

#[derive(Debug, Default, Clone)]
pub struct RevisionQuery {
    release_name: Option<String>,
    number: Option<String>,
    parent_name: Option<String>,
}

impl RevisionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn release_name(mut self, release_name: impl Into<String>) -> Self {
        self.release_name = Some(release_name.into());
        self
    }

    pub fn number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn parent_name(mut self, parent_name: impl Into<String>) -> Self {
        self.parent_name = Some(parent_name.into());
        self
    }

    fn build(&self) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut binds = Vec::new();

        if let Some(release_name) = &self.release_name {
            clauses.push("release_name = ?");
            binds.push(release_name.clone());
        }
        if let Some(number) = &self.number {
            clauses.push("number = ?");
            binds.push(number.clone());
        }
        if let Some(parent_name) = &self.parent_name {
            clauses.push("parent_name = ?");
            binds.push(parent_name.clone());
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        (where_sql, binds)
    }

    pub async fn all(&self, pool: &SqlitePool) -> EngineResult<Vec<Revision>> {
        let (where_sql, binds) = self.build();
        let sql = format!("SELECT * FROM revision{where_sql} ORDER BY seq");
        let mut query = sqlx::query_as::<_, Revision>(&sql);
        for bind in binds {
            query = query.bind(bind);
        }
        Ok(query.fetch_all(pool).await?)
    }

    pub async fn get(&self, pool: &SqlitePool) -> EngineResult<Option<Revision>> {
        Ok(self.all(pool).await?.into_iter().next())
    }

    pub async fn demand(&self, pool: &SqlitePool, not_found_msg: &str) -> EngineResult<Revision> {
        self.get(pool)
            .await?
            .ok_or_else(|| EngineError::not_found(not_found_msg))
    }

    /// The most recently allocated revision for a release, by sequence.
    pub async fn latest(pool: &SqlitePool, release_name: &str) -> EngineResult<Option<Revision>> {
        let row = sqlx::query_as::<_, Revision>(
            "SELECT * FROM revision WHERE release_name = ? ORDER BY seq DESC LIMIT 1",
        )
        .bind(release_name)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }
}
