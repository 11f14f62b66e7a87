use atr_core::{EngineError, EngineResult};
use sqlx::SqlitePool;

use crate::entities::Committee;

#[derive(Debug, Default, Clone)]
pub struct CommitteeQuery {
    name: Option<String>,
    is_podling: Option<bool>,
    parent_committee_name: Option<String>,
}

impl CommitteeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_podling(mut self, is_podling: bool) -> Self {
        self.is_podling = Some(is_podling);
        self
    }

    pub fn parent_committee_name(mut self, parent_committee_name: impl Into<String>) -> Self {
        self.parent_committee_name = Some(parent_committee_name.into());
        self
    }

    fn build(&self) -> (String, Vec<(String, &'static str)>) {
        let mut clauses = Vec::new();
        let mut binds: Vec<(String, &'static str)> = Vec::new();

        if let Some(name) = &self.name {
            clauses.push("name = ?");
            binds.push((name.clone(), "text"));
        }
        if let Some(is_podling) = self.is_podling {
            clauses.push("is_podling = ?");
            binds.push(((is_podling as i64).to_string(), "bool"));
        }
        if let Some(parent) = &self.parent_committee_name {
            clauses.push("parent_committee_name = ?");
            binds.push((parent.clone(), "text"));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        (where_sql, binds)
    }

    pub async fn all(&self, pool: &SqlitePool) -> EngineResult<Vec<Committee>> {
        let (where_sql, binds) = self.build();
        let sql = format!("SELECT * FROM committee{where_sql} ORDER BY name");
        let mut query = sqlx::query_as::<_, Committee>(&sql);
        for (value, kind) in binds {
            query = if kind == "bool" {
                query.bind(value.parse::<i64>().unwrap_or(0))
            } else {
                query.bind(value)
            };
        }
        Ok(query.fetch_all(pool).await?)
    }

    pub async fn get(&self, pool: &SqlitePool) -> EngineResult<Option<Committee>> {
        Ok(self.all(pool).await?.into_iter().next())
    }

    pub async fn demand(&self, pool: &SqlitePool, not_found_msg: &str) -> EngineResult<Committee> {
        self.get(pool)
            .await?
            .ok_or_else(|| EngineError::not_found(not_found_msg))
    }
}
