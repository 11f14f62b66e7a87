use atr_core::{EngineError, EngineResult};
use sqlx::SqlitePool;

use crate::entities::{Task, TaskStatus, TaskType};

#[derive(Debug, Default, Clone)]
pub struct TaskQuery {
    id: Option<i64>,
    status: Option<TaskStatus>,
    task_type: Option<TaskType>,
    project_name: Option<String>,
    version_name: Option<String>,
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn task_type(mut self, task_type: TaskType) -> Self {
        self.task_type = Some(task_type);
        self
    }

    pub fn project_name(mut self, project_name: impl Into<String>) -> Self {
        self.project_name = Some(project_name.into());
        self
    }

    pub fn version_name(mut self, version_name: impl Into<String>) -> Self {
        self.version_name = Some(version_name.into());
        self
    }

    fn build(&self) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut binds = Vec::new();

        if let Some(id) = self.id {
            clauses.push("id = ?");
            binds.push(id.to_string());
        }
        if let Some(status) = &self.status {
            clauses.push("status = ?");
            binds.push(status.to_string());
        }
        if let Some(task_type) = &self.task_type {
            clauses.push("task_type = ?");
            binds.push(task_type.to_string());
        }
        if let Some(project_name) = &self.project_name {
            clauses.push("project_name = ?");
            binds.push(project_name.clone());
        }
        if let Some(version_name) = &self.version_name {
            clauses.push("version_name = ?");
            binds.push(version_name.clone());
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        (where_sql, binds)
    }

    pub async fn all(&self, pool: &SqlitePool) -> EngineResult<Vec<Task>> {
        let (where_sql, binds) = self.build();
        let sql = format!("SELECT * FROM task{where_sql} ORDER BY added");
        let mut query = sqlx::query_as::<_, Task>(&sql);
        for bind in binds {
            query = query.bind(bind);
        }
        Ok(query.fetch_all(pool).await?)
    }

    pub async fn get(&self, pool: &SqlitePool) -> EngineResult<Option<Task>> {
        Ok(self.all(pool).await?.into_iter().next())
    }

    pub async fn demand(&self, pool: &SqlitePool, not_found_msg: &str) -> EngineResult<Task> {
        self.get(pool)
            .await?
            .ok_or_else(|| EngineError::not_found(not_found_msg))
    }
}
