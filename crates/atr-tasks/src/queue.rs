use atr_core::EngineResult;
use atr_db::entities::{Task, TaskStatus, TaskType};
use chrono::Utc;
use serde_json::Value;
use sqlx::SqlitePool;

/// Enqueues a new task. Mirrors the one place a [`Task`] row is ever
/// constructed, matching the revision manager's single-construction-site
/// discipline for the same correctness reason: every other caller reads
/// tasks back out through a query rather than building rows by hand.
#[allow(clippy::too_many_arguments)]
pub async fn queued(
    pool: &SqlitePool,
    task_type: TaskType,
    task_args: Value,
    asf_uid: &str,
    project_name: Option<&str>,
    version_name: Option<&str>,
    revision_number: Option<&str>,
    primary_rel_path: Option<&str>,
) -> EngineResult<Task> {
    let now = Utc::now();
    let id: (i64,) = sqlx::query_as(
        "INSERT INTO task (status, task_type, task_args, asf_uid, added,
                            project_name, version_name, revision_number, primary_rel_path)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING id",
    )
    .bind(TaskStatus::Queued.to_string())
    .bind(task_type.to_string())
    .bind(sqlx::types::Json(task_args))
    .bind(asf_uid)
    .bind(now)
    .bind(project_name)
    .bind(version_name)
    .bind(revision_number)
    .bind(primary_rel_path)
    .fetch_one(pool)
    .await?;

    let task: Task = sqlx::query_as("SELECT * FROM task WHERE id = ?")
        .bind(id.0)
        .fetch_one(pool)
        .await?;
    Ok(task)
}

/// Atomically claims the oldest eligible queued task: `scheduled` is
/// either unset or already in the past. The `UPDATE ... WHERE status =
/// 'QUEUED'` guard is what makes this safe for many concurrent worker
/// processes polling the same table.
pub async fn claim_next(pool: &SqlitePool, pid: u32) -> EngineResult<Option<Task>> {
    let now = Utc::now();
    let candidate: Option<(i64,)> = sqlx::query_as(
        "SELECT id FROM task
         WHERE status = 'QUEUED' AND (scheduled IS NULL OR scheduled <= ?)
         ORDER BY added ASC
         LIMIT 1",
    )
    .bind(now)
    .fetch_optional(pool)
    .await?;

    let Some((task_id,)) = candidate else {
        return Ok(None);
    };

    let result = sqlx::query(
        "UPDATE task SET status = 'ACTIVE', started = ?, pid = ?
         WHERE id = ? AND status = 'QUEUED'",
    )
    .bind(now)
    .bind(pid as i64)
    .bind(task_id)
    .execute(pool)
    .await?;

    if result.rows_affected() != 1 {
        // Another worker claimed it between our SELECT and our UPDATE.
        return Ok(None);
    }

    let task: Task = sqlx::query_as("SELECT * FROM task WHERE id = ?")
        .bind(task_id)
        .fetch_one(pool)
        .await?;
    Ok(Some(task))
}

/// Records the outcome of a processed task.
pub async fn complete(
    pool: &SqlitePool,
    task_id: i64,
    status: TaskStatus,
    result: Option<Value>,
    error: Option<String>,
) -> EngineResult<()> {
    sqlx::query("UPDATE task SET status = ?, completed = ?, result = ?, error = ? WHERE id = ?")
        .bind(status.to_string())
        .bind(Utc::now())
        .bind(result.map(sqlx::types::Json))
        .bind(error)
        .bind(task_id)
        .execute(pool)
        .await?;
    Ok(())
}
