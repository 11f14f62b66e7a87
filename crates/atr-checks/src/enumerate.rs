use atr_core::EngineResult;
use atr_db::entities::{Revision, TaskStatus, TaskType};
use atr_storage::ContentStore;
use camino::Utf8Path;
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;

use crate::registry::{checker_for_suffix, release_level_checks};

/// Walks a sealed revision's files and enqueues one [`Task`](atr_db::entities::Task)
/// per `(file, checker)` pair matched by the suffix table, plus the
/// release-level checks that run once per revision rather than once per
/// file.
pub async fn enumerate_and_enqueue(
    pool: &SqlitePool,
    store: &ContentStore,
    project_name: &str,
    version_name: &str,
    revision: &Revision,
    asf_uid: &str,
) -> EngineResult<usize> {
    let revision_dir = store.revision_dir(project_name, version_name, &revision.number);
    let mut files = Vec::new();
    collect_files(&revision_dir, &revision_dir, &mut files)?;

    let mut enqueued = 0usize;
    for rel_path in &files {
        let file_name = rel_path.file_name().unwrap_or(rel_path.as_str());
        for task_type in checker_for_suffix(file_name) {
            enqueue(
                pool,
                task_type,
                asf_uid,
                project_name,
                version_name,
                &revision.number,
                Some(rel_path.as_str()),
            )
            .await?;
            enqueued += 1;
        }
    }

    for task_type in release_level_checks() {
        enqueue(
            pool,
            task_type,
            asf_uid,
            project_name,
            version_name,
            &revision.number,
            None,
        )
        .await?;
        enqueued += 1;
    }

    Ok(enqueued)
}

fn collect_files(root: &Utf8Path, dir: &Utf8Path, out: &mut Vec<camino::Utf8PathBuf>) -> EngineResult<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let path = dir.join(name);
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else if let Ok(rel) = path.strip_prefix(root) {
            out.push(rel.to_path_buf());
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn enqueue(
    pool: &SqlitePool,
    task_type: TaskType,
    asf_uid: &str,
    project_name: &str,
    version_name: &str,
    revision_number: &str,
    primary_rel_path: Option<&str>,
) -> EngineResult<()> {
    sqlx::query(
        "INSERT INTO task (status, task_type, task_args, asf_uid, added,
                            project_name, version_name, revision_number, primary_rel_path)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(TaskStatus::Queued.to_string())
    .bind(task_type.to_string())
    .bind(sqlx::types::Json(json!({})))
    .bind(asf_uid)
    .bind(Utc::now())
    .bind(project_name)
    .bind(version_name)
    .bind(revision_number)
    .bind(primary_rel_path)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    async fn test_pool(dir: &Utf8Path) -> SqlitePool {
        let db_path = dir.join("test.db");
        let pool = atr_db::connect(db_path.as_str()).await.unwrap();
        atr_db::run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn enqueues_one_task_per_matched_suffix_plus_release_level_checks() {
        let dir = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let pool = test_pool(&base).await;
        let store = ContentStore::new(base.clone());
        store.ensure_skeleton().unwrap();

        let revision_dir = store.revision_dir("foo", "1.0.0", "00001");
        std::fs::create_dir_all(&revision_dir).unwrap();
        std::fs::write(revision_dir.join("foo-1.0.0-src.tar.gz"), b"x").unwrap();
        std::fs::write(revision_dir.join("foo-1.0.0-src.tar.gz.asc"), b"x").unwrap();
        std::fs::write(revision_dir.join("README.md"), b"x").unwrap();

        let revision = Revision {
            id: 1,
            release_name: "foo-1.0.0".to_string(),
            seq: 1,
            number: "00001".to_string(),
            asfuid: "alice".to_string(),
            created: Utc::now(),
            phase: atr_db::entities::ReleasePhase::CandidateDraft,
            parent_name: None,
            description: None,
        };

        let enqueued = enumerate_and_enqueue(&pool, &store, "foo", "1.0.0", &revision, "alice")
            .await
            .unwrap();
        // 5 archive checks + 1 signature check + 1 release-level paths check
        assert_eq!(enqueued, 7);

        let tasks: Vec<(String,)> = sqlx::query_as("SELECT task_type FROM task")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(tasks.len(), 7);
    }
}
