use atr_core::{EngineError, EngineResult};
use atr_db::entities::{Release, ReleasePhase};
use atr_storage::ContentStore;
use chrono::Utc;
use sqlx::SqlitePool;

/// Promotes a candidate draft to `CANDIDATE`, opening its vote window.
///
/// Concurrency is enforced by a conditional `UPDATE` keyed on the phase and
/// the latest revision number the caller observed: if another revision was
/// created (or another promotion already happened) between the caller's
/// read and this write, zero rows match and the caller is told to refresh
/// rather than silently promoting the wrong revision.
pub async fn promote_to_candidate(
    pool: &SqlitePool,
    store: &ContentStore,
    release_name: &str,
    selected_revision_number: &str,
    vote_manual: bool,
) -> EngineResult<()> {
    let release: Release = sqlx::query_as("SELECT * FROM release WHERE name = ?")
        .bind(release_name)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("release {release_name}")))?;

    if release.phase != ReleasePhase::CandidateDraft {
        return Err(EngineError::conflict("release is not in the candidate draft phase"));
    }

    let revision_dir = store.revision_dir(&release.project_name, &release.version, selected_revision_number);
    let has_files = std::fs::read_dir(&revision_dir).map(|mut entries| entries.next().is_some()).unwrap_or(false);
    if !has_files {
        return Err(EngineError::conflict(
            "a release with zero files cannot be promoted to candidate",
        ));
    }

    let ongoing_tasks: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM task
         WHERE project_name = ? AND version_name = ? AND revision_number = ?
           AND status IN ('QUEUED', 'ACTIVE')",
    )
    .bind(&release.project_name)
    .bind(&release.version)
    .bind(selected_revision_number)
    .fetch_one(pool)
    .await?;
    if ongoing_tasks.0 > 0 {
        return Err(EngineError::conflict(
            "all checks must be completed before starting a vote",
        ));
    }

    let latest: Option<(String,)> = sqlx::query_as(
        "SELECT number FROM revision WHERE release_name = ? ORDER BY seq DESC LIMIT 1",
    )
    .bind(release_name)
    .fetch_optional(pool)
    .await?;
    let latest_number = latest.map(|(n,)| n);
    if latest_number.as_deref() != Some(selected_revision_number) {
        return Err(EngineError::conflict(
            "the selected revision number does not match the latest revision number",
        ));
    }

    let result = sqlx::query(
        "UPDATE release
         SET phase = ?, vote_started = ?, manual_vote = ?
         WHERE name = ? AND phase = ?
           AND (SELECT number FROM revision WHERE release_name = release.name ORDER BY seq DESC LIMIT 1) = ?",
    )
    .bind(ReleasePhase::Candidate.to_string())
    .bind(Utc::now())
    .bind(vote_manual)
    .bind(release_name)
    .bind(ReleasePhase::CandidateDraft.to_string())
    .bind(selected_revision_number)
    .execute(pool)
    .await?;

    if result.rows_affected() != 1 {
        return Err(EngineError::conflict(
            "a newer revision appeared, please refresh and try again",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    async fn test_pool(dir: &camino::Utf8Path) -> SqlitePool {
        let db_path = dir.join("test.db");
        let pool = atr_db::connect(db_path.as_str()).await.unwrap();
        atr_db::run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn a_revision_with_no_files_cannot_be_promoted() {
        let dir = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let pool = test_pool(&base).await;

        sqlx::query("INSERT INTO committee (name, full_name, committee_members) VALUES ('foo', 'Foo', '[\"alice\"]')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO project (name, full_name, committee_name) VALUES ('foo', 'Foo', 'foo')")
            .execute(&pool)
            .await
            .unwrap();

        let store = ContentStore::new(base.clone());
        store.ensure_skeleton().unwrap();

        crate::start::start(&pool, &store, "foo", "1.0.0", "alice").await.unwrap();

        let result = promote_to_candidate(&pool, &store, "foo-1.0.0", "00001", false).await;
        assert!(matches!(result, Err(EngineError::Conflict(_))));

        let revision_dir = store.revision_dir("foo", "1.0.0", "00001");
        std::fs::write(revision_dir.join("example.txt"), b"hi").unwrap();

        promote_to_candidate(&pool, &store, "foo-1.0.0", "00001", false).await.unwrap();
    }
}
