use atr_core::{EngineError, EngineResult};
use atr_db::entities::{Project, Release, ReleasePhase, TaskStatus, TaskType};
use atr_storage::ContentStore;
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;

/// Finalizes a release: collapses its latest revision into
/// `finished/<committee>/<path_suffix>/` (no further revisions are possible
/// afterward), hard-links the same content into
/// `downloads/<committee>/<path_suffix>/` for public serving, marks the
/// release `RELEASE` with a `released` timestamp, and enqueues the
/// announcement email as a `MESSAGE_SEND` task — all in one transaction.
///
/// `preserve_download_files` governs what happens when another release of
/// the same project already occupies a colliding filename in `downloads/`:
/// when true the existing file is left untouched and the new one is
/// skipped; when false it is overwritten. See the design notes for why
/// this defaults to false.
#[allow(clippy::too_many_arguments)]
pub async fn announce(
    pool: &SqlitePool,
    store: &ContentStore,
    release_name: &str,
    selected_revision_number: &str,
    recipient: &str,
    subject: &str,
    body: &str,
    path_suffix: &str,
    permitted_recipients: &[String],
    initiator_id: &str,
    preserve_download_files: bool,
) -> EngineResult<()> {
    if !permitted_recipients.iter().any(|r| r == recipient) {
        return Err(EngineError::access_denied(format!(
            "{recipient} is not a permitted announce recipient for this release"
        )));
    }

    let release: Release = sqlx::query_as("SELECT * FROM release WHERE name = ?")
        .bind(release_name)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("release {release_name}")))?;

    if release.phase != ReleasePhase::Preview {
        return Err(EngineError::conflict(
            "only a preview release may be announced",
        ));
    }

    let project: Project = sqlx::query_as("SELECT * FROM project WHERE name = ?")
        .bind(&release.project_name)
        .fetch_one(pool)
        .await?;

    let latest_number: Option<(String,)> = sqlx::query_as(
        "SELECT number FROM revision WHERE release_name = ? ORDER BY seq DESC LIMIT 1",
    )
    .bind(release_name)
    .fetch_optional(pool)
    .await?;
    let latest_number = latest_number
        .map(|(n,)| n)
        .ok_or_else(|| EngineError::conflict("release has no revisions to announce"))?;
    if latest_number != selected_revision_number {
        return Err(EngineError::conflict(
            "the selected revision does not match the latest revision",
        ));
    }

    let release_dir = store.release_dir(&project.committee_name, path_suffix);
    if release_dir.exists() {
        return Err(EngineError::conflict(format!(
            "{release_dir} already exists, refusing to announce over it"
        )));
    }

    let revision_dir = store.revision_dir(&release.project_name, &release.version, &latest_number);
    let download_dir = store.download_dir(&project.committee_name, path_suffix);

    // Fail fast on a tree that can't be cloned into downloads/ before the
    // finished/ move below commits.
    atr_storage::clone_tree_hardlinked_dry_run(&revision_dir, &download_dir)?;

    atr_storage::clone_tree_hardlinked(&revision_dir, &release_dir)?;
    if preserve_download_files {
        merge_preserving(&revision_dir, &download_dir)?;
    } else {
        atr_storage::clone_tree_hardlinked(&revision_dir, &download_dir)?;
    }

    let now = Utc::now();
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE release SET phase = ?, released = ?, path_suffix = ? WHERE name = ?")
        .bind(ReleasePhase::Release.to_string())
        .bind(now)
        .bind(path_suffix)
        .bind(release_name)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM revision WHERE release_name = ?")
        .bind(release_name)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM revision_counter WHERE release_name = ?")
        .bind(release_name)
        .execute(&mut *tx)
        .await?;

    let task_args = json!({ "to": [recipient], "subject": subject, "body": body });
    sqlx::query(
        "INSERT INTO task (status, task_type, task_args, asf_uid, added, project_name, version_name)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(TaskStatus::Queued.to_string())
    .bind(TaskType::MessageSend.to_string())
    .bind(sqlx::types::Json(task_args))
    .bind(initiator_id)
    .bind(now)
    .bind(&release.project_name)
    .bind(&release.version)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    atr_storage::remove_tree(&revision_dir)?;

    Ok(())
}

/// Like [`atr_storage::clone_tree_hardlinked`], but skips any destination
/// file that already exists instead of overwriting it in place.
fn merge_preserving(src: &camino::Utf8Path, dst: &camino::Utf8Path) -> EngineResult<()> {
    if src.is_dir() {
        std::fs::create_dir_all(dst)?;
        for entry in std::fs::read_dir(src)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name
                .to_str()
                .ok_or_else(|| EngineError::validation("non-UTF-8 file name"))?;
            merge_preserving(&src.join(name), &dst.join(name))?;
        }
    } else if !dst.exists() {
        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::hard_link(src, dst)?;
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

    async fn seed_and_preview(pool: &SqlitePool, store: &ContentStore) -> Release {
        sqlx::query("INSERT INTO committee (name, full_name, committee_members) VALUES ('foo', 'Foo', '[\"alice\"]')")
            .execute(pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO project (name, full_name, committee_name) VALUES ('foo', 'Foo', 'foo')")
            .execute(pool)
            .await
            .unwrap();

        let release = crate::start::start(pool, store, "foo", "1.0.0", "alice").await.unwrap();
        atr_revision::create_and_manage(pool, store, &release, "alice", None, |creating| async move {
            std::fs::write(creating.interim_path.join("example.txt"), b"hi").unwrap();
            Ok(())
        })
        .await
        .unwrap();
        crate::promote::promote_to_candidate(pool, store, "foo-1.0.0", "00001", false).await.unwrap();
        crate::resolve::to_preview(pool, store, "foo-1.0.0", "alice").await.unwrap()
    }

    #[tokio::test]
    async fn announcing_moves_content_and_enqueues_an_email() {
        let dir = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let pool = test_pool(&base).await;
        let store = ContentStore::new(base.clone());
        store.ensure_skeleton().unwrap();

        seed_and_preview(&pool, &store).await;

        announce(
            &pool,
            &store,
            "foo-1.0.0",
            "00002",
            "announce@apache.org",
            "[ANNOUNCE] foo 1.0.0",
            "foo 1.0.0 has been released.",
            "foo/1.0.0",
            &["announce@apache.org".to_string()],
            "alice",
            false,
        )
        .await
        .unwrap();

        let announced: Release = sqlx::query_as("SELECT * FROM release WHERE name = 'foo-1.0.0'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(announced.phase, ReleasePhase::Release);
        assert_eq!(announced.path_suffix.as_deref(), Some("foo/1.0.0"));

        assert!(store.release_dir("foo", "foo/1.0.0").join("example.txt").exists());
        assert!(store.download_dir("foo", "foo/1.0.0").join("example.txt").exists());

        let queued: Vec<(String,)> = sqlx::query_as("SELECT task_type FROM task WHERE project_name = 'foo'")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].0, "MESSAGE_SEND");
    }

    #[tokio::test]
    async fn an_unpermitted_recipient_is_rejected_before_anything_moves() {
        let dir = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let pool = test_pool(&base).await;
        let store = ContentStore::new(base.clone());
        store.ensure_skeleton().unwrap();

        seed_and_preview(&pool, &store).await;

        let result = announce(
            &pool,
            &store,
            "foo-1.0.0",
            "00002",
            "not-allowed@apache.org",
            "[ANNOUNCE]",
            "body",
            "foo/1.0.0",
            &["announce@apache.org".to_string()],
            "alice",
            false,
        )
        .await;
        assert!(result.is_err());
        assert!(!store.release_dir("foo", "foo/1.0.0").exists());
    }

    #[tokio::test]
    async fn announcing_over_an_existing_final_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let pool = test_pool(&base).await;
        let store = ContentStore::new(base.clone());
        store.ensure_skeleton().unwrap();

        seed_and_preview(&pool, &store).await;
        std::fs::create_dir_all(store.release_dir("foo", "foo/1.0.0")).unwrap();

        let result = announce(
            &pool,
            &store,
            "foo-1.0.0",
            "00002",
            "announce@apache.org",
            "[ANNOUNCE]",
            "body",
            "foo/1.0.0",
            &["announce@apache.org".to_string()],
            "alice",
            false,
        )
        .await;
        assert!(matches!(result, Err(EngineError::Conflict(_))));
    }
}
