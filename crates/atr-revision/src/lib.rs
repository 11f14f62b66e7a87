//! Scoped creation of a mutable release revision.
//!
//! A revision's files start as a hard-linked clone of its parent (or an
//! empty directory for the first revision of a release), are mutated in
//! place under a caller-supplied closure, then sealed: the directory is
//! renamed into place and a [`Revision`] row is inserted in the same
//! write-locked transaction, so a reader never observes a revision number
//! with no matching directory or vice versa.

use atr_core::{EngineError, EngineResult};
use atr_db::entities::{Release, Revision};
use atr_storage::ContentStore;
use camino::Utf8PathBuf;
use chrono::Utc;
use sqlx::SqlitePool;
use std::future::Future;

/// The mutable handle a caller is given for the duration of revision
/// creation: `interim_path` is where files should be written; `old` is the
/// parent revision (`None` for a release's first revision).
pub struct Creating {
    pub old: Option<Revision>,
    pub interim_path: Utf8PathBuf,
    pub description: Option<String>,
}

/// What happened to a [`create_and_manage`] call.
pub enum Outcome {
    /// The closure completed and the revision was sealed.
    Committed(Revision),
    /// The closure raised a soft failure signal; the interim directory was
    /// discarded and no revision row was created. Not an error.
    Aborted(String),
}

/// Runs `body` against a freshly staged revision directory for
/// `release_name`, then seals it as a new [`Revision`] row plus a renamed
/// directory, or discards it if `body` returns `Err(EngineError::Failed(_))`.
///
/// Any other error unwinds without attempting to seal, and the interim
/// directory is removed before the error propagates.
pub async fn create_and_manage<F, Fut>(
    pool: &SqlitePool,
    store: &ContentStore,
    release: &Release,
    asf_uid: &str,
    description: Option<String>,
    body: F,
) -> EngineResult<Outcome>
where
    F: FnOnce(&mut Creating) -> Fut,
    Fut: Future<Output = EngineResult<()>>,
{
    let old_revision = atr_db::RevisionQuery::latest(pool, &release.name).await?;

    let interim_path = store.new_staging_dir(&release.name);
    std::fs::create_dir_all(&interim_path)?;

    if let Some(old) = &old_revision {
        let old_dir = store.revision_dir(&release.project_name, &release.version, &old.number);
        if old_dir.exists() {
            atr_storage::clone_tree_hardlinked(&old_dir, &interim_path)?;
        }
    }

    let mut creating = Creating {
        old: old_revision,
        interim_path: interim_path.clone(),
        description,
    };

    match body(&mut creating).await {
        Ok(()) => {}
        Err(err) if err.is_failed_signal() => {
            atr_storage::remove_tree(&interim_path)?;
            return Ok(Outcome::Aborted(err.to_string()));
        }
        Err(err) => {
            atr_storage::remove_tree(&interim_path)?;
            return Err(err);
        }
    }

    if let Err(err) = normalize_tree_mode(&interim_path) {
        atr_storage::remove_tree(&interim_path)?;
        return Err(err);
    }

    let seal_result = seal(pool, store, release, asf_uid, &creating).await;
    match seal_result {
        Ok(revision) => Ok(Outcome::Committed(revision)),
        Err(err) => {
            atr_storage::remove_tree(&interim_path)?;
            Err(err)
        }
    }
}

/// Allocates the next revision number under a write lock, inserts the row,
/// and atomically renames the interim directory into its final place, all
/// within one transaction: a reader can never see the row without the
/// directory, or the directory without the row.
async fn seal(
    pool: &SqlitePool,
    store: &ContentStore,
    release: &Release,
    asf_uid: &str,
    creating: &Creating,
) -> EngineResult<Revision> {
    let session = atr_db::Session::new(pool.clone());
    let mut tx = session.begin_immediate().await?;

    let next_seq: (i64,) = sqlx::query_as(
        "INSERT INTO revision_counter (release_name, last_allocated_number)
         VALUES (?, 1)
         ON CONFLICT (release_name) DO UPDATE SET last_allocated_number = last_allocated_number + 1
         RETURNING last_allocated_number",
    )
    .bind(&release.name)
    .fetch_one(&mut *tx)
    .await?;

    let number = atr_core::validation::format_revision_number(next_seq.0 as u32);
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO revision (release_name, seq, number, asfuid, created, phase, parent_name, description)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&release.name)
    .bind(next_seq.0)
    .bind(&number)
    .bind(asf_uid)
    .bind(now)
    .bind(release.phase.to_string())
    .bind(creating.old.as_ref().map(|r| r.name()))
    .bind(&creating.description)
    .execute(&mut *tx)
    .await?;

    let revision: Revision = sqlx::query_as("SELECT * FROM revision WHERE release_name = ? AND number = ?")
        .bind(&release.name)
        .bind(&number)
        .fetch_one(&mut *tx)
        .await?;

    let final_dir = store.revision_dir(&release.project_name, &release.version, &number);
    if let Some(parent) = final_dir.parent() {
        std::fs::create_dir_all(parent)?;
    }
    atr_storage::rename_atomic(&creating.interim_path, &final_dir)
        .map_err(|err| EngineError::Io(std::io::Error::other(err.to_string())))?;

    tx.commit().await?;
    Ok(revision)
}

fn normalize_tree_mode(path: &camino::Utf8Path) -> EngineResult<()> {
    atr_storage::atomic::normalize_dir_mode(path)?;
    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(name) = name.to_str() {
                let child = path.join(name);
                if child.is_dir() {
                    normalize_tree_mode(&child)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use atr_db::entities::ReleasePhase;
    use camino::Utf8PathBuf;

    async fn test_pool(dir: &camino::Utf8Path) -> SqlitePool {
        let db_path = dir.join("test.db");
        let pool = atr_db::connect(db_path.as_str()).await.unwrap();
        atr_db::run_migrations(&pool).await.unwrap();
        pool
    }

    fn test_release() -> Release {
        Release {
            name: "foo-1.0.0".to_string(),
            project_name: "foo".to_string(),
            version: "1.0.0".to_string(),
            phase: ReleasePhase::CandidateDraft,
            created: Utc::now(),
            released: None,
            release_policy_id: None,
            vote_thread_id: None,
            vote_started: None,
            vote_duration_hours: None,
            podling_thread_id: None,
            manual_vote: false,
            path_suffix: None,
        }
    }

    #[tokio::test]
    async fn first_revision_starts_from_an_empty_directory_and_seals() {
        let dir = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let pool = test_pool(&base).await;

        sqlx::query(
            "INSERT INTO committee (name, full_name) VALUES ('foo', 'Foo')",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO project (name, full_name, committee_name) VALUES ('foo', 'Foo', 'foo')",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO release (name, project_name, version, phase, created) VALUES (?, ?, ?, ?, ?)",
        )
        .bind("foo-1.0.0")
        .bind("foo")
        .bind("1.0.0")
        .bind("CANDIDATE_DRAFT")
        .bind(Utc::now())
        .execute(&pool)
        .await
        .unwrap();

        let store = ContentStore::new(base.clone());
        store.ensure_skeleton().unwrap();
        let release = test_release();

        let outcome = create_and_manage(&pool, &store, &release, "alice", None, |creating| async move {
            std::fs::write(creating.interim_path.join("hello.txt"), b"hi").unwrap();
            Ok(())
        })
        .await
        .unwrap();

        match outcome {
            Outcome::Committed(revision) => {
                assert_eq!(revision.number, "00001");
                let final_dir = store.revision_dir("foo", "1.0.0", &revision.number);
                assert!(final_dir.join("hello.txt").exists());
            }
            Outcome::Aborted(_) => panic!("expected a committed revision"),
        }
    }

    #[tokio::test]
    async fn a_failed_signal_discards_the_interim_directory() {
        let dir = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let pool = test_pool(&base).await;

        sqlx::query("INSERT INTO committee (name, full_name) VALUES ('foo', 'Foo')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO project (name, full_name, committee_name) VALUES ('foo', 'Foo', 'foo')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO release (name, project_name, version, phase, created) VALUES (?, ?, ?, ?, ?)",
        )
        .bind("foo-1.0.0")
        .bind("foo")
        .bind("1.0.0")
        .bind("CANDIDATE_DRAFT")
        .bind(Utc::now())
        .execute(&pool)
        .await
        .unwrap();

        let store = ContentStore::new(base.clone());
        store.ensure_skeleton().unwrap();
        let release = test_release();

        let outcome = create_and_manage(&pool, &store, &release, "alice", None, |_creating| async move {
            Err(EngineError::failed("caller aborted"))
        })
        .await
        .unwrap();

        assert!(matches!(outcome, Outcome::Aborted(_)));

        let revisions = atr_db::RevisionQuery::latest(&pool, "foo-1.0.0").await.unwrap();
        assert!(revisions.is_none());
    }
}
