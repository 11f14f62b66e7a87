use atr_core::{EngineError, EngineResult};
use atr_db::entities::{Project, Release};
use atr_storage::ContentStore;
use sqlx::SqlitePool;

/// Deletes a release's database records and filesystem data outright.
///
/// Revisions are not individually guarded against deletion here: removing
/// the release row cascades conceptually to its tasks and check results,
/// which are deleted first so a half-finished delete never leaves orphan
/// rows pointing at a release that no longer exists.
pub async fn delete(
    pool: &SqlitePool,
    store: &ContentStore,
    project_name: &str,
    version_name: &str,
    include_downloads: bool,
) -> EngineResult<()> {
    let release: Release = sqlx::query_as("SELECT * FROM release WHERE project_name = ? AND version = ?")
        .bind(project_name)
        .bind(version_name)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            EngineError::not_found(format!("release '{project_name} {version_name}'"))
        })?;

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM task WHERE project_name = ? AND version_name = ?")
        .bind(project_name)
        .bind(version_name)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM check_result WHERE release_name = ?")
        .bind(&release.name)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM revision WHERE release_name = ?")
        .bind(&release.name)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM revision_counter WHERE release_name = ?")
        .bind(&release.name)
        .execute(&mut *tx)
        .await?;
    if include_downloads {
        sqlx::query("DELETE FROM distribution WHERE release_name = ?")
            .bind(&release.name)
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("DELETE FROM release WHERE name = ?")
        .bind(&release.name)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    if let Some(path_suffix) = release.path_suffix.as_deref() {
        let project: Project = sqlx::query_as("SELECT * FROM project WHERE name = ?")
            .bind(project_name)
            .fetch_one(pool)
            .await?;

        if include_downloads {
            let download_dir = store.download_dir(&project.committee_name, path_suffix);
            atr_storage::remove_tree(&download_dir)?;
        }
        let finished_dir = store.release_dir(&project.committee_name, path_suffix);
        atr_storage::remove_tree(&finished_dir)?;
    }

    let unfinished_dir = store.unfinished_dir().join(project_name).join(version_name);
    atr_storage::remove_tree(&unfinished_dir)?;

    Ok(())
}
