use atr_core::{validation, EngineError, EngineResult};
use atr_db::entities::{Project, ProjectStatus, Release, ReleasePhase};
use atr_storage::ContentStore;
use chrono::Utc;
use sqlx::SqlitePool;

/// Creates the initial candidate-draft release row and its empty first
/// revision. Authorization (committee membership) is the caller's
/// responsibility; this function only enforces the state-machine
/// invariants: the project must exist and be active, no release may
/// already occupy `(project_name, version_name)`, and the version must
/// satisfy the version-name grammar.
pub async fn start(
    pool: &SqlitePool,
    store: &ContentStore,
    project_name: &str,
    version_name: &str,
    asf_uid: &str,
) -> EngineResult<Release> {
    validation::validate_version_name(version_name)?;

    let project: Option<Project> = sqlx::query_as("SELECT * FROM project WHERE name = ? AND status = ?")
        .bind(project_name)
        .bind(ProjectStatus::Active.to_string())
        .fetch_optional(pool)
        .await?;
    let project = project.ok_or_else(|| EngineError::not_found(format!("project {project_name}")))?;

    let release_name = validation::release_name(&project.name, version_name);
    let existing: Option<Release> = sqlx::query_as("SELECT * FROM release WHERE project_name = ? AND version = ?")
        .bind(&project.name)
        .bind(version_name)
        .fetch_optional(pool)
        .await?;
    if let Some(existing) = existing {
        return Err(EngineError::conflict(format!(
            "a release ({}) for {project_name} {version_name} already exists",
            existing.phase
        )));
    }

    let now = Utc::now();
    sqlx::query(
        "INSERT INTO release (name, project_name, version, phase, created) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&release_name)
    .bind(&project.name)
    .bind(version_name)
    .bind(ReleasePhase::CandidateDraft.to_string())
    .bind(now)
    .execute(pool)
    .await?;

    let release: Release = sqlx::query_as("SELECT * FROM release WHERE name = ?")
        .bind(&release_name)
        .fetch_one(pool)
        .await?;

    let outcome = atr_revision::create_and_manage(
        pool,
        store,
        &release,
        asf_uid,
        Some("Creation of empty release candidate draft".to_string()),
        |_creating| async move { Ok(()) },
    )
    .await?;

    match outcome {
        atr_revision::Outcome::Committed(_) => Ok(release),
        atr_revision::Outcome::Aborted(reason) => Err(EngineError::failed(reason)),
    }
}
