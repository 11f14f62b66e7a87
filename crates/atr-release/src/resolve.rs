use atr_core::{EngineError, EngineResult};
use atr_db::entities::{Release, ReleasePhase};
use atr_storage::ContentStore;
use sqlx::SqlitePool;

/// Vote passed: `CANDIDATE -> PREVIEW`. Clones the candidate's latest
/// revision into a new one rather than mutating it in place, so the voted-on
/// bytes remain addressable by their own revision number even after the
/// release moves on.
pub async fn to_preview(
    pool: &SqlitePool,
    store: &ContentStore,
    release_name: &str,
    asf_uid: &str,
) -> EngineResult<Release> {
    let release: Release = sqlx::query_as("SELECT * FROM release WHERE name = ?")
        .bind(release_name)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("release {release_name}")))?;

    if release.phase != ReleasePhase::Candidate {
        return Err(EngineError::conflict(
            "only a candidate release may move to preview",
        ));
    }

    let outcome = atr_revision::create_and_manage(
        pool,
        store,
        &release,
        asf_uid,
        Some("Vote passed, promoting to preview".to_string()),
        |_creating| async move { Ok(()) },
    )
    .await?;
    let atr_revision::Outcome::Committed(_) = outcome else {
        return Err(EngineError::failed("preview revision creation was aborted"));
    };

    sqlx::query("UPDATE release SET phase = ? WHERE name = ? AND phase = ?")
        .bind(ReleasePhase::Preview.to_string())
        .bind(release_name)
        .bind(ReleasePhase::Candidate.to_string())
        .execute(pool)
        .await?;

    let release: Release = sqlx::query_as("SELECT * FROM release WHERE name = ?")
        .bind(release_name)
        .fetch_one(pool)
        .await?;
    Ok(release)
}

/// Vote failed: `CANDIDATE -> CANDIDATE_DRAFT`. The revision that failed its
/// vote becomes the draft's mutable head again; no new revision is created,
/// matching the original system's rollback (a failed vote does not discard
/// the candidate's content, it just reopens it for editing).
pub async fn to_draft(pool: &SqlitePool, release_name: &str) -> EngineResult<Release> {
    let release: Release = sqlx::query_as("SELECT * FROM release WHERE name = ?")
        .bind(release_name)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("release {release_name}")))?;

    if release.phase != ReleasePhase::Candidate {
        return Err(EngineError::conflict(
            "only a candidate release may fall back to a draft",
        ));
    }

    sqlx::query(
        "UPDATE release SET phase = ?, vote_thread_id = NULL, vote_started = NULL, vote_duration_hours = NULL
         WHERE name = ? AND phase = ?",
    )
    .bind(ReleasePhase::CandidateDraft.to_string())
    .bind(release_name)
    .bind(ReleasePhase::Candidate.to_string())
    .execute(pool)
    .await?;

    let release: Release = sqlx::query_as("SELECT * FROM release WHERE name = ?")
        .bind(release_name)
        .fetch_one(pool)
        .await?;
    Ok(release)
}
