//! Vote initiation: promote to `CANDIDATE` if needed, render the
//! subject/body templates, and hand back the payload for the caller to
//! enqueue as a `VOTE_INITIATE` task.
//!
//! Grounded on `original_source/atr/storage/writers/vote.py`'s
//! `CommitteeParticipant.start`. The actual task enqueue is left to the
//! caller (a consuming `atr-auth` facade method or HTTP handler) rather
//! than performed here, so this crate never depends on `atr-tasks` — it
//! only produces the fully-rendered payload a `VoteInitiate` task needs.

use atr_core::{EngineError, EngineResult};
use atr_db::entities::{Release, ReleasePhase};
use atr_storage::ContentStore;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

use crate::template::{substitute, StartVoteOptions};

/// The fully-rendered payload ready to become a `VOTE_INITIATE` task's
/// `task_args`.
#[derive(Debug, Clone)]
pub struct VoteInitiatePayload {
    pub release_name: String,
    pub email_to: String,
    pub vote_duration_hours: i64,
    pub initiator_id: String,
    pub initiator_fullname: String,
    pub subject: String,
    pub body: String,
    pub vote_start: DateTime<Utc>,
    pub vote_end: DateTime<Utc>,
}

/// Starts a vote on `release_name`'s selected revision.
///
/// Promotes `CANDIDATE_DRAFT -> CANDIDATE` via
/// [`atr_release::promote_to_candidate`] unless the release is already a
/// `CANDIDATE` (the automatic second-round podling vote calls this with
/// `promote = false`, matching the original's `promote: bool = True`
/// parameter).
#[allow(clippy::too_many_arguments)]
pub async fn start(
    pool: &SqlitePool,
    store: &ContentStore,
    release_name: &str,
    email_to: &str,
    permitted_recipients: &[String],
    selected_revision_number: &str,
    vote_duration_hours: i64,
    subject_template: &str,
    body_template: &str,
    initiator_id: &str,
    initiator_fullname: &str,
    committee_name: &str,
    promote: bool,
) -> EngineResult<VoteInitiatePayload> {
    if !permitted_recipients.iter().any(|r| r == email_to) {
        return Err(EngineError::access_denied(format!(
            "{email_to} is not a permitted voting recipient for this release"
        )));
    }

    let release: Release = sqlx::query_as("SELECT * FROM release WHERE name = ?")
        .bind(release_name)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("release {release_name}")))?;

    if promote {
        if release.phase != ReleasePhase::CandidateDraft {
            return Err(EngineError::conflict("release is not in the candidate draft phase"));
        }
        atr_release::promote_to_candidate(pool, store, release_name, selected_revision_number, false).await?;
    } else if release.phase != ReleasePhase::Candidate {
        return Err(EngineError::conflict(
            "release must already be a candidate to start a vote without promoting it",
        ));
    }

    let vote_start = Utc::now();
    let vote_end = vote_start + Duration::hours(vote_duration_hours);

    let options = StartVoteOptions {
        asf_uid: initiator_id.to_string(),
        fullname: initiator_fullname.to_string(),
        project_name: release.project_name.clone(),
        version_name: release.version.clone(),
        vote_duration_hours,
        vote_end: vote_end.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        revision_number: selected_revision_number.to_string(),
        committee_name: committee_name.to_string(),
    };

    let subject = substitute(subject_template, &options);
    let body = substitute(body_template, &options);

    sqlx::query("UPDATE release SET vote_started = ?, vote_duration_hours = ? WHERE name = ?")
        .bind(vote_start)
        .bind(vote_duration_hours)
        .bind(release_name)
        .execute(pool)
        .await?;

    Ok(VoteInitiatePayload {
        release_name: release_name.to_string(),
        email_to: email_to.to_string(),
        vote_duration_hours,
        initiator_id: initiator_id.to_string(),
        initiator_fullname: initiator_fullname.to_string(),
        subject,
        body,
        vote_start,
        vote_end,
    })
}
