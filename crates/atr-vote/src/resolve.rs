//! Vote resolution: marks a candidate's vote passed or failed, drives the
//! release state machine transition, and — for podling releases — chains
//! into a second, foundation-level voting round automatically.
//!
//! Grounded on `original_source/atr/storage/writers/vote.py`'s
//! `CommitteeMember.resolve`/`resolve_release` and
//! `original_source/atr/tabulate.py`'s `_vote_resolution_body`.

use atr_core::{EngineError, EngineResult};
use atr_db::entities::{Committee, Release, ReleasePhase};
use atr_storage::ContentStore;
use sqlx::SqlitePool;

use crate::start::{self, VoteInitiatePayload};
use crate::tabulate::{VoteEmail, VoteStatus, VoteSummary};

/// What a resolution decided, independent of the tabulated vote counts —
/// a committee member may resolve manually against their own judgment, not
/// only mechanically from [`crate::tabulate::tabulate`]'s verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Passed,
    Failed,
}

/// Everything a caller needs after resolving a vote: the release's new
/// state, the rendered resolution email body, and — if this resolution
/// just completed the first round of a two-round podling vote — the
/// payload for the automatically-started second round.
pub struct ResolveOutcome {
    pub release: Release,
    pub resolution_body: String,
    pub second_round: Option<VoteInitiatePayload>,
    /// Set on a passing second-round podling resolution: the first
    /// round's thread id, which the resolution email should also be
    /// replied into.
    pub also_reply_to_round_one_thread: Option<String>,
}

/// Resolves `release_name`'s currently open vote.
///
/// `current_thread_id` is the thread the vote being resolved ran in (the
/// caller reads this off the release's `vote_thread_id` or the latest
/// `VOTE_INITIATE` task). For a podling's first round, this becomes the
/// `podling_thread_id` recorded on the release so the second round can
/// reference it; `incubator_vote_address` is the mailing list the
/// automatically-started second round addresses.
#[allow(clippy::too_many_arguments)]
pub async fn resolve(
    pool: &SqlitePool,
    store: &ContentStore,
    release_name: &str,
    committee: &Committee,
    current_thread_id: &str,
    votes: &std::collections::HashMap<String, VoteEmail>,
    summary: &VoteSummary,
    outcome: &str,
    resolution: Resolution,
    asf_uid: &str,
    asf_fullname: &str,
    incubator_vote_address: &str,
    second_round_subject_template: &str,
    second_round_body_template: &str,
) -> EngineResult<ResolveOutcome> {
    let release: Release = sqlx::query_as("SELECT * FROM release WHERE name = ?")
        .bind(release_name)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("release {release_name}")))?;

    if release.phase != ReleasePhase::Candidate {
        return Err(EngineError::conflict("only a candidate release may be resolved"));
    }

    let voting_round = if committee.is_podling {
        Some(if release.podling_thread_id.is_none() { 1 } else { 2 })
    } else {
        None
    };

    let passed = resolution == Resolution::Passed;

    if voting_round == Some(1) && passed {
        sqlx::query("UPDATE release SET podling_thread_id = ? WHERE name = ?")
            .bind(current_thread_id)
            .bind(release_name)
            .execute(pool)
            .await?;

        let latest_revision = atr_db::RevisionQuery::latest(pool, release_name)
            .await?
            .ok_or_else(|| EngineError::conflict("release has no revision to carry into the second round"))?;

        let second_round = start::start(
            pool,
            store,
            release_name,
            incubator_vote_address,
            std::slice::from_ref(&incubator_vote_address.to_string()),
            &latest_revision.number,
            release.vote_duration_hours.unwrap_or(72),
            second_round_subject_template,
            second_round_body_template,
            asf_uid,
            asf_fullname,
            "Incubator",
            false,
        )
        .await?;

        let body = resolution_body(committee, &release, votes, summary, true, outcome, asf_fullname, asf_uid, current_thread_id);

        let release: Release = sqlx::query_as("SELECT * FROM release WHERE name = ?")
            .bind(release_name)
            .fetch_one(pool)
            .await?;

        return Ok(ResolveOutcome {
            release,
            resolution_body: body,
            second_round: Some(second_round),
            also_reply_to_round_one_thread: None,
        });
    }

    let (release, also_reply_to_round_one_thread) = if passed {
        let release = atr_release::to_preview(pool, store, release_name, asf_uid).await?;
        let reply_thread = if voting_round == Some(2) { release.podling_thread_id.clone() } else { None };
        (release, reply_thread)
    } else {
        (atr_release::to_draft(pool, release_name).await?, None)
    };

    let body = resolution_body(committee, &release, votes, summary, passed, outcome, asf_fullname, asf_uid, current_thread_id);

    Ok(ResolveOutcome {
        release,
        resolution_body: body,
        second_round: None,
        also_reply_to_round_one_thread,
    })
}

/// Renders the resolution email body: a greeting, the thread URL(s), a
/// breakdown of binding/committer/contributor votes, and a sign-off.
/// Mirrors `_vote_resolution_body` line-for-line in structure.
#[allow(clippy::too_many_arguments)]
pub fn resolution_body(
    committee: &Committee,
    release: &Release,
    votes: &std::collections::HashMap<String, VoteEmail>,
    summary: &VoteSummary,
    passed: bool,
    _outcome: &str,
    full_name: &str,
    asf_uid: &str,
    thread_id: &str,
) -> String {
    let mut lines = Vec::new();

    let committee_name = if release.podling_thread_id.is_some() {
        "Incubator"
    } else {
        committee.display_name()
    };
    lines.push(format!("Dear {committee_name} participants,"));
    lines.push(String::new());

    let outcome_word = if passed { "passed" } else { "failed" };
    lines.push(format!("The vote on {} {} {outcome_word}.", release.project_name, release.version));
    lines.push(String::new());

    if let Some(podling_thread_id) = &release.podling_thread_id {
        lines.push("The previous round of voting is archived at the following URL:".to_string());
        lines.push(String::new());
        lines.push(format!("https://lists.apache.org/thread/{podling_thread_id}"));
        lines.push(String::new());
        lines.push("The current vote thread is archived at the following URL:".to_string());
    } else {
        lines.push("The vote thread is archived at the following URL:".to_string());
    }
    lines.push(String::new());
    lines.push(format!("https://lists.apache.org/thread/{thread_id}"));
    lines.push(String::new());

    lines.extend(resolution_votes_lines(votes, &[VoteStatus::Binding]));

    let binding_total = summary.binding_votes;
    lines.push(format!("There {} {} binding {}.", plural_verb(binding_total), binding_total, plural_noun(binding_total, "vote")));
    lines.push(String::new());
    lines.push(format!(
        "Of these binding votes, {} were +1, {} were -1, and {} were 0.",
        summary.binding_votes_yes, summary.binding_votes_no, summary.binding_votes_abstain
    ));
    lines.push(String::new());

    lines.extend(resolution_votes_lines(votes, &[VoteStatus::Committer]));
    lines.extend(resolution_votes_lines(votes, &[VoteStatus::Contributor, VoteStatus::Unknown]));

    lines.push("Thank you for your participation.".to_string());
    lines.push(String::new());
    lines.push("Sincerely,".to_string());
    lines.push(format!("{full_name} ({asf_uid})"));

    lines.join("\n")
}

fn resolution_votes_lines(votes: &std::collections::HashMap<String, VoteEmail>, statuses: &[VoteStatus]) -> Vec<String> {
    let labels: Vec<&str> = statuses.iter().map(|s| s.as_label()).collect();
    let header = format!("The {} votes were cast as follows:", labels.join(" and "));

    let mut lines = Vec::new();
    let mut header_emitted = false;
    for vote_email in votes.values() {
        if !statuses.contains(&vote_email.status) {
            continue;
        }
        if !header_emitted {
            lines.push(header.clone());
            lines.push(String::new());
            header_emitted = true;
        }
        let mut status_label = vote_email.status.as_label().to_string();
        if vote_email.updated {
            status_label.push_str(", updated");
        }
        lines.push(format!("{} {} ({status_label})", vote_email.vote.as_symbol(), vote_email.asf_uid_or_email));
    }
    if header_emitted {
        lines.push(String::new());
    }
    lines
}

fn plural_verb(count: u32) -> &'static str {
    if count == 1 {
        "was"
    } else {
        "were"
    }
}

fn plural_noun(count: u32, word: &str) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabulate::{tabulate, ThreadMessage};
    use camino::Utf8PathBuf;
    use sqlx::types::Json;
    use std::collections::HashMap;

    async fn test_pool(dir: &camino::Utf8Path) -> SqlitePool {
        let db_path = dir.join("test.db");
        let pool = atr_db::connect(db_path.as_str()).await.unwrap();
        atr_db::run_migrations(&pool).await.unwrap();
        pool
    }

    fn committee(is_podling: bool) -> Committee {
        Committee {
            name: "foo".to_string(),
            full_name: "Foo".to_string(),
            is_podling,
            parent_committee_name: None,
            committee_members: Json(vec!["alice".to_string(), "bob".to_string(), "carol".to_string()]),
            committers: Json(vec![]),
            release_managers: Json(vec![]),
        }
    }

    async fn seed_and_promote(pool: &SqlitePool, store: &ContentStore) -> Release {
        sqlx::query("INSERT INTO committee (name, full_name, committee_members) VALUES ('foo', 'Foo', '[\"alice\",\"bob\",\"carol\"]')")
            .execute(pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO project (name, full_name, committee_name) VALUES ('foo', 'Foo', 'foo')")
            .execute(pool)
            .await
            .unwrap();
        let release = atr_release::start(pool, store, "foo", "1.0.0", "alice").await.unwrap();
        atr_revision::create_and_manage(pool, store, &release, "alice", None, |creating| async move {
            std::fs::write(creating.interim_path.join("example.txt"), b"hi").unwrap();
            Ok(())
        })
        .await
        .unwrap();
        atr_release::promote_to_candidate(pool, store, "foo-1.0.0", "00001", false).await.unwrap();
        sqlx::query_as("SELECT * FROM release WHERE name = 'foo-1.0.0'")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    fn passing_votes() -> (HashMap<String, VoteEmail>, crate::tabulate::VoteSummary, String) {
        let committee = committee(false);
        let messages = vec![
            ThreadMessage { mid: "m1".into(), from_raw: "alice@apache.org".into(), subject: "[VOTE]".into(), body: "+1".into(), epoch: Some(0), list_raw: String::new() },
            ThreadMessage { mid: "m2".into(), from_raw: "bob@apache.org".into(), subject: "[VOTE]".into(), body: "+1".into(), epoch: Some(0), list_raw: String::new() },
            ThreadMessage { mid: "m3".into(), from_raw: "carol@apache.org".into(), subject: "[VOTE]".into(), body: "+1".into(), epoch: Some(0), list_raw: String::new() },
        ];
        let details = tabulate(Some(&committee), &HashMap::new(), messages, Some(72), 72 * 3600 + 1).unwrap();
        (details.votes, details.summary, details.outcome)
    }

    #[tokio::test]
    async fn a_passed_non_podling_vote_moves_to_preview() {
        let dir = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let pool = test_pool(&base).await;
        let store = ContentStore::new(base.clone());
        store.ensure_skeleton().unwrap();
        seed_and_promote(&pool, &store).await;

        let committee = committee(false);
        let (votes, summary, outcome) = passing_votes();

        let result = resolve(
            &pool,
            &store,
            "foo-1.0.0",
            &committee,
            "thread-1",
            &votes,
            &summary,
            &outcome,
            Resolution::Passed,
            "alice",
            "Alice Example",
            "general@incubator.apache.org",
            "[VOTE] [RESULT]",
            "body",
        )
        .await
        .unwrap();

        assert_eq!(result.release.phase, ReleasePhase::Preview);
        assert!(result.second_round.is_none());
        assert!(result.resolution_body.contains("passed"));
    }

    #[tokio::test]
    async fn a_podling_first_round_pass_auto_starts_the_second_round_without_leaving_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let pool = test_pool(&base).await;
        let store = ContentStore::new(base.clone());
        store.ensure_skeleton().unwrap();
        seed_and_promote(&pool, &store).await;

        let committee = committee(true);
        let (votes, summary, outcome) = passing_votes();

        let result = resolve(
            &pool,
            &store,
            "foo-1.0.0",
            &committee,
            "round-one-thread",
            &votes,
            &summary,
            &outcome,
            Resolution::Passed,
            "alice",
            "Alice Example",
            "general@incubator.apache.org",
            "[VOTE] Incubator",
            "Please vote (round two)",
        )
        .await
        .unwrap();

        assert_eq!(result.release.phase, ReleasePhase::Candidate, "first round stays in CANDIDATE");
        assert_eq!(result.release.podling_thread_id.as_deref(), Some("round-one-thread"));
        let second_round = result.second_round.expect("second round payload");
        assert_eq!(second_round.email_to, "general@incubator.apache.org");
    }

    #[tokio::test]
    async fn a_failed_vote_falls_back_to_draft() {
        let dir = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let pool = test_pool(&base).await;
        let store = ContentStore::new(base.clone());
        store.ensure_skeleton().unwrap();
        seed_and_promote(&pool, &store).await;

        let committee = committee(false);
        let (votes, summary, outcome) = passing_votes();

        let result = resolve(
            &pool,
            &store,
            "foo-1.0.0",
            &committee,
            "thread-1",
            &votes,
            &summary,
            &outcome,
            Resolution::Failed,
            "alice",
            "Alice Example",
            "general@incubator.apache.org",
            "[VOTE]",
            "body",
        )
        .await
        .unwrap();

        assert_eq!(result.release.phase, ReleasePhase::CandidateDraft);
        assert!(result.resolution_body.contains("failed"));
    }
}
