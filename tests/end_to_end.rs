//! End-to-end scenarios driving the release state machine, revision
//! manager, task executor, check orchestrator, and vote coordinator
//! together against a shared temp `SqlitePool` and `ContentStore`, mirroring
//! the worked examples in the spec's testable-properties section.

use atr::core::EngineError;
use atr::db::entities::{Committee, ReleasePhase};
use atr::storage::ContentStore;
use atr::tasks::{CheckerRegistry, Collaborators};
use camino::Utf8PathBuf;
use sqlx::SqlitePool;
use std::collections::HashMap;

async fn test_pool(dir: &camino::Utf8Path) -> SqlitePool {
    let db_path = dir.join("test.db");
    let pool = atr::db::connect(db_path.as_str()).await.unwrap();
    atr::db::run_migrations(&pool).await.unwrap();
    pool
}

async fn seed_project(pool: &SqlitePool, committee_name: &str, project_name: &str) {
    sqlx::query("INSERT INTO committee (name, full_name, committee_members) VALUES (?, ?, '[\"alice\",\"bob\",\"carol\"]')")
        .bind(committee_name)
        .bind(committee_name)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO project (name, full_name, committee_name) VALUES (?, ?, ?)")
        .bind(project_name)
        .bind(project_name)
        .bind(committee_name)
        .execute(pool)
        .await
        .unwrap();
}

async fn run_all_queued_tasks(pool: &SqlitePool, store: &ContentStore) {
    let checkers = CheckerRegistry::new();
    let collaborators = Collaborators::default();
    loop {
        let processed = atr::tasks::run_loop(pool, store, &checkers, &collaborators).await.unwrap();
        if processed == 0 {
            break;
        }
    }
}

/// Scenario 1: draft creation leaves an empty first revision directory.
#[tokio::test]
async fn draft_creation_produces_an_empty_first_revision() {
    let dir = tempfile::tempdir().unwrap();
    let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    let pool = test_pool(&base).await;
    let store = ContentStore::new(base.clone());
    store.ensure_skeleton().unwrap();
    seed_project(&pool, "test", "test").await;

    let release = atr::release::start(&pool, &store, "test", "0.1+draft", "alice").await.unwrap();
    assert_eq!(release.phase, ReleasePhase::CandidateDraft);

    let revision_dir = store.revision_dir("test", "0.1+draft", "00001");
    assert!(revision_dir.is_dir());
    assert_eq!(std::fs::read_dir(&revision_dir).unwrap().count(), 0);
}

/// Scenarios 2-3: uploading a file creates a new revision and enqueues its
/// checks; uploading the same bytes again reuses the prior check results
/// instead of re-running the checker.
#[tokio::test]
async fn repeated_uploads_enqueue_checks_once_and_reuse_cached_results_on_the_identical_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    let pool = test_pool(&base).await;
    let store = ContentStore::new(base.clone());
    store.ensure_skeleton().unwrap();
    seed_project(&pool, "test", "test").await;

    let release = atr::release::start(&pool, &store, "test", "0.1+draft", "alice").await.unwrap();

    let outcome = atr::revision::create_and_manage(&pool, &store, &release, "alice", None, |creating| async move {
        std::fs::write(creating.interim_path.join("example.txt"), b"hello world").unwrap();
        Ok(())
    })
    .await
    .unwrap();
    let revision_2 = match outcome {
        atr::revision::Outcome::Committed(revision) => revision,
        atr::revision::Outcome::Aborted(reason) => panic!("expected a committed revision, got {reason}"),
    };
    assert_eq!(revision_2.number, "00002");
    assert!(store.revision_dir("test", "0.1+draft", "00001").is_dir(), "revision 00001 still exists");
    assert!(store.revision_dir("test", "0.1+draft", "00002").join("example.txt").exists());

    let enqueued = atr::checks::enumerate_and_enqueue(&pool, &store, "test", "0.1+draft", &revision_2, "alice")
        .await
        .unwrap();
    assert!(enqueued > 0);
    run_all_queued_tasks(&pool, &store).await;

    let results_before: Vec<(String,)> = sqlx::query_as("SELECT status FROM check_result WHERE revision_number = '00002'")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert!(!results_before.is_empty());

    // Upload the identical bytes into a third revision.
    let outcome = atr::revision::create_and_manage(&pool, &store, &release, "alice", None, |creating| async move {
        std::fs::write(creating.interim_path.join("example.txt"), b"hello world").unwrap();
        Ok(())
    })
    .await
    .unwrap();
    let revision_3 = match outcome {
        atr::revision::Outcome::Committed(revision) => revision,
        atr::revision::Outcome::Aborted(reason) => panic!("expected a committed revision, got {reason}"),
    };
    assert_eq!(revision_3.number, "00003");

    atr::checks::enumerate_and_enqueue(&pool, &store, "test", "0.1+draft", &revision_3, "alice")
        .await
        .unwrap();
    run_all_queued_tasks(&pool, &store).await;

    let results_after: Vec<(String, Option<String>)> =
        sqlx::query_as("SELECT status, input_hash FROM check_result WHERE revision_number = '00003'")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(results_after.len(), results_before.len(), "the same number of rows is copied forward");
    assert!(results_after.iter().all(|(_, hash)| hash.is_some()), "cached rows still carry the original input hash");
}

/// Scenario 4: promote, vote pass, preview, announce.
#[tokio::test]
async fn a_passed_vote_moves_to_preview_and_announce_finalizes_the_release() {
    let dir = tempfile::tempdir().unwrap();
    let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    let pool = test_pool(&base).await;
    let store = ContentStore::new(base.clone());
    store.ensure_skeleton().unwrap();
    seed_project(&pool, "test", "test").await;

    let release = atr::release::start(&pool, &store, "test", "0.1+draft", "alice").await.unwrap();

    let outcome = atr::revision::create_and_manage(&pool, &store, &release, "alice", None, |creating| async move {
        std::fs::write(creating.interim_path.join("example.txt"), b"hello world").unwrap();
        Ok(())
    })
    .await
    .unwrap();
    let revision = match outcome {
        atr::revision::Outcome::Committed(revision) => revision,
        atr::revision::Outcome::Aborted(reason) => panic!("expected a committed revision, got {reason}"),
    };

    atr::checks::enumerate_and_enqueue(&pool, &store, "test", "0.1+draft", &revision, "alice")
        .await
        .unwrap();
    run_all_queued_tasks(&pool, &store).await;

    atr::release::promote_to_candidate(&pool, &store, &release.name, &revision.number, false).await.unwrap();

    let committee = Committee {
        name: "test".to_string(),
        full_name: "Test".to_string(),
        is_podling: false,
        parent_committee_name: None,
        committee_members: sqlx::types::Json(vec!["alice".to_string(), "bob".to_string(), "carol".to_string()]),
        committers: sqlx::types::Json(vec![]),
        release_managers: sqlx::types::Json(vec![]),
    };
    let mut votes = HashMap::new();
    for voter in ["alice", "bob", "carol"] {
        votes.insert(
            voter.to_string(),
            atr::vote::VoteEmail {
                asf_uid_or_email: voter.to_string(),
                from_email: format!("{voter}@apache.org"),
                status: atr::vote::VoteStatus::Binding,
                mid: format!("mid-{voter}"),
                vote: atr::vote::Vote::Yes,
                quotation: "+1".to_string(),
                updated: false,
            },
        );
    }
    let summary = atr::vote::VoteSummary {
        binding_votes: 3,
        binding_votes_yes: 3,
        ..Default::default()
    };

    let resolved = atr::vote::resolve(
        &pool,
        &store,
        &release.name,
        &committee,
        "thread-1",
        &votes,
        &summary,
        "The vote passed.",
        atr::vote::Resolution::Passed,
        "alice",
        "Alice Example",
        "general@incubator.apache.org",
        "[VOTE] Incubator",
        "body",
    )
    .await
    .unwrap();
    assert_eq!(resolved.release.phase, ReleasePhase::Preview);

    let latest: atr::db::entities::Revision = sqlx::query_as(
        "SELECT * FROM revision WHERE release_name = ? ORDER BY seq DESC LIMIT 1",
    )
    .bind(&release.name)
    .fetch_one(&pool)
    .await
    .unwrap();

    atr::release::announce(
        &pool,
        &store,
        &release.name,
        &latest.number,
        "announce@apache.org",
        "[ANNOUNCE] test 0.1+draft",
        "test 0.1+draft has been released.",
        "test/0.1+draft",
        &["announce@apache.org".to_string()],
        "alice",
        false,
    )
    .await
    .unwrap();

    let announced: atr::db::entities::Release = sqlx::query_as("SELECT * FROM release WHERE name = ?")
        .bind(&release.name)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(announced.phase, ReleasePhase::Release);
    assert!(announced.released.is_some());
    assert_eq!(announced.path_suffix.as_deref(), Some("test/0.1+draft"));

    let finished_file = store.release_dir("test", "test/0.1+draft").join("example.txt");
    assert!(finished_file.exists());
    let downloaded_file = store.download_dir("test", "test/0.1+draft").join("example.txt");
    assert!(downloaded_file.exists());

    let remaining_revisions: Vec<(i64,)> = sqlx::query_as("SELECT id FROM revision WHERE release_name = ?")
        .bind(&release.name)
        .fetch_all(&pool)
        .await
        .unwrap();
    assert!(remaining_revisions.is_empty(), "revision rows are gone after announce");
}

/// Scenario 5: two concurrent promotions against the same revision number;
/// exactly one succeeds.
#[tokio::test]
async fn only_one_of_two_concurrent_promotions_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    let pool = test_pool(&base).await;
    let store = ContentStore::new(base.clone());
    store.ensure_skeleton().unwrap();
    seed_project(&pool, "test", "test").await;

    let release = atr::release::start(&pool, &store, "test", "0.1+draft", "alice").await.unwrap();
    let outcome = atr::revision::create_and_manage(&pool, &store, &release, "alice", None, |creating| async move {
        std::fs::write(creating.interim_path.join("example.txt"), b"hello world").unwrap();
        Ok(())
    })
    .await
    .unwrap();
    let revision = match outcome {
        atr::revision::Outcome::Committed(revision) => revision,
        atr::revision::Outcome::Aborted(reason) => panic!("expected a committed revision, got {reason}"),
    };

    let first = atr::release::promote_to_candidate(&pool, &store, &release.name, &revision.number, false).await;
    let second = atr::release::promote_to_candidate(&pool, &store, &release.name, &revision.number, false).await;

    let results = [first, second];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let failures: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(successes, 1);
    assert_eq!(failures.len(), 1);
    assert!(matches!(failures[0], EngineError::Conflict(_)));
}

/// Scenario 6: a six-message thread with three binding yes and one binding
/// no tabulates the duration-relative outcome correctly.
#[tokio::test]
async fn a_six_message_thread_tabulates_would_pass_if_closed_now() {
    let committee = Committee {
        name: "test".to_string(),
        full_name: "Test".to_string(),
        is_podling: false,
        parent_committee_name: None,
        committee_members: sqlx::types::Json(vec![
            "alice".to_string(),
            "bob".to_string(),
            "carol".to_string(),
            "dave".to_string(),
        ]),
        committers: sqlx::types::Json(vec![]),
        release_managers: sqlx::types::Json(vec![]),
    };

    let messages = vec![
        atr::vote::ThreadMessage {
            mid: "m1".into(),
            from_raw: "alice@apache.org".into(),
            list_raw: String::new(),
            subject: "[VOTE] Release test 0.1".into(),
            body: "+1".into(),
            epoch: Some(0),
        },
        atr::vote::ThreadMessage {
            mid: "m2".into(),
            from_raw: "bob@apache.org".into(),
            list_raw: String::new(),
            subject: "[VOTE] Release test 0.1".into(),
            body: "+1".into(),
            epoch: Some(100),
        },
        atr::vote::ThreadMessage {
            mid: "m3".into(),
            from_raw: "carol@apache.org".into(),
            list_raw: String::new(),
            subject: "[VOTE] Release test 0.1".into(),
            body: "+1".into(),
            epoch: Some(200),
        },
        atr::vote::ThreadMessage {
            mid: "m4".into(),
            from_raw: "dave@apache.org".into(),
            list_raw: String::new(),
            subject: "[VOTE] Release test 0.1".into(),
            body: "-1 needs a fixed checksum".into(),
            epoch: Some(300),
        },
        atr::vote::ThreadMessage {
            mid: "m5".into(),
            from_raw: "eve@example.com".into(),
            list_raw: String::new(),
            subject: "[VOTE] Release test 0.1".into(),
            body: "+1 (not binding, just supportive)".into(),
            epoch: Some(400),
        },
        atr::vote::ThreadMessage {
            mid: "m6".into(),
            from_raw: "bob@apache.org".into(),
            list_raw: String::new(),
            subject: "Re: [VOTE] Release test 0.1".into(),
            body: "Thanks everyone for voting.".into(),
            epoch: Some(500),
        },
    ];

    // Only 3600 seconds into a 72-hour minimum: still open.
    let details = atr::vote::tabulate_thread(Some(&committee), &HashMap::new(), messages, Some(72), 3600).unwrap();
    assert_eq!(details.summary.binding_votes_yes, 3);
    assert_eq!(details.summary.binding_votes_no, 1);
    assert!(details.passed);
    assert!(details.outcome.contains("would pass if closed now"));
}
