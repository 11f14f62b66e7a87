//! The capability ladder: `GeneralPublic` embeds no privilege at all;
//! each stronger tier is built by composing the weaker one plus a proof of
//! membership, rather than by inheritance — a method defined only on
//! `CommitteeMember` is simply absent from `CommitteeParticipant`'s API, at
//! compile time, with no downcasting involved.

use crate::audit;
use crate::identity::Memberships;
use atr_core::{EngineError, EngineResult, JsonlChannelWriter};
use atr_db::entities::{CheckResult, Committee, Release, Revision};
use atr_storage::ContentStore;
use serde_json::json;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;

/// The base every capability tier embeds: enough to run read-only queries,
/// nothing that mutates state.
#[derive(Clone)]
pub struct GeneralPublic {
    pool: SqlitePool,
    store: ContentStore,
    audit: Arc<JsonlChannelWriter>,
}

impl GeneralPublic {
    pub fn new(pool: SqlitePool, store: ContentStore, audit: Arc<JsonlChannelWriter>) -> Self {
        Self { pool, store, audit }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub(crate) fn audit(&self) -> &JsonlChannelWriter {
        &self.audit
    }

    pub async fn check_results(&self, release_name: &str) -> EngineResult<Vec<CheckResult>> {
        atr_db::CheckResultQuery::new().release_name(release_name).all(&self.pool).await
    }

    /// Requires the caller's directory-resolved memberships prove at least
    /// one committee affiliation, foundation-wide.
    pub fn as_foundation_committer(self, asf_uid: &str, memberships: &Memberships) -> EngineResult<FoundationCommitter> {
        if memberships.member_of.is_empty() && memberships.committer_of.is_empty() {
            return Err(EngineError::access_denied(format!(
                "{asf_uid} is not a committer on any foundation project"
            )));
        }
        Ok(FoundationCommitter {
            public: self,
            asf_uid: asf_uid.to_string(),
        })
    }
}

/// Any ASF committer, on at least one project.
#[derive(Clone)]
pub struct FoundationCommitter {
    pub(crate) public: GeneralPublic,
    pub asf_uid: String,
}

impl FoundationCommitter {
    pub fn pool(&self) -> &SqlitePool {
        self.public.pool()
    }

    pub fn store(&self) -> &ContentStore {
        self.public.store()
    }

    /// Requires the caller to be a committer (full member or not) of
    /// `committee_name`.
    pub fn as_committee_participant(
        self,
        committee_name: &str,
        memberships: &Memberships,
    ) -> EngineResult<CommitteeParticipant> {
        if !memberships.is_committer_of(committee_name) {
            return Err(EngineError::access_denied(format!(
                "{} is not a committer on {committee_name}",
                self.asf_uid
            )));
        }
        Ok(CommitteeParticipant {
            committer: self,
            committee_name: committee_name.to_string(),
        })
    }
}

/// A committer on a specific project's committee: may create and mutate
/// draft content and trigger checks, but not open a vote or release it.
#[derive(Clone)]
pub struct CommitteeParticipant {
    pub(crate) committer: FoundationCommitter,
    pub committee_name: String,
}

impl CommitteeParticipant {
    pub fn pool(&self) -> &SqlitePool {
        self.committer.pool()
    }

    pub fn store(&self) -> &ContentStore {
        self.committer.store()
    }

    pub fn asf_uid(&self) -> &str {
        &self.committer.asf_uid
    }

    /// Starts a new `CANDIDATE_DRAFT` release.
    pub async fn start_release(&self, project_name: &str, version_name: &str) -> EngineResult<Release> {
        let release = atr_release::start(self.pool(), self.store(), project_name, version_name, self.asf_uid()).await?;
        audit::record(
            self.committer.public.audit(),
            self.asf_uid(),
            "release.start",
            json!({"release_name": release.name}),
        );
        Ok(release)
    }

    /// Creates a new revision of `release` by cloning its latest revision
    /// and running `body` against the clone, per the revision manager's
    /// scoped-creation contract. Only valid while the release is in the
    /// mutable `CANDIDATE_DRAFT` phase.
    pub async fn add_revision<F, Fut>(
        &self,
        release: &Release,
        description: Option<String>,
        body: F,
    ) -> EngineResult<atr_revision::Outcome>
    where
        F: FnOnce(&mut atr_revision::Creating) -> Fut,
        Fut: std::future::Future<Output = EngineResult<()>>,
    {
        if !release.phase.is_mutable() {
            return Err(EngineError::conflict("release is not in a mutable phase"));
        }
        let outcome =
            atr_revision::create_and_manage(self.pool(), self.store(), release, self.asf_uid(), description, body)
                .await?;
        audit::record(
            self.committer.public.audit(),
            self.asf_uid(),
            "revision.create",
            json!({"release_name": release.name}),
        );
        Ok(outcome)
    }

    /// Enumerates a sealed revision's files and enqueues its check tasks.
    pub async fn run_checks(&self, project_name: &str, version_name: &str, revision: &Revision) -> EngineResult<usize> {
        let enqueued =
            atr_checks::enumerate_and_enqueue(self.pool(), self.store(), project_name, version_name, revision, self.asf_uid())
                .await?;
        audit::record(
            self.committer.public.audit(),
            self.asf_uid(),
            "checks.enumerate",
            json!({"release_name": revision.release_name, "revision": revision.number, "enqueued": enqueued}),
        );
        Ok(enqueued)
    }

    /// Opens a vote on `release_name`'s selected revision. Thin pass-through
    /// to [`atr_vote::start`]: any committee participant may start a vote,
    /// matching the original system's `CommitteeParticipant.start`.
    #[allow(clippy::too_many_arguments)]
    pub async fn start_vote(
        &self,
        release_name: &str,
        email_to: &str,
        permitted_recipients: &[String],
        selected_revision_number: &str,
        vote_duration_hours: i64,
        subject_template: &str,
        body_template: &str,
        promote: bool,
    ) -> EngineResult<atr_vote::VoteInitiatePayload> {
        let payload = atr_vote::start(
            self.pool(),
            self.store(),
            release_name,
            email_to,
            permitted_recipients,
            selected_revision_number,
            vote_duration_hours,
            subject_template,
            body_template,
            self.asf_uid(),
            self.asf_uid(),
            &self.committee_name,
            promote,
        )
        .await?;
        audit::record(
            self.committer.public.audit(),
            self.asf_uid(),
            "vote.start",
            json!({"release_name": release_name, "email_to": email_to}),
        );
        Ok(payload)
    }

    /// Requires the caller to be a full (binding-vote) member of the
    /// committee, not merely a committer.
    pub fn as_committee_member(self, memberships: &Memberships) -> EngineResult<CommitteeMember> {
        if !memberships.is_member_of(&self.committee_name) {
            return Err(EngineError::access_denied(format!(
                "{} is not a full member of {}",
                self.committer.asf_uid, self.committee_name
            )));
        }
        Ok(CommitteeMember { participant: self })
    }
}

/// A full member of the project's committee: may open a vote, resolve one,
/// and announce a release.
#[derive(Clone)]
pub struct CommitteeMember {
    pub(crate) participant: CommitteeParticipant,
}

impl CommitteeMember {
    pub fn pool(&self) -> &SqlitePool {
        self.participant.pool()
    }

    pub fn store(&self) -> &ContentStore {
        self.participant.store()
    }

    pub fn asf_uid(&self) -> &str {
        self.participant.asf_uid()
    }

    fn audit_writer(&self) -> &JsonlChannelWriter {
        self.participant.committer.public.audit()
    }

    pub async fn promote_to_candidate(
        &self,
        release_name: &str,
        selected_revision_number: &str,
        vote_manual: bool,
    ) -> EngineResult<()> {
        atr_release::promote_to_candidate(self.pool(), self.store(), release_name, selected_revision_number, vote_manual).await?;
        audit::record(
            self.audit_writer(),
            self.asf_uid(),
            "release.promote_to_candidate",
            json!({"release_name": release_name}),
        );
        Ok(())
    }

    /// A vote passed: the release moves from `CANDIDATE` to `PREVIEW`.
    /// Exposed here rather than called directly by the vote coordinator so
    /// every resolution still passes through the audit log.
    pub async fn resolve_vote_passed(&self, release_name: &str) -> EngineResult<Release> {
        let release = atr_release::to_preview(self.pool(), self.store(), release_name, self.asf_uid()).await?;
        audit::record(
            self.audit_writer(),
            self.asf_uid(),
            "vote.resolve.passed",
            json!({"release_name": release_name}),
        );
        Ok(release)
    }

    /// A vote failed: the release falls back from `CANDIDATE` to
    /// `CANDIDATE_DRAFT`.
    pub async fn resolve_vote_failed(&self, release_name: &str) -> EngineResult<Release> {
        let release = atr_release::to_draft(self.pool(), release_name).await?;
        audit::record(
            self.audit_writer(),
            self.asf_uid(),
            "vote.resolve.failed",
            json!({"release_name": release_name}),
        );
        Ok(release)
    }

    /// Resolves a tabulated mailing-list vote, including the podling
    /// two-round dance. Thin pass-through to [`atr_vote::resolve`]; prefer
    /// this over [`Self::resolve_vote_passed`]/[`Self::resolve_vote_failed`]
    /// whenever a full [`atr_vote::tabulate`] result is in hand, since only
    /// this path produces the resolution email body and chains into a
    /// podling's second round automatically.
    #[allow(clippy::too_many_arguments)]
    pub async fn resolve_vote(
        &self,
        release_name: &str,
        committee: &Committee,
        current_thread_id: &str,
        votes: &HashMap<String, atr_vote::VoteEmail>,
        summary: &atr_vote::VoteSummary,
        outcome: &str,
        resolution: atr_vote::Resolution,
        incubator_vote_address: &str,
        second_round_subject_template: &str,
        second_round_body_template: &str,
    ) -> EngineResult<atr_vote::ResolveOutcome> {
        let result = atr_vote::resolve(
            self.pool(),
            self.store(),
            release_name,
            committee,
            current_thread_id,
            votes,
            summary,
            outcome,
            resolution,
            self.asf_uid(),
            self.asf_uid(),
            incubator_vote_address,
            second_round_subject_template,
            second_round_body_template,
        )
        .await?;
        audit::record(
            self.audit_writer(),
            self.asf_uid(),
            "vote.resolve",
            json!({"release_name": release_name, "passed": resolution == atr_vote::Resolution::Passed}),
        );
        Ok(result)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn announce(
        &self,
        release_name: &str,
        selected_revision_number: &str,
        recipient: &str,
        subject: &str,
        body: &str,
        path_suffix: &str,
        permitted_recipients: &[String],
        preserve_download_files: bool,
    ) -> EngineResult<()> {
        atr_release::announce(
            self.pool(),
            self.store(),
            release_name,
            selected_revision_number,
            recipient,
            subject,
            body,
            path_suffix,
            permitted_recipients,
            self.asf_uid(),
            preserve_download_files,
        )
        .await?;
        audit::record(
            self.audit_writer(),
            self.asf_uid(),
            "release.announce",
            json!({"release_name": release_name, "recipient": recipient, "path_suffix": path_suffix}),
        );
        Ok(())
    }

    /// Deletes a non-`RELEASE`-phase release outright. A `RELEASE`-phase
    /// release has already been announced to the public and requires a
    /// foundation admin's elevation (`as_foundation_admin` then
    /// `FoundationAdmin::delete_release`) instead.
    pub async fn delete_release(
        &self,
        project_name: &str,
        version_name: &str,
        include_downloads: bool,
    ) -> EngineResult<()> {
        let release: Release = sqlx::query_as("SELECT * FROM release WHERE project_name = ? AND version = ?")
            .bind(project_name)
            .bind(version_name)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| EngineError::not_found(format!("release '{project_name} {version_name}'")))?;

        if release.phase == atr_db::entities::ReleasePhase::Release {
            return Err(EngineError::access_denied(
                "deleting a released release requires a foundation admin",
            ));
        }

        atr_release::delete(self.pool(), self.store(), project_name, version_name, include_downloads).await?;
        audit::record(
            self.audit_writer(),
            self.asf_uid(),
            "release.delete",
            json!({"project_name": project_name, "version_name": version_name}),
        );
        Ok(())
    }

    /// Requires the caller to additionally be a foundation-wide admin; the
    /// proof (`is_admin`) is the caller's own lookup against its admin-user
    /// configuration, passed in explicitly rather than read from a global.
    pub fn as_foundation_admin(self, is_admin: bool) -> EngineResult<FoundationAdmin> {
        if !is_admin {
            return Err(EngineError::access_denied(format!(
                "{} is not a foundation admin",
                self.participant.committer.asf_uid
            )));
        }
        Ok(FoundationAdmin { member: self })
    }
}

/// Foundation-wide admin override: may delete a release outright and
/// import signing material on another user's behalf.
#[derive(Clone)]
pub struct FoundationAdmin {
    pub(crate) member: CommitteeMember,
}

impl FoundationAdmin {
    pub fn pool(&self) -> &SqlitePool {
        self.member.pool()
    }

    pub fn store(&self) -> &ContentStore {
        self.member.store()
    }

    pub fn asf_uid(&self) -> &str {
        self.member.asf_uid()
    }

    pub async fn delete_release(
        &self,
        project_name: &str,
        version_name: &str,
        include_downloads: bool,
    ) -> EngineResult<()> {
        atr_release::delete(self.pool(), self.store(), project_name, version_name, include_downloads).await?;
        audit::record(
            self.member.audit_writer(),
            self.asf_uid(),
            "release.delete",
            json!({"project_name": project_name, "version_name": version_name}),
        );
        Ok(())
    }
}
