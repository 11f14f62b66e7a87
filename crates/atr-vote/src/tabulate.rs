//! Mailing-list vote tabulation.
//!
//! Ground truth is `original_source/atr/tabulate.py`: the caller fetches a
//! thread's messages through its own `MailArchiveReader` (out of scope
//! here, see §6) and hands them to [`tabulate`] as a plain iterator, so
//! this module is exercisable without a network or archive reader at all.

use atr_core::{EngineError, EngineResult};
use atr_db::entities::Committee;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// A thread's vote is discarded if it runs past this many messages —
/// matches `MAX_THREAD_MESSAGES` in the original.
pub const MAX_THREAD_MESSAGES: usize = 10_000;

/// One already-fetched mailing-list message. Field names mirror the raw
/// archive record the original system reads off `util.thread_messages`.
#[derive(Debug, Clone, Default)]
pub struct ThreadMessage {
    pub mid: String,
    pub from_raw: String,
    pub list_raw: String,
    pub subject: String,
    pub body: String,
    /// Unix timestamp the message was sent, if the archive recorded one.
    pub epoch: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteStatus {
    Binding,
    Committer,
    Contributor,
    Unknown,
}

impl VoteStatus {
    fn label(self) -> &'static str {
        match self {
            Self::Binding => "binding",
            Self::Committer => "committer",
            Self::Contributor => "contributor",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Yes,
    No,
    Abstain,
    /// More than one casting was found in a single message and they did
    /// not agree; the original collapses this to an "unknown" symbol
    /// rather than guessing.
    Unknown,
}

impl Vote {
    fn symbol(self) -> &'static str {
        match self {
            Self::Yes => "+1",
            Self::No => "-1",
            Self::Abstain => "0",
            Self::Unknown => "?",
        }
    }
}

/// One voter's last-known casting in a thread.
#[derive(Debug, Clone)]
pub struct VoteEmail {
    pub asf_uid_or_email: String,
    pub from_email: String,
    pub status: VoteStatus,
    pub mid: String,
    pub vote: Vote,
    pub quotation: String,
    /// True if this voter had already cast a vote earlier in the thread;
    /// this casting replaced it.
    pub updated: bool,
}

#[derive(Debug, Clone, Default)]
pub struct VoteSummary {
    pub binding_votes: u32,
    pub binding_votes_yes: u32,
    pub binding_votes_no: u32,
    pub binding_votes_abstain: u32,
    pub non_binding_votes: u32,
    pub non_binding_votes_yes: u32,
    pub non_binding_votes_no: u32,
    pub non_binding_votes_abstain: u32,
    pub unknown_votes: u32,
    pub unknown_votes_yes: u32,
    pub unknown_votes_no: u32,
    pub unknown_votes_abstain: u32,
}

#[derive(Debug, Clone)]
pub struct VoteDetails {
    pub start_unixtime: Option<i64>,
    pub votes: HashMap<String, VoteEmail>,
    pub summary: VoteSummary,
    pub passed: bool,
    pub outcome: String,
}

/// Tabulates every message in `messages` (already bounded to one thread)
/// into a per-voter last-casting map, then summarizes and scores it.
///
/// `min_hours` is the project's configured minimum vote duration
/// (`ReleasePolicy::min_hours`, default 72 if `None`); `now_unixtime` is
/// injected by the caller rather than read from the clock here, so the
/// pass/fail-relative-to-duration logic is deterministic under test.
pub fn tabulate(
    committee: Option<&Committee>,
    email_to_uid: &HashMap<String, String>,
    messages: impl IntoIterator<Item = ThreadMessage>,
    min_hours: Option<i64>,
    now_unixtime: i64,
) -> EngineResult<VoteDetails> {
    let (start_unixtime, votes) = collect_votes(committee, email_to_uid, messages)?;
    let summary = vote_summary(&votes);
    let (passed, outcome) = vote_outcome(min_hours, start_unixtime, now_unixtime, &votes);
    Ok(VoteDetails {
        start_unixtime,
        votes,
        summary,
        passed,
        outcome,
    })
}

fn collect_votes(
    committee: Option<&Committee>,
    email_to_uid: &HashMap<String, String>,
    messages: impl IntoIterator<Item = ThreadMessage>,
) -> EngineResult<(Option<i64>, HashMap<String, VoteEmail>)> {
    let mut tabulated: HashMap<String, VoteEmail> = HashMap::new();
    let mut start_unixtime = None;
    let mut count = 0usize;

    for msg in messages {
        count += 1;
        if count > MAX_THREAD_MESSAGES {
            return Err(EngineError::validation(format!(
                "thread exceeds maximum of {MAX_THREAD_MESSAGES} messages"
            )));
        }

        let Some((from_email, asf_uid)) = vote_identity(&msg.from_raw, email_to_uid) else {
            continue;
        };

        let (asf_uid_or_email, status) = match &asf_uid {
            Some(uid) => (uid.clone(), vote_status(uid, committee)),
            None => (from_email.clone(), VoteStatus::Unknown),
        };

        if start_unixtime.is_none() {
            start_unixtime = msg.epoch;
        }

        if msg.subject.contains("[RESULT]") {
            break;
        }

        if msg.body.is_empty() {
            continue;
        }

        let castings = vote_castings(&msg.body);
        if castings.is_empty() {
            continue;
        }

        let vote = if castings.len() == 1 {
            castings[0].0
        } else {
            Vote::Unknown
        };
        let quotation = castings
            .iter()
            .map(|(_, line)| line.as_str())
            .collect::<Vec<_>>()
            .join(" // ");

        let updated = tabulated.contains_key(&asf_uid_or_email);
        tabulated.insert(
            asf_uid_or_email.clone(),
            VoteEmail {
                asf_uid_or_email,
                from_email,
                status,
                mid: msg.mid.clone(),
                vote,
                quotation,
                updated,
            },
        );
    }

    Ok((start_unixtime, tabulated))
}

/// Strips the mailing-list `.invalid` suffix and resolves the sender to an
/// ASF uid: `@apache.org` addresses map directly; anything else looks up
/// `email_to_uid`. Returns `None` if `from_raw` carries no usable address
/// at all.
fn vote_identity(from_raw: &str, email_to_uid: &HashMap<String, String>) -> Option<(String, Option<String>)> {
    let email = email_from_from_header(from_raw)?;
    let email = email.strip_suffix(".invalid").unwrap_or(&email).to_string();
    let asf_uid = if let Some(local) = email.strip_suffix("@apache.org") {
        Some(local.to_string())
    } else {
        email_to_uid.get(&email).cloned()
    };
    Some((email, asf_uid))
}

static ANGLE_ADDRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<([^>]+)>").unwrap());

/// Extracts the bare lowercase address out of a `"Display Name" <addr>` or
/// plain-address `From:` header value.
fn email_from_from_header(from_raw: &str) -> Option<String> {
    if let Some(caps) = ANGLE_ADDRESS.captures(from_raw) {
        return Some(caps[1].trim().to_ascii_lowercase());
    }
    let trimmed = from_raw.trim();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return None;
    }
    Some(trimmed.to_ascii_lowercase())
}

fn vote_status(asf_uid: &str, committee: Option<&Committee>) -> VoteStatus {
    let Some(committee) = committee else {
        return VoteStatus::Unknown;
    };
    if committee.is_member(asf_uid) {
        VoteStatus::Binding
    } else if committee.is_committer(asf_uid) {
        VoteStatus::Committer
    } else {
        VoteStatus::Contributor
    }
}

/// Parses every vote casting out of a message body, stopping at the first
/// quotation/signature marker and skipping explanation/quote lines, just
/// like `_vote_castings`/`_vote_continue`/`_vote_break` in the original.
fn vote_castings(body: &str) -> Vec<(Vote, String)> {
    let mut castings = Vec::new();
    for line in body.lines() {
        if vote_continue(line) {
            continue;
        }
        if vote_break(line) {
            break;
        }

        let plus_one = line.starts_with("+1") || line.contains(" +1");
        let minus_one = line.starts_with("-1") || line.contains(" -1");
        let zero = matches!(line, "0" | "-0" | "+0")
            || line.starts_with("0 ")
            || line.starts_with("+0 ")
            || line.starts_with("-0 ");

        if (plus_one && minus_one) || (plus_one && zero) || (minus_one && zero) {
            continue;
        }
        if plus_one {
            castings.push((Vote::Yes, line.to_string()));
        } else if minus_one {
            castings.push((Vote::No, line.to_string()));
        } else if zero {
            castings.push((Vote::Abstain, line.to_string()));
        }
    }
    castings
}

fn vote_continue(line: &str) -> bool {
    const EXPLANATION_INDICATORS: [&str; 4] = ["[ ] +1", "[ ] -1", "binding +1 votes", "binding -1 votes"];
    if EXPLANATION_INDICATORS.iter().any(|indicator| line.contains(indicator)) {
        return true;
    }
    line.starts_with('>')
}

fn vote_break(line: &str) -> bool {
    if line == "-- " {
        return true;
    }
    if line.starts_with("On ") && line.as_bytes().get(6..8) == Some(b", ") {
        return true;
    }
    if line.starts_with("From: ") {
        return true;
    }
    if line.starts_with("________") {
        return true;
    }
    false
}

pub fn vote_summary(votes: &HashMap<String, VoteEmail>) -> VoteSummary {
    let mut summary = VoteSummary::default();
    for vote_email in votes.values() {
        match vote_email.status {
            VoteStatus::Binding => {
                summary.binding_votes += 1;
                match vote_email.vote {
                    Vote::Yes => summary.binding_votes_yes += 1,
                    Vote::No => summary.binding_votes_no += 1,
                    Vote::Abstain => summary.binding_votes_abstain += 1,
                    Vote::Unknown => {}
                }
            }
            VoteStatus::Committer | VoteStatus::Contributor => {
                summary.non_binding_votes += 1;
                match vote_email.vote {
                    Vote::Yes => summary.non_binding_votes_yes += 1,
                    Vote::No => summary.non_binding_votes_no += 1,
                    Vote::Abstain => summary.non_binding_votes_abstain += 1,
                    Vote::Unknown => {}
                }
            }
            VoteStatus::Unknown => {
                summary.unknown_votes += 1;
                match vote_email.vote {
                    Vote::Yes => summary.unknown_votes_yes += 1,
                    Vote::No => summary.unknown_votes_no += 1,
                    Vote::Abstain => summary.unknown_votes_abstain += 1,
                    Vote::Unknown => {}
                }
            }
        }
    }
    summary
}

/// The `binding_yes >= 3 && binding_yes > binding_no` pass rule, annotated
/// with "would pass/fail if closed now" while the minimum duration has not
/// yet elapsed.
fn vote_outcome(
    min_hours: Option<i64>,
    start_unixtime: Option<i64>,
    now_unixtime: i64,
    votes: &HashMap<String, VoteEmail>,
) -> (bool, String) {
    let duration_hours = start_unixtime
        .map(|start| (now_unixtime - start) as f64 / 3600.0)
        .unwrap_or(0.0);
    let min_duration_hours = min_hours.unwrap_or(72);
    let duration_hours_remaining = min_duration_hours as f64 - duration_hours;

    let (binding_yes, binding_no) = votes.values().filter(|v| v.status == VoteStatus::Binding).fold(
        (0u32, 0u32),
        |(yes, no), v| match v.vote {
            Vote::Yes => (yes + 1, no),
            Vote::No => (yes, no + 1),
            _ => (yes, no),
        },
    );

    format_outcome(duration_hours_remaining, binding_yes, binding_no)
}

fn format_outcome(duration_hours_remaining: f64, binding_yes: u32, binding_no: u32) -> (bool, String) {
    let passed = binding_yes >= 3 && binding_yes > binding_no;
    let still_open = duration_hours_remaining > 0.0;

    if !passed {
        let message = if still_open {
            format!(
                "The vote is still open for {}, but it would fail if closed now.",
                format_duration(duration_hours_remaining)
            )
        } else {
            "The vote failed.".to_string()
        };
        return (false, message);
    }

    let message = if still_open {
        format!(
            "The vote is still open for {}, but it would pass if closed now.",
            format_duration(duration_hours_remaining)
        )
    } else {
        "The vote passed.".to_string()
    };
    (true, message)
}

fn format_duration(duration_hours: f64) -> String {
    let mut hours = duration_hours.trunc() as i64;
    let mut minutes = ((duration_hours - duration_hours.trunc()) * 60.0).round() as i64;
    if minutes == 60 {
        hours += 1;
        minutes = 0;
    }

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(crate::plural(hours, "hour"));
    }
    if minutes > 0 {
        parts.push(crate::plural(minutes, "minute"));
    }

    if parts.is_empty() {
        return "less than 1 minute".to_string();
    }
    parts.join(" and ")
}

impl Vote {
    pub fn as_symbol(self) -> &'static str {
        self.symbol()
    }
}

impl VoteStatus {
    pub fn as_label(self) -> &'static str {
        self.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;

    fn committee() -> Committee {
        Committee {
            name: "foo".to_string(),
            full_name: "Foo".to_string(),
            is_podling: false,
            parent_committee_name: None,
            committee_members: Json(vec!["alice".to_string(), "carol".to_string()]),
            committers: Json(vec!["dave".to_string()]),
            release_managers: Json(vec![]),
        }
    }

    fn msg(from: &str, body: &str, epoch: i64) -> ThreadMessage {
        ThreadMessage {
            mid: format!("mid-{from}"),
            from_raw: from.to_string(),
            list_raw: "dev.foo.apache.org".to_string(),
            subject: "[VOTE] Release foo 1.0.0".to_string(),
            body: body.to_string(),
            epoch: Some(epoch),
        }
    }

    #[test]
    fn a_later_casting_in_the_thread_replaces_an_earlier_one_from_the_same_voter() {
        let committee = committee();
        let email_to_uid = HashMap::new();
        let messages = vec![
            msg("alice@apache.org", "+1", 1_000_000),
            msg("carol@apache.org", "+1", 1_000_100),
            msg("dave@apache.org", "+1 (non-binding but supportive)", 1_000_200),
            msg("eve@example.com", "+1", 1_000_300),
            msg("alice@apache.org", "-1 actually changed my mind", 1_000_400),
            msg("carol@apache.org", "+1", 1_000_500),
        ];

        let details = tabulate(Some(&committee), &email_to_uid, messages, Some(72), 1_000_500 + 3600).unwrap();
        assert_eq!(details.summary.binding_votes_yes, 1, "only carol's +1 remains binding-yes");
        assert_eq!(details.summary.binding_votes_no, 1, "alice's revised -1");
        assert!(details.votes["alice"].updated);
        assert!(!details.votes["carol"].updated);
    }

    #[test]
    fn binding_three_yes_with_no_no_votes_passes_after_duration_elapses() {
        let committee = Committee {
            committee_members: Json(vec!["a".to_string(), "b".to_string(), "c".to_string()]),
            ..committee()
        };
        let messages = vec![
            msg("a@apache.org", "+1", 0),
            msg("b@apache.org", "+1", 100),
            msg("c@apache.org", "+1", 200),
        ];
        let now = 72 * 3600 + 1;
        let details = tabulate(Some(&committee), &HashMap::new(), messages, Some(72), now).unwrap();
        assert!(details.passed);
        assert_eq!(details.outcome, "The vote passed.");
    }

    #[test]
    fn still_open_but_would_pass_is_annotated() {
        let committee = Committee {
            committee_members: Json(vec!["a".to_string(), "b".to_string(), "c".to_string()]),
            ..committee()
        };
        let messages = vec![
            msg("a@apache.org", "+1", 0),
            msg("b@apache.org", "+1", 0),
            msg("c@apache.org", "+1", 0),
        ];
        let details = tabulate(Some(&committee), &HashMap::new(), messages, Some(72), 3600).unwrap();
        assert!(details.passed);
        assert!(details.outcome.contains("would pass if closed now"));
    }

    #[test]
    fn quoted_and_signature_lines_are_not_counted_as_castings() {
        let body = "Thanks for the release!\n> +1 from the original email\n-- \n+1 in my sig, ignored";
        let castings = vote_castings(body);
        assert!(castings.is_empty());
    }

    #[test]
    fn a_line_with_both_symbols_is_dropped_as_ambiguous() {
        assert!(vote_castings("+1/-1 depending on your perspective").is_empty());
    }

    #[test]
    fn explanation_indicator_lines_are_skipped() {
        let body = "[ ] +1 Release this package\n[ ] -1 Do not release\n+1";
        let castings = vote_castings(body);
        assert_eq!(castings.len(), 1);
        assert_eq!(castings[0].0, Vote::Yes);
    }
}
