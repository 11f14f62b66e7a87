//! Vote coordinator: initiating a mailing-list vote, tabulating its
//! castings, and resolving it into a phase transition, including the
//! two-round podling dance.
//!
//! This crate knows nothing about email delivery or archive retrieval —
//! both are `atr-tasks`/HTTP-facade concerns. It takes already-fetched
//! thread messages in and hands already-rendered payloads out.

pub mod resolve;
pub mod start;
pub mod tabulate;
pub mod template;

pub use resolve::{resolve, resolution_body, Resolution, ResolveOutcome};
pub use start::{start, VoteInitiatePayload};
pub use tabulate::{tabulate as tabulate_thread, ThreadMessage, Vote, VoteDetails, VoteEmail, VoteStatus, VoteSummary};
pub use template::{substitute, StartVoteOptions};

/// Pluralizes `word` for `count`, e.g. `plural(1, "hour") == "1 hour"`.
pub(crate) fn plural(count: i64, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plural_only_omits_the_s_for_exactly_one() {
        assert_eq!(plural(1, "hour"), "1 hour");
        assert_eq!(plural(2, "hour"), "2 hours");
        assert_eq!(plural(0, "minute"), "0 minutes");
    }
}
