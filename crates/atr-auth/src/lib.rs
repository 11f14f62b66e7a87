//! The authorization facade: a ladder of capability objects
//! (`GeneralPublic` → `FoundationCommitter` → `CommitteeParticipant` →
//! `CommitteeMember` → `FoundationAdmin`), each embedding proof of the
//! privilege below plus the evidence for its own, and a mandatory audit
//! log every mutating method writes through before returning.

pub mod audit;
pub mod capability;
pub mod identity;

pub use capability::{CommitteeMember, CommitteeParticipant, FoundationAdmin, FoundationCommitter, GeneralPublic};
pub use identity::{Authorisation, CachedAuthorisation, Memberships};
