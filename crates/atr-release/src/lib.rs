//! The release state machine: starting a draft, promoting it through its
//! vote phases, announcing it, and deleting it outright. Each transition
//! is grounded on the phase table — `CANDIDATE_DRAFT -> CANDIDATE ->
//! PREVIEW -> RELEASE`, with `CANDIDATE_DRAFT` the only mutable phase.

pub mod announce;
pub mod delete;
pub mod promote;
pub mod resolve;
pub mod start;

pub use announce::announce;
pub use delete::delete;
pub use promote::promote_to_candidate;
pub use resolve::{to_draft, to_preview};
pub use start::start;
