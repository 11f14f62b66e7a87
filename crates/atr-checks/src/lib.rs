//! The check orchestrator: turns a sealed revision into a set of per-file
//! and per-release checker tasks, and gives each checker a [`Recorder`] that
//! writes its findings as append-only [`CheckResult`](atr_db::entities::CheckResult)
//! rows, reusing a prior revision's results when the underlying bytes and
//! checker have not changed.

pub mod enumerate;
pub mod ignore;
pub mod recorder;
pub mod registry;

pub use enumerate::enumerate_and_enqueue;
pub use ignore::filter_ignored;
pub use recorder::{FunctionArguments, Recorder};
pub use registry::{checker_for_suffix, release_level_checks};

use async_trait::async_trait;
use atr_core::EngineResult;
use serde_json::Value;

/// The seam a concrete checker implementation plugs into. No checker's file-
/// format logic (signature verification, RAT scanning, SBOM scoring, …) is
/// implemented in this crate; handlers live with the task executor and call
/// out to an injected `Checker` so the dispatch and caching plumbing here is
/// fully exercisable on its own.
#[async_trait]
pub trait Checker: Send + Sync {
    async fn run(&self, args: FunctionArguments) -> EngineResult<Option<Value>>;
}
