//! The Apache Trusted Releases engine: metadata store, content store,
//! revision manager, release state machine, task executor, check
//! orchestrator, authorization facade, and vote coordinator, wired into one
//! bootstrap entry point for the worker binary and any HTTP facade built on
//! top of this crate.
//!
//! Each component lives in its own workspace crate (`atr-core`, `atr-db`,
//! `atr-storage`, `atr-revision`, `atr-release`, `atr-tasks`, `atr-checks`,
//! `atr-auth`, `atr-vote`); this crate only assembles them.

pub mod engine;

pub use atr_auth as auth;
pub use atr_checks as checks;
pub use atr_config as config;
pub use atr_core as core;
pub use atr_db as db;
pub use atr_release as release;
pub use atr_revision as revision;
pub use atr_storage as storage;
pub use atr_tasks as tasks;
pub use atr_vote as vote;

pub use engine::Engine;
