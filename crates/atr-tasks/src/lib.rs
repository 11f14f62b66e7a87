//! The task executor: a durable SQLite-backed queue, a static
//! `TaskType -> Handler` dispatch table, and the claim/dispatch/record
//! worker loop that drains it.

pub mod collaborators;
pub mod dispatch;
pub mod handlers;
pub mod queue;
pub mod worker;

pub use collaborators::Collaborators;
pub use dispatch::{checker_tag, dispatch, CheckerRegistry, TaskContext};
pub use queue::{claim_next, complete, queued};
pub use worker::{run_loop, EMPTY_QUEUE_BACKOFF, TASKS_PER_WORKER_LIFETIME};
