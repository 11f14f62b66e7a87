//! The claim/dispatch/record loop a worker process runs. Grounded on the
//! original system's `_worker_loop_run`/`_task_next_claim`/`_task_process`:
//! claim the oldest eligible task under an atomic conditional `UPDATE`,
//! dispatch it through the static table, record its outcome, and repeat
//! until a lifetime bound is hit so a supervisor can cycle the process and
//! bound any leaked memory.

use atr_core::EngineResult;
use atr_db::entities::TaskStatus;
use atr_storage::ContentStore;
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::collaborators::Collaborators;
use crate::dispatch::{dispatch, CheckerRegistry, TaskContext};
use crate::queue;

/// How many tasks a single worker process handles before returning, so a
/// supervisor can start a fresh one. Matches the original system's
/// `max_to_process = 10`.
pub const TASKS_PER_WORKER_LIFETIME: usize = 10;

/// How long to sleep after finding no eligible task before polling again.
pub const EMPTY_QUEUE_BACKOFF: Duration = Duration::from_millis(100);

/// How many consecutive empty (or erroring) polls `run_loop` tolerates
/// before giving up and returning, rather than waiting forever for a queue
/// that may never fill up within this process's lifetime.
pub const MAX_CONSECUTIVE_EMPTY_POLLS: usize = 3;

/// Runs the claim loop until [`TASKS_PER_WORKER_LIFETIME`] tasks have been
/// processed (successfully or not) or [`MAX_CONSECUTIVE_EMPTY_POLLS`]
/// consecutive polls find nothing to do, then returns. A transient error
/// while claiming or recording a task is logged and treated as an empty
/// poll rather than aborting the whole worker.
pub async fn run_loop(
    pool: &SqlitePool,
    store: &ContentStore,
    checkers: &CheckerRegistry,
    collaborators: &Collaborators,
) -> EngineResult<usize> {
    let pid = std::process::id();
    let mut processed = 0usize;
    let mut consecutive_empty_polls = 0usize;

    while processed < TASKS_PER_WORKER_LIFETIME && consecutive_empty_polls < MAX_CONSECUTIVE_EMPTY_POLLS {
        match queue::claim_next(pool, pid).await {
            Ok(Some(task)) => {
                consecutive_empty_polls = 0;
                info!(task_id = task.id, task_type = %task.task_type, "claimed task");
                let ctx = TaskContext {
                    pool,
                    store,
                    task: &task,
                    checkers,
                    collaborators,
                };
                match dispatch(ctx).await {
                    Ok(result) => {
                        if let Err(err) = queue::complete(pool, task.id, TaskStatus::Completed, result, None).await {
                            error!(task_id = task.id, error = %err, "failed to record task completion");
                        }
                    }
                    Err(err) => {
                        warn!(task_id = task.id, error = %err, "task failed");
                        if let Err(record_err) =
                            queue::complete(pool, task.id, TaskStatus::Failed, None, Some(err.to_string())).await
                        {
                            error!(task_id = task.id, error = %record_err, "failed to record task failure");
                        }
                    }
                }
                processed += 1;
            }
            Ok(None) => {
                consecutive_empty_polls += 1;
                tokio::time::sleep(EMPTY_QUEUE_BACKOFF).await;
            }
            Err(err) => {
                consecutive_empty_polls += 1;
                error!(error = %err, "error claiming next task");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }

    Ok(processed)
}
