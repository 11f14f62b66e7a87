use atr_checks::{Checker, FunctionArguments, Recorder};
use atr_core::{EngineError, EngineResult};
use atr_db::entities::{Task, TaskType};
use atr_storage::ContentStore;
use serde_json::Value;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;

use crate::collaborators::Collaborators;
use crate::handlers;

/// Checkers a deployment has wired in, keyed by the [`TaskType`] they
/// handle. A check-task-type with no registered checker still runs: the
/// handler records a placeholder success through the [`Recorder`] so the
/// enqueue-claim-record-cache pipeline is always exercisable, even before
/// any concrete checker (RAT, signature verification, SBOM scoring, …) is
/// plugged in.
pub type CheckerRegistry = HashMap<TaskType, Arc<dyn Checker>>;

/// Everything a task handler needs that isn't carried on the [`Task`] row
/// itself.
pub struct TaskContext<'a> {
    pub pool: &'a SqlitePool,
    pub store: &'a ContentStore,
    pub task: &'a Task,
    pub checkers: &'a CheckerRegistry,
    pub collaborators: &'a Collaborators,
}

/// The human-readable checker identity recorded on every [`CheckResult`]
/// row for a given check task type, matching the original system's
/// `module.function_name` convention but stable across refactors since it
/// is derived from the task type tag rather than a Rust item path.
pub fn checker_tag(task_type: TaskType) -> &'static str {
    match task_type {
        TaskType::SignatureCheck => "signature-check",
        TaskType::HashingCheck => "hashing-check",
        TaskType::LicenseFiles => "license-files",
        TaskType::LicenseHeaders => "license-headers",
        TaskType::RatCheck => "rat-check",
        TaskType::TargzIntegrity => "targz-integrity",
        TaskType::TargzStructure => "targz-structure",
        TaskType::ZipformatIntegrity => "zipformat-integrity",
        TaskType::ZipformatStructure => "zipformat-structure",
        TaskType::PathsCheck => "paths-check",
        TaskType::SbomGenerateCyclonedx => "sbom-generate-cyclonedx",
        TaskType::SbomOsvScan => "sbom-osv-scan",
        TaskType::SbomToolScore => "sbom-tool-score",
        TaskType::SbomAugment => "sbom-augment",
        TaskType::SbomQsScore => "sbom-qs-score",
        other => panic!("{other} is not a check task type"),
    }
}

fn is_check_task(task_type: TaskType) -> bool {
    matches!(
        task_type,
        TaskType::SignatureCheck
            | TaskType::HashingCheck
            | TaskType::LicenseFiles
            | TaskType::LicenseHeaders
            | TaskType::RatCheck
            | TaskType::TargzIntegrity
            | TaskType::TargzStructure
            | TaskType::ZipformatIntegrity
            | TaskType::ZipformatStructure
            | TaskType::PathsCheck
            | TaskType::SbomGenerateCyclonedx
            | TaskType::SbomOsvScan
            | TaskType::SbomToolScore
            | TaskType::SbomAugment
            | TaskType::SbomQsScore
    )
}

/// The static `TaskType -> Handler` table. A `match` over an exhaustively
/// derived enum is this engine's equivalent of the original's reflective
/// `tasks.resolve(TaskType)`: every task type is handled, and the compiler
/// rejects a build that forgets one.
pub async fn dispatch(ctx: TaskContext<'_>) -> EngineResult<Option<Value>> {
    let task_type = ctx.task.task_type;

    if is_check_task(task_type) {
        return run_check(task_type, ctx).await;
    }

    match task_type {
        TaskType::VoteInitiate => handlers::vote_initiate(ctx).await,
        TaskType::MessageSend => handlers::message_send(ctx).await,
        TaskType::SvnImportFiles => handlers::svn_import_files(ctx).await,
        TaskType::MetadataUpdate => handlers::metadata_update(ctx).await,
        TaskType::DistributionWorkflow => handlers::distribution_workflow(ctx).await,
        TaskType::KeysImportFile => handlers::keys_import_file(ctx).await,
        TaskType::WorkflowStatus => handlers::workflow_status(ctx).await,
        other => Err(EngineError::Fatal(format!("no handler registered for {other}"))),
    }
}

/// Runs a check-type task: builds the lazy recorder factory, hands it (plus
/// the task's targeting fields) to the registered [`Checker`] if one is
/// configured, and otherwise records a placeholder success so the pipeline
/// is still fully exercised.
async fn run_check(task_type: TaskType, ctx: TaskContext<'_>) -> EngineResult<Option<Value>> {
    let task = ctx.task;
    let project_name = task
        .project_name
        .clone()
        .ok_or_else(|| EngineError::validation("check task is missing project_name"))?;
    let version_name = task
        .version_name
        .clone()
        .ok_or_else(|| EngineError::validation("check task is missing version_name"))?;
    let revision_number = task
        .revision_number
        .clone()
        .ok_or_else(|| EngineError::validation("check task is missing revision_number"))?;
    let primary_rel_path = task.primary_rel_path.clone();

    let extra_args = match &task.task_args.0 {
        Value::Object(map) => map.clone(),
        Value::Null => serde_json::Map::new(),
        other => {
            return Err(EngineError::validation(format!(
                "check task args must be an object, got {other}"
            )))
        }
    };

    let pool = ctx.pool.clone();
    let checker_name = checker_tag(task_type).to_string();
    let recorder_project = project_name.clone();
    let recorder_version = version_name.clone();
    let recorder_revision = revision_number.clone();
    let recorder_primary = primary_rel_path.clone();
    let recorder: atr_checks::recorder::RecorderFactory = Box::new(move || {
        let pool = pool.clone();
        let checker_name = checker_name.clone();
        let project_name = recorder_project.clone();
        let version_name = recorder_version.clone();
        let revision_number = recorder_revision.clone();
        let primary_rel_path = recorder_primary.clone();
        Box::pin(async move {
            Recorder::create(
                pool,
                checker_name,
                project_name,
                version_name,
                revision_number,
                primary_rel_path,
                None,
                true,
            )
            .await
        })
    });

    let args = FunctionArguments {
        recorder,
        asf_uid: task.asf_uid.clone(),
        project_name,
        version_name,
        revision_number,
        primary_rel_path,
        extra_args,
    };

    if let Some(checker) = ctx.checkers.get(&task_type) {
        return checker.run(args).await;
    }

    let mut recorder = (args.recorder)().await?;
    recorder
        .success("no checker registered; recorded a placeholder result", None, None)
        .await?;
    Ok(None)
}
