//! Worker process entrypoint: boots the engine once and runs the task
//! executor's claim loop to its lifetime bound, then exits so a supervisor
//! (systemd, a process manager) can cycle a fresh one. Matches the original
//! system's short-lived-worker-process model.

use atr::Engine;

fn main() {
    let json_logs = std::env::var("ATR_LOG_JSON").map(|v| v == "1").unwrap_or(false);
    if let Err(err) = atr_core::logging::init_tracing(json_logs) {
        eprintln!("failed to initialize logging: {err}");
        std::process::exit(1);
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("failed to start tokio runtime: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(run()) {
        tracing::error!(error = %err, "worker exited with an error");
        std::process::exit(1);
    }
}

async fn run() -> atr_core::EngineResult<()> {
    let engine = Engine::bootstrap().await?;
    let processed = engine.run_worker_once().await?;
    tracing::info!(processed, "worker lifetime complete");
    Ok(())
}
