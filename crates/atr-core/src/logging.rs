//! Structured logging setup shared by the worker process and library consumers.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize a process-wide tracing subscriber.
///
/// Honors `RUST_LOG` if set; otherwise defaults to `atr=info,warn`. Output is
/// line-oriented JSON when `json` is true (suitable for log aggregation in
/// production), or compact human-readable text otherwise.
pub fn init_tracing(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("atr=info,warn"));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_current_span(true).with_span_list(false))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).compact())
            .try_init()?;
    }
    Ok(())
}
