//! Structured logging initialization
//!
//! Provides consistent logging initialization across the workspace
//! binaries. Set `LOG_FORMAT=json` for machine-readable output.

use crate::config::ConfigExt;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Guard that keeps the tracing subscriber active.
/// Drop this at the end of main to flush logs.
pub struct LogGuard;

/// Initialize structured logging for a component.
///
/// Returns a guard that should be held for the lifetime of the program.
///
/// # Example
/// ```ignore
/// let _guard = init_logging("db-synth");
/// info!("Starting up...");
/// ```
pub fn init_logging(component: &str) -> LogGuard {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let json = String::env_opt("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json"));

    // Logs go to stderr: stdout is reserved for synthesized output.
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(false).with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }

    tracing::debug!(component, "Logging initialized");
    LogGuard
}
