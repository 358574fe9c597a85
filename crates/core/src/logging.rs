//! Structured logging infrastructure for SurveyLink.
//!
//! Log level is configured via the `RUST_LOG` environment variable and
//! defaults to `info`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize human-readable logging for interactive use.
///
/// # Example
/// ```no_run
/// use surveylink_core::logging;
///
/// logging::init();
/// tracing::info!("console started");
/// ```
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}

/// Initialize JSON-lines logging, suitable for log aggregation.
///
/// # Example
/// ```no_run
/// use surveylink_core::logging;
///
/// logging::init_json();
/// tracing::info!(mission_id = "m-1", "watching mission");
/// ```
pub fn init_json() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().json().with_target(true).with_thread_ids(true))
        .init();
}
