//! Telemetry
//!
//! Installs the `tracing-subscriber` stack for the engine. Decision
//! records, branch degradation warnings, and retry diagnostics all flow
//! through `tracing`, so the subscriber goes up exactly once, after the
//! CLI flags and configuration have been resolved into an effective log
//! level. A `RUST_LOG` environment filter always wins over that level.
//!
//! Debug builds print pretty terminal output; release builds emit one JSON
//! object per line for log ingestion.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directives scoping `log_level` to the default layer and this
/// crate's own target
pub fn filter_directives(log_level: &str) -> String {
    format!("{},buyflow_engine={}", log_level, log_level)
}

/// Install the global subscriber at the given effective log level.
///
/// `RUST_LOG` overrides `log_level` when set. A second call is a no-op,
/// which keeps repeated initialization in tests harmless.
pub fn init_telemetry_with_level(log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(log_level)));

    #[cfg(debug_assertions)]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_target(false))
            .try_init()
            .ok();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
            .ok();
    }
}
