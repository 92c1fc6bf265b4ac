//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Pick the filter from `RUST_LOG` or the configured level
//! - Switch between pretty and JSON output

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Build the filter: `RUST_LOG` wins, then the configured directive.
///
/// A bare level such as `debug` is scoped to this crate so dependencies
/// (rumqttc, hyper) stay at `warn`.
pub fn build_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = config.log_level.trim();
        let directive = if level.contains('=') || level.contains(',') {
            level.to_string()
        } else {
            format!("warn,mqtt_http_bridge={},bridge_cli={}", level, level)
        };
        EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn,mqtt_http_bridge=info"))
    })
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging(config: &ObservabilityConfig) {
    let registry = tracing_subscriber::registry().with(build_filter(config));

    let result = if config.log_format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
