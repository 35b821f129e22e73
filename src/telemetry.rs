//! Tracing subscriber setup

use crate::config::ObservabilityConfig;
use crate::error::{AppError, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over `log_level`. Fails if a subscriber is already set.
pub fn init_tracing(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("docsys={}", config.log_level).into());

    let json = config
        .json_logs
        .then(|| tracing_subscriber::fmt::layer().json());
    let plain = (!config.json_logs).then(|| tracing_subscriber::fmt::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .try_init()
        .map_err(|e| AppError::Configuration(format!("Failed to install tracing subscriber: {}", e)))
}
