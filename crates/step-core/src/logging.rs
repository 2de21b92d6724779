//! Tracing subscriber setup

use crate::config::FrameworkConfig;
use crate::error::{CoreError, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `filter`. Logs go to stderr so command
/// output on stdout stays machine-readable.
///
/// # Errors
/// Returns error if the filter is invalid or a subscriber is already installed
pub fn init_logging(filter: &str, json: bool) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(env_filter) => env_filter,
        Err(_) => EnvFilter::try_new(filter)
            .map_err(|e| CoreError::Config(format!("invalid log filter '{filter}': {e}")))?,
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = if json {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
    };
    installed.map_err(|e| CoreError::Config(format!("logging already initialized: {e}")))?;

    tracing::debug!(filter, json, "logging initialized");
    Ok(())
}

/// Install the global tracing subscriber from configuration
///
/// # Errors
/// Returns error if the filter is invalid or a subscriber is already installed
pub fn init_logging_from(config: &FrameworkConfig) -> Result<()> {
    init_logging(&config.log_filter, config.json_logs)
}
