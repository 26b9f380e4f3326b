//! Tracing subscriber setup

use crate::config::{LogFormat, LoggingConfig};
use crate::utils::error::{GatewayError, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber configured by `config`
///
/// `RUST_LOG` takes precedence over `config.level`. Returns `Ok(false)` when
/// a global subscriber was already installed, so calling this more than once
/// is harmless.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            GatewayError::Config(format!("Invalid log level '{}': {}", config.level, e))
        })?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .with_thread_ids(false);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init().is_ok(),
        LogFormat::Text => builder.try_init().is_ok(),
    };

    if installed {
        debug!(level = %config.level, format = ?config.format, "Tracing initialized");
    }
    Ok(installed)
}
