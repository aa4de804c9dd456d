//! Structured logging bootstrap.
//!
//! Installs a global `tracing` subscriber from the `[logging]` section of
//! the configuration: JSON lines in production, pretty output in
//! development, filtered by an [`EnvFilter`] directive.
//!
//! # Example
//!
//! ```rust,ignore
//! use ivy_config::IvyConfig;
//! use ivy_server::logging::init_logging;
//!
//! let config = IvyConfig::development();
//! init_logging(&config.logging)?;
//!
//! tracing::info!(port = 8080, "Server starting");
//! ```

use ivy_config::{LogConfig, LogFormat};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::ServerError;

/// Installs the global subscriber described by `config`.
///
/// Does nothing when logging is disabled.
///
/// # Errors
///
/// Returns [`ServerError::Logging`] if the level is not a valid filter or a
/// global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), ServerError> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;

    match config.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_filter(filter);

            tracing_subscriber::registry()
                .with(fmt_layer)
                .try_init()
                .map_err(|e| ServerError::Logging(e.to_string()))?;
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_ansi(config.ansi_enabled)
                .with_target(true)
                .with_filter(filter);

            tracing_subscriber::registry()
                .with(fmt_layer)
                .try_init()
                .map_err(|e| ServerError::Logging(e.to_string()))?;
        }
    }

    Ok(())
}

/// Parses a level or filter directive (`info`, `ivy=debug,hyper=warn`).
///
/// # Errors
///
/// Returns [`ServerError::Logging`] if the directive is invalid.
pub fn create_env_filter(filter: &str) -> Result<EnvFilter, ServerError> {
    EnvFilter::try_new(filter).map_err(|e| ServerError::Logging(format!("Invalid log level: {e}")))
}
