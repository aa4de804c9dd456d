//! Startup errors for the transport bootstrap.

use ivy_config::ConfigError;
use thiserror::Error;

/// Failure while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that was tried.
        addr: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Every port from the configured one upwards was in use.
    #[error("no free port at or above {start}")]
    PortsExhausted {
        /// The first port tried.
        start: u16,
    },

    /// The tracing subscriber could not be installed.
    #[error("failed to initialize logging: {0}")]
    Logging(String),

    /// Configuration was invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
