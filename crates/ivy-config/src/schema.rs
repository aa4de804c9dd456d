//! Configuration section types.
//!
//! Each section is a strict serde struct: unknown keys are rejected so that
//! typos in a configuration file fail loudly at startup.

use serde::{Deserialize, Serialize};

/// Listener configuration.
///
/// An empty `host` listens on all interfaces; port `0` asks the operating
/// system for an ephemeral port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Interface to bind (empty for all interfaces).
    #[serde(default)]
    pub host: String,

    /// Port to bind; the server moves to the next port while it is taken.
    #[serde(default)]
    pub port: u16,
}

impl AppConfig {
    /// Returns the host to bind, mapping an empty host to `0.0.0.0`.
    #[must_use]
    pub fn bind_host(&self) -> &str {
        if self.host.trim().is_empty() {
            "0.0.0.0"
        } else {
            self.host.trim()
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive (`info`, `ivy=debug,hyper=warn`, ...).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
