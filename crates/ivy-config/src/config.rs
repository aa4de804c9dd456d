//! Main configuration types.
//!
//! This module provides the top-level [`IvyConfig`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{AppConfig, ConfigError, LogConfig, LogFormat};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Complete Ivy configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use ivy_config::IvyConfig;
///
/// let config = IvyConfig::default();
/// assert_eq!(config.app.host, "");
/// assert_eq!(config.app.port, 0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct IvyConfig {
    /// Listener configuration.
    #[serde(default)]
    pub app: AppConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LogConfig,
}

impl IvyConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use ivy_config::{AppConfig, IvyConfig};
    ///
    /// let config = IvyConfig::builder()
    ///     .app(AppConfig {
    ///         host: "127.0.0.1".to_string(),
    ///         port: 3000,
    ///     })
    ///     .build();
    ///
    /// assert_eq!(config.app.port, 3000);
    /// ```
    #[must_use]
    pub fn builder() -> IvyConfigBuilder {
        IvyConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The host contains whitespace
    /// - The log level is empty, or a bare level other than
    ///   trace/debug/info/warn/error
    pub fn validate(&self) -> Result<(), ConfigError> {
        let host = self.app.host.trim();
        if host.chars().any(char::is_whitespace) {
            return Err(ConfigError::invalid_value(
                "app.host",
                format!("invalid host: {host}"),
            ));
        }

        let level = self.logging.level.trim();
        if level.is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }

        // Filter directives (`ivy=debug`) are checked by the subscriber.
        let is_directive = level.contains('=') || level.contains(',');
        if !is_directive && !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("unknown level: {level}"),
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Pretty, colored logs at debug level, bound to localhost.
    ///
    /// # Example
    ///
    /// ```
    /// use ivy_config::IvyConfig;
    ///
    /// let config = IvyConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.app.host = "127.0.0.1".to_string();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config
    }

    /// Create a production configuration preset.
    ///
    /// JSON logs at info level.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi_enabled = false;
        config
    }
}

/// Builder for [`IvyConfig`].
#[derive(Debug, Default)]
pub struct IvyConfigBuilder {
    app: Option<AppConfig>,
    logging: Option<LogConfig>,
}

impl IvyConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listener configuration.
    #[must_use]
    pub fn app(mut self, app: AppConfig) -> Self {
        self.app = Some(app);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LogConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> IvyConfig {
        IvyConfig {
            app: self.app.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(IvyConfig::default().validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let dev = IvyConfig::development();
        assert_eq!(dev.logging.format, LogFormat::Pretty);
        assert_eq!(dev.app.host, "127.0.0.1");

        let prod = IvyConfig::production();
        assert_eq!(prod.logging.format, LogFormat::Json);
        assert!(prod.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_host() {
        let mut config = IvyConfig::default();
        config.app.host = "local host".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "app.host"
        ));
    }

    #[test]
    fn test_validate_log_levels() {
        let mut config = IvyConfig::default();

        config.logging.level = "WARN".to_string();
        assert!(config.validate().is_ok());

        config.logging.level = "ivy=debug,hyper=warn".to_string();
        assert!(config.validate().is_ok());

        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        config.logging.level = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let config = IvyConfig::builder().build();
        assert_eq!(config, IvyConfig::default());
    }
}
