//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, IvyConfig, LogFormat};

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use ivy_config::ConfigLoader;
///
/// # fn main() -> Result<(), ivy_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("config.toml")?
///     .with_env_prefix("IVY")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: IvyConfig,
    env_prefix: Option<String>,
    file_loaded: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    ///
    /// # Example
    ///
    /// ```
    /// use ivy_config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::new();
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: IvyConfig::default(),
            env_prefix: None,
            file_loaded: false,
        }
    }

    /// Start with default configuration values.
    ///
    /// This is called automatically by `new()`, but can be chained for clarity.
    ///
    /// # Example
    ///
    /// ```
    /// use ivy_config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::new().with_defaults();
    /// ```
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = IvyConfig::default();
        self
    }

    /// Start with development preset configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use ivy_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = IvyConfig::development();
        self
    }

    /// Start with production preset configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use ivy_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_production()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.logging.format, ivy_config::LogFormat::Json);
    /// ```
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = IvyConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// Supports TOML (.toml) and JSON (.json) formats.
    /// The file format is determined by the file extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields (strict mode)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ivy_config::ConfigLoader;
    ///
    /// # fn main() -> Result<(), ivy_config::ConfigError> {
    /// let loader = ConfigLoader::new()
    ///     .with_file("config.toml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::read_error(path, e))?;

        let file_config = Self::parse_file(&content, path)?;
        self.merge_config(file_config);
        self.file_loaded = true;

        Ok(self)
    }

    /// Load configuration from an optional file.
    ///
    /// If the file exists, loads it. If not, silently continues.
    /// This is useful for optional configuration files.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but:
    /// - Cannot be read
    /// - Contains invalid TOML/JSON
    /// - Contains unknown fields
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ivy_config::ConfigLoader;
    ///
    /// # fn main() -> Result<(), ivy_config::ConfigError> {
    /// let loader = ConfigLoader::new()
    ///     .with_optional_file("config.toml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Returns true once a configuration file was merged in.
    #[must_use]
    pub const fn file_loaded(&self) -> bool {
        self.file_loaded
    }

    /// Load configuration from a string.
    ///
    /// # Arguments
    ///
    /// * `content` - Configuration content as a string
    /// * `format` - File format ("toml" or "json")
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use ivy_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [app]
    ///     host = "127.0.0.1"
    ///     port = 3000
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.app.port, 3000);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let file_config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };

        self.merge_config(file_config);
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`.
    /// For example, with prefix "IVY":
    /// - `IVY__APP__HOST=0.0.0.0`
    /// - `IVY__APP__PORT=9000`
    ///
    /// # Example
    ///
    /// ```
    /// use ivy_config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::new()
    ///     .with_env_prefix("IVY");
    /// ```
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file for environment variables.
    ///
    /// Uses the `dotenvy` crate to load variables from a file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or
    /// parsed. A missing file is not an error.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ivy_config::ConfigLoader;
    ///
    /// # fn main() -> Result<(), ivy_config::ConfigError> {
    /// let loader = ConfigLoader::new()
    ///     .with_dotenv()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        dotenv_result(".env", dotenvy::dotenv().map(drop))?;
        Ok(self)
    }

    /// Load environment variables from a specific dotenv file.
    ///
    /// # Errors
    ///
    /// Same as [`with_dotenv`](Self::with_dotenv).
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        dotenv_result(path, dotenvy::from_path(path))?;
        Ok(self)
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment variable overrides (if a prefix was set) and
    /// validates the final configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Environment variable parsing fails
    /// - Configuration validation fails
    ///
    /// # Example
    ///
    /// ```
    /// use ivy_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.app.port, 0);
    /// ```
    pub fn load(mut self) -> Result<IvyConfig, ConfigError> {
        // Apply environment variable overrides
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        // Validate the final configuration
        self.config.validate()?;

        Ok(self.config)
    }

    /// Finalize without validation.
    ///
    /// Use this if you want to inspect or modify the configuration
    /// before validation.
    ///
    /// # Example
    ///
    /// ```
    /// use ivy_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .load_unvalidated();
    ///
    /// // Modify and validate later
    /// let _ = config.validate();
    /// ```
    #[must_use]
    pub fn load_unvalidated(self) -> IvyConfig {
        self.config
    }

    // Parse configuration file based on extension
    fn parse_file(content: &str, path: &Path) -> Result<IvyConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    // Merge file config into current config
    fn merge_config(&mut self, file_config: IvyConfig) {
        // Sections missing from the file were already filled by serde defaults.
        self.config = file_config;
    }

    // Apply environment variable overrides
    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let env_vars: HashMap<String, String> = env::vars()
            .filter(|(k, _)| k.starts_with(prefix))
            .collect();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    // Apply a single environment variable
    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        // Remove prefix and split by double underscore
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();

        match parts.as_slice() {
            // App section
            ["APP", "HOST"] => {
                self.config.app.host = value.to_string();
            }
            ["APP", "PORT"] => {
                self.config.app.port = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected port number"))?;
            }

            // Logging section
            ["LOGGING", "ENABLED"] => {
                self.config.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "ANSI_ENABLED"] => {
                self.config.logging.ansi_enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            // Unknown key - ignore
            _ => {}
        }

        Ok(())
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn dotenv_result(path: impl AsRef<Path>, result: dotenvy::Result<()>) -> Result<(), ConfigError> {
    match result {
        Ok(()) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(dotenvy::Error::Io(source)) => Err(ConfigError::read_error(path.as_ref(), source)),
        Err(err) => Err(ConfigError::env_parse_error(
            path.as_ref().display().to_string(),
            err.to_string(),
        )),
    }
}
