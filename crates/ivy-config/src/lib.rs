//! Typed configuration system for Ivy.
//!
//! This crate provides a strongly-typed configuration for the Ivy server
//! bootstrap with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Overview
//!
//! The configuration is built around the [`IvyConfig`] struct:
//!
//! - [`AppConfig`] - Listener settings (`app.host`, `app.port`)
//! - [`LogConfig`] - Logging settings (level, format)
//!
//! # Example
//!
//! ```no_run
//! use ivy_config::{ConfigLoader, IvyConfig};
//!
//! # fn main() -> Result<(), ivy_config::ConfigError> {
//! // Load configuration with layered approach
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("config.toml")?
//!     .with_env_prefix("IVY")
//!     .load()?;
//!
//! println!("Server will listen on port {}", config.app.port);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [app]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! All configuration values can be overridden via environment variables using
//! the format `PREFIX__SECTION__KEY`. For example:
//!
//! - `IVY__APP__HOST=127.0.0.1`
//! - `IVY__APP__PORT=9000`
//! - `IVY__LOGGING__FORMAT=pretty`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
