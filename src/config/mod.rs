//! Configuration management for weatherfusion
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use weatherfusion::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `WEATHERFUSION__<section>__<key>`
//!
//! Examples:
//! - `WEATHERFUSION__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `WEATHERFUSION__PROVIDER__WIND_LEVEL=2000m`
//! - `WEATHERFUSION__RETENTION__DANGER_MAX_AGE_HOURS=12`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/weatherfusion.toml`.
//! This can be overridden using the `WEATHERFUSION_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

// Re-export public types
pub use models::{
    AcquisitionConfig, Config, ProviderConfig, RetentionConfig, ScheduleConfig, ServerConfig,
    TelemetryConfig,
};
pub use sources::config_path;
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Failed to render configuration: {0}")]
    RenderError(#[from] toml::ser::Error),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`WEATHERFUSION__*`)
    /// 2. TOML file (default: `config/weatherfusion.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file is malformed
    /// - Validation fails (bad cadence, URL scheme, intervals)
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
