//! Configuration management for SearchEngine
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use searchengine::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Backend: {}", config.api.base_url);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `SEARCHENGINE__<section>__<key>`
//!
//! Examples:
//! - `SEARCHENGINE__API__BASE_URL=https://metal.example.com/api`
//! - `SEARCHENGINE__SEARCH__DEBOUNCE=500ms`
//!
//! Credentials are only read from `SEARCHENGINE_API_KEY`,
//! `SEARCHENGINE_API_USERNAME` and `SEARCHENGINE_API_PASSWORD`.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/searchengine.toml`.
//! This can be overridden using the `SEARCHENGINE_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

// Re-export public types
pub use crate::humanize::HumanDuration;
pub use models::{ApiConfig, Config, SearchConfig, StorageConfig, TelemetryConfig};
pub use validation::{MAX_DEBOUNCE, ValidationError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`SEARCHENGINE__*`)
    /// 2. TOML file (default: `config/searchengine.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file is malformed
    /// - Validation fails (bad base URL, missing API key, etc.)
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path, still applying environment secrets
    pub fn load_with_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_with_secrets(path)?;
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
}
