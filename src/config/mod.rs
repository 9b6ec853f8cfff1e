//! Configuration management for warmcache
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. `WARMCACHE__<section>__<key>` environment variables
//! 4. `REFRESH_INTERVAL_SECONDS` / `MAX_WORKERS` (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use warmcache::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Refreshing every {}s", config.scheduler.refresh_interval_seconds);
//! ```
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/warmcache.toml`.
//! This can be overridden using the `WARMCACHE_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::HumanDuration;
pub use models::{
    CacheBackend, CacheConfig, Config, ConnectionSource, ConnectionsConfig, SchedulerConfig,
    ServerConfig, UpstreamConfig,
};
pub use sources::{MAX_WORKERS_VAR, OverrideError, REFRESH_INTERVAL_VAR};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Invalid environment override: {0}")]
    InvalidOverride(#[from] OverrideError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file is malformed
    /// - `REFRESH_INTERVAL_SECONDS` or `MAX_WORKERS` is not a number
    /// - Validation fails
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(sources::config_path())
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let mut config = sources::load_from_sources(path)?;
        sources::apply_overrides(&mut config, |key| std::env::var(key).ok())?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Validate a configuration built in code
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate(self)
    }
}
