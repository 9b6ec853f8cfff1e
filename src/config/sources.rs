use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

const CONFIG_ENV_VAR: &str = "WARMCACHE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/warmcache.toml";
const ENV_PREFIX: &str = "WARMCACHE";
const ENV_SEPARATOR: &str = "__";

pub const REFRESH_INTERVAL_VAR: &str = "REFRESH_INTERVAL_SECONDS";
pub const MAX_WORKERS_VAR: &str = "MAX_WORKERS";

#[derive(Debug, Error)]
#[error("Invalid value for {var}: '{value}'")]
pub struct OverrideError {
    pub var: &'static str,
    pub value: String,
}

/// Resolve the configuration file path (`WARMCACHE_CONFIG` or the default)
pub fn config_path() -> PathBuf {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration from a specific path and `WARMCACHE__*` environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    // Defaults are handled by struct Default implementations
    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // WARMCACHE__SCHEDULER__MAX_WORKERS -> scheduler.max_workers
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

/// Apply the bare operational variables on top of everything else
///
/// `lookup` is `std::env::var` in production; tests pass a map.
pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<(), OverrideError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(REFRESH_INTERVAL_VAR) {
        config.scheduler.refresh_interval_seconds =
            value.trim().parse().map_err(|_| OverrideError {
                var: REFRESH_INTERVAL_VAR,
                value: value.clone(),
            })?;
    }

    if let Some(value) = lookup(MAX_WORKERS_VAR) {
        config.scheduler.max_workers = value.trim().parse().map_err(|_| OverrideError {
            var: MAX_WORKERS_VAR,
            value: value.clone(),
        })?;
    }

    Ok(())
}
