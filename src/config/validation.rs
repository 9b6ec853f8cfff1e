use super::models::{Config, ConnectionSource};
use reqwest::Url;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("max_workers must be at least 1")]
    NoWorkers,

    #[error("refresh_interval_seconds must be positive")]
    ZeroRefreshInterval,

    #[error("connection_prefix must not be empty")]
    EmptyConnectionPrefix,

    #[error("Invalid upstream base_url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Static connection source has no entries")]
    NoStaticConnections,

    #[error("Duplicate static connection '{0}'")]
    DuplicateConnection(String),

    #[error("Static connection name must not be blank")]
    BlankConnectionName,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_scheduler(config)?;
    validate_upstream(config)?;
    validate_connections(config)?;
    Ok(())
}

fn validate_scheduler(config: &Config) -> Result<(), ValidationError> {
    if config.scheduler.max_workers == 0 {
        return Err(ValidationError::NoWorkers);
    }

    if config.scheduler.refresh_interval_seconds == 0 {
        return Err(ValidationError::ZeroRefreshInterval);
    }

    if config.scheduler.connection_prefix.is_empty() {
        return Err(ValidationError::EmptyConnectionPrefix);
    }

    Ok(())
}

fn validate_upstream(config: &Config) -> Result<(), ValidationError> {
    let url = &config.upstream.base_url;
    let parsed = Url::parse(url).map_err(|e| ValidationError::InvalidBaseUrl {
        url: url.clone(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::InvalidBaseUrl {
            url: url.clone(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    Ok(())
}

fn validate_connections(config: &Config) -> Result<(), ValidationError> {
    if config.connections.source != ConnectionSource::Static {
        return Ok(());
    }

    if config.connections.entries.is_empty() {
        return Err(ValidationError::NoStaticConnections);
    }

    let mut seen = HashSet::new();
    for entry in &config.connections.entries {
        if entry.name.trim().is_empty() {
            return Err(ValidationError::BlankConnectionName);
        }
        if !seen.insert(entry.name.as_str()) {
            return Err(ValidationError::DuplicateConnection(entry.name.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connections::ConnectionDescriptor;

    fn static_config() -> Config {
        let mut config = Config::default();
        config.connections.source = ConnectionSource::Static;
        config.connections.entries = vec![
            ConnectionDescriptor::new("mini:imageinfo:aws:ohio", "AWS"),
            ConnectionDescriptor::new("mini:imageinfo:gcp:tokyo", "GCP"),
        ];
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&Config::default()).is_ok());
        assert!(validate(&static_config()).is_ok());
    }

    #[test]
    fn test_zero_workers() {
        let mut config = Config::default();
        config.scheduler.max_workers = 0;

        assert!(matches!(validate(&config), Err(ValidationError::NoWorkers)));
    }

    #[test]
    fn test_zero_interval() {
        let mut config = Config::default();
        config.scheduler.refresh_interval_seconds = 0;

        assert!(matches!(
            validate(&config),
            Err(ValidationError::ZeroRefreshInterval)
        ));
    }

    #[test]
    fn test_empty_prefix() {
        let mut config = Config::default();
        config.scheduler.connection_prefix.clear();

        assert!(matches!(
            validate(&config),
            Err(ValidationError::EmptyConnectionPrefix)
        ));
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = Config::default();
        config.upstream.base_url = "spider:1024".to_string();
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidBaseUrl { .. })
        ));

        config.upstream.base_url = "ftp://spider/spider".to_string();
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_static_source_needs_entries() {
        let mut config = static_config();
        config.connections.entries.clear();

        assert!(matches!(
            validate(&config),
            Err(ValidationError::NoStaticConnections)
        ));
    }

    #[test]
    fn test_duplicate_static_entries() {
        let mut config = static_config();
        config
            .connections
            .entries
            .push(ConnectionDescriptor::new("mini:imageinfo:aws:ohio", "AWS"));

        assert!(matches!(
            validate(&config),
            Err(ValidationError::DuplicateConnection(name)) if name == "mini:imageinfo:aws:ohio"
        ));
    }
}
