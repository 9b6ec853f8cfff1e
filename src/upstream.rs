//! HTTP client for the control-plane REST API
//!
//! Single attempt per call. Retrying is left to the next refresh cycle.

use bytes::Bytes;
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::debug;

use crate::config::UpstreamConfig;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, UpstreamError>;

/// Client bound to one control-plane base URL
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: Url,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let mut base = config.base_url.trim().to_string();
        // Url::join drops the last path segment unless the base ends with '/'
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| UpstreamError::InvalidUrl(format!("{}: {}", base, e)))?;

        let mut builder = Client::builder().user_agent(&config.user_agent);
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout.as_duration());
        }
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout.as_duration());
        }

        let client = builder
            .build()
            .map_err(|e| UpstreamError::RequestFailed(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// GET `{base_url}/{path}` with query parameters and return the body
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Bytes> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| UpstreamError::InvalidUrl(format!("{}: {}", path, e)))?;

        debug!(%url, "Upstream request");

        let response = self
            .client
            .get(url.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Timeout
                } else {
                    UpstreamError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout
            } else {
                UpstreamError::RequestFailed(format!("Failed to read body: {}", e))
            }
        })?;

        debug!(%url, size = bytes.len(), "Upstream response received");

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> UpstreamConfig {
        UpstreamConfig {
            base_url: base_url.to_string(),
            ..UpstreamConfig::default()
        }
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = UpstreamClient::new(&config("http://localhost:1024/spider")).unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:1024/spider/");
        assert_eq!(
            client.base_url().join("vmimage").unwrap().as_str(),
            "http://localhost:1024/spider/vmimage"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = UpstreamClient::new(&config("not a url"));
        assert!(matches!(result, Err(UpstreamError::InvalidUrl(_))));
    }
}
