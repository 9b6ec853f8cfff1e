//! Connection enumeration
//!
//! The scheduler asks a [`ConnectionEnumerator`] which cloud connections exist at
//! the start of every cycle, then keeps only those whose name carries the
//! caching prefix.

mod upstream;

pub use upstream::UpstreamConnections;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::MetadataKind;

#[derive(Debug, Error)]
pub enum EnumerationError {
    #[error("Connection listing request failed: {0}")]
    Request(String),

    #[error("Connection listing returned HTTP {0}")]
    Status(u16),

    #[error("Connection listing could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EnumerationError>;

/// One external connection (account + region + driver)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConnectionDescriptor {
    pub name: String,
    #[serde(default)]
    pub provider: String,
    /// Explicit metadata kind; detected from the name when absent
    #[serde(default)]
    pub kind: Option<MetadataKind>,
}

impl ConnectionDescriptor {
    pub fn new(name: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            kind: None,
        }
    }

    pub fn metadata_kind(&self) -> MetadataKind {
        self.kind
            .or_else(|| MetadataKind::from_connection_name(&self.name))
            .unwrap_or_default()
    }

    /// Whether this connection takes part in caching
    pub fn participates(&self, prefix: &str) -> bool {
        self.name.starts_with(prefix)
    }
}

/// Source of the connections eligible for caching
#[async_trait]
pub trait ConnectionEnumerator: Send + Sync {
    async fn list(&self) -> Result<Vec<ConnectionDescriptor>>;
}

/// Fixed connection list, typically from `[[connections.entries]]`
#[derive(Debug, Clone, Default)]
pub struct StaticConnections {
    connections: Vec<ConnectionDescriptor>,
}

impl StaticConnections {
    pub fn new(connections: Vec<ConnectionDescriptor>) -> Self {
        Self { connections }
    }
}

#[async_trait]
impl ConnectionEnumerator for StaticConnections {
    async fn list(&self) -> Result<Vec<ConnectionDescriptor>> {
        Ok(self.connections.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_filter() {
        let cached = ConnectionDescriptor::new("mini:imageinfo:aws:ohio", "AWS");
        let plain = ConnectionDescriptor::new("aws-ohio-config", "AWS");

        assert!(cached.participates("mini:"));
        assert!(!plain.participates("mini:"));
    }

    #[test]
    fn test_explicit_kind_wins() {
        let mut descriptor = ConnectionDescriptor::new("mini:imageinfo:aws:ohio", "AWS");
        assert_eq!(descriptor.metadata_kind(), MetadataKind::Image);

        descriptor.kind = Some(MetadataKind::Spec);
        assert_eq!(descriptor.metadata_kind(), MetadataKind::Spec);
    }

    #[test]
    fn test_unknown_marker_defaults_to_image() {
        let descriptor = ConnectionDescriptor::new("mini:custom:azure:koreacentral", "AZURE");
        assert_eq!(descriptor.metadata_kind(), MetadataKind::Image);
    }

    #[tokio::test]
    async fn test_static_connections_list() {
        let connections = StaticConnections::new(vec![
            ConnectionDescriptor::new("mini:imageinfo:aws:ohio", "AWS"),
            ConnectionDescriptor::new("mini:specinfo:gcp:tokyo", "GCP"),
        ]);

        let listed = connections.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].metadata_kind(), MetadataKind::Spec);
    }
}
