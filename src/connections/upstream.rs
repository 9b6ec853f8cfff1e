use async_trait::async_trait;
use serde::Deserialize;

use super::{ConnectionDescriptor, ConnectionEnumerator, EnumerationError, Result};
use crate::upstream::{UpstreamClient, UpstreamError};

const CONNECTION_CONFIG_PATH: &str = "connectionconfig";

#[derive(Debug, Deserialize)]
struct ConnectionConfigList {
    #[serde(rename = "connectionconfig", default)]
    connections: Vec<ConnectionConfigInfo>,
}

#[derive(Debug, Deserialize)]
struct ConnectionConfigInfo {
    #[serde(rename = "ConfigName")]
    config_name: String,
    #[serde(rename = "ProviderName", default)]
    provider_name: String,
}

/// Enumerates connections registered in the control plane
/// (`GET {base_url}/connectionconfig`)
#[derive(Debug, Clone)]
pub struct UpstreamConnections {
    client: UpstreamClient,
}

impl UpstreamConnections {
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

pub(crate) fn decode_connection_list(body: &[u8]) -> Result<Vec<ConnectionDescriptor>> {
    let list: ConnectionConfigList = serde_json::from_slice(body)?;
    Ok(list
        .connections
        .into_iter()
        .map(|info| ConnectionDescriptor::new(info.config_name, info.provider_name))
        .collect())
}

#[async_trait]
impl ConnectionEnumerator for UpstreamConnections {
    async fn list(&self) -> Result<Vec<ConnectionDescriptor>> {
        let body = self
            .client
            .get(CONNECTION_CONFIG_PATH, &[])
            .await
            .map_err(|e| match e {
                UpstreamError::Status(code) => EnumerationError::Status(code),
                other => EnumerationError::Request(other.to_string()),
            })?;

        let connections = decode_connection_list(&body)?;
        tracing::debug!(count = connections.len(), "Connections listed from upstream");
        Ok(connections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MetadataKind;

    #[test]
    fn test_decode_connection_list() {
        let body = br#"{
            "connectionconfig": [
                {"ConfigName": "mini:imageinfo:aws:ohio", "ProviderName": "AWS",
                 "DriverName": "aws-driver01", "CredentialName": "aws-cred01", "RegionName": "aws-ohio"},
                {"ConfigName": "gcp-tokyo-config", "ProviderName": "GCP"}
            ]
        }"#;

        let connections = decode_connection_list(body).unwrap();
        assert_eq!(connections.len(), 2);
        assert_eq!(connections[0].name, "mini:imageinfo:aws:ohio");
        assert_eq!(connections[0].provider, "AWS");
        assert_eq!(connections[0].metadata_kind(), MetadataKind::Image);
        assert!(!connections[1].participates("mini:"));
    }

    #[test]
    fn test_decode_empty_list() {
        let connections = decode_connection_list(br#"{"connectionconfig": []}"#).unwrap();
        assert!(connections.is_empty());
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = decode_connection_list(b"<html>oops</html>");
        assert!(matches!(result, Err(EnumerationError::Decode(_))));
    }
}
