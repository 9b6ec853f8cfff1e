//! Control-plane backed fetcher

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{FetchError, Fetcher, Result};
use crate::registry::MetadataKind;
use crate::upstream::{UpstreamClient, UpstreamError};

/// `GET /vmimage` response body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageList {
    pub image: Vec<serde_json::Value>,
}

/// `GET /vmspec` response body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpecList {
    pub vmspec: Vec<serde_json::Value>,
}

/// Fetches image or spec listings for a connection from the control plane
///
/// The metadata kind is taken from the explicit kinds given to
/// [`HttpFetcher::with_kinds`], falling back to the connection name. The
/// response body is validated and then passed through unchanged, so cache
/// readers see exactly the shape the control plane serves.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: UpstreamClient,
    kinds: HashMap<String, MetadataKind>,
}

impl HttpFetcher {
    pub fn new(client: UpstreamClient) -> Self {
        Self {
            client,
            kinds: HashMap::new(),
        }
    }

    /// Pin the kind of specific connections, e.g. from configured entries
    pub fn with_kinds<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = (String, MetadataKind)>,
    {
        self.kinds.extend(kinds);
        self
    }

    pub fn kind_of(&self, connection_id: &str) -> MetadataKind {
        self.kinds
            .get(connection_id)
            .copied()
            .or_else(|| MetadataKind::from_connection_name(connection_id))
            .unwrap_or_default()
    }
}

fn endpoint_for(kind: MetadataKind) -> &'static str {
    match kind {
        MetadataKind::Image => "vmimage",
        MetadataKind::Spec => "vmspec",
    }
}

/// Reject bodies that do not carry the list expected for `kind`
pub(crate) fn validate_payload(kind: MetadataKind, body: &[u8]) -> Result<usize> {
    let items = match kind {
        MetadataKind::Image => serde_json::from_slice::<ImageList>(body).map(|l| l.image.len()),
        MetadataKind::Spec => serde_json::from_slice::<SpecList>(body).map(|l| l.vmspec.len()),
    };
    items.map_err(|e| FetchError::InvalidPayload(e.to_string()))
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, connection_id: &str) -> Result<Bytes> {
        let kind = self.kind_of(connection_id);

        let body = self
            .client
            .get(endpoint_for(kind), &[("ConnectionName", connection_id)])
            .await
            .map_err(|e| match e {
                UpstreamError::Timeout => FetchError::Timeout,
                UpstreamError::Status(code) => FetchError::Status(code),
                other => FetchError::Request(other.to_string()),
            })?;

        let items = validate_payload(kind, &body)?;
        debug!(connection_id, %kind, items, size = body.len(), "Metadata fetched");

        Ok(body)
    }
}
