//! Metadata fetchers
//!
//! A [`Fetcher`] returns a full snapshot of one connection's metadata as
//! serialized bytes. The worker writes those bytes to the cache store verbatim.

mod http;

pub use http::{HttpFetcher, ImageList, SpecList};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Fetch request failed: {0}")]
    Request(String),

    #[error("Fetch timed out")]
    Timeout,

    #[error("Upstream returned HTTP {0}")]
    Status(u16),

    #[error("Invalid metadata payload: {0}")]
    InvalidPayload(String),
}

pub type Result<T> = std::result::Result<T, FetchError>;

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the current metadata snapshot for `connection_id`
    async fn fetch(&self, connection_id: &str) -> Result<Bytes>;
}
