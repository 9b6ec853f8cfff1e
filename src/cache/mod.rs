//! Cache stores for fetched metadata snapshots
//!
//! The scheduler only ever writes: each successful fetch overwrites the whole
//! snapshot stored under the connection id. Reads belong to whoever serves the
//! cached data; the inherent `get` methods on the concrete stores exist for
//! inspection and tests.
//!
//! Backends:
//! - [`FjallCacheStore`] - embedded LSM keyspace on local disk (default)
//! - [`ObjectCacheStore`] - any `object_store` backend (in-memory, local filesystem)

mod keyspace;
mod object;

pub use keyspace::FjallCacheStore;
pub use object::ObjectCacheStore;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Write side of the metadata cache
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Overwrite the value stored under `key`
    async fn set(&self, key: &str, value: Bytes) -> Result<()>;

    /// Make every completed `set` durable
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}
