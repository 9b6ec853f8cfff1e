use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use tracing::{debug, info};

use super::{CacheStore, Result};

const SNAPSHOTS_PARTITION: &str = "snapshots";

/// Fjall-backed snapshot cache
///
/// One partition, `snapshots`: connection id (UTF-8) -> serialized snapshot.
#[derive(Clone)]
pub struct FjallCacheStore {
    keyspace: Keyspace,
    snapshots: PartitionHandle,
}

impl FjallCacheStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening Fjall cache store at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;
        let snapshots = keyspace.open_partition(SNAPSHOTS_PARTITION, PartitionCreateOptions::default())?;

        Ok(Self { keyspace, snapshots })
    }

    pub fn get(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self
            .snapshots
            .get(key.as_bytes())?
            .map(|value| Bytes::copy_from_slice(&value)))
    }

    /// Number of cached snapshots
    pub fn len(&self) -> Result<usize> {
        let mut count = 0;
        for item in self.snapshots.iter() {
            item?;
            count += 1;
        }
        Ok(count)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.snapshots.is_empty()?)
    }

    /// Persist all pending writes to disk
    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for FjallCacheStore {
    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        let size = value.len();
        self.snapshots.insert(key.as_bytes(), &value[..])?;
        debug!(key, size, "Snapshot stored");
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.persist()
    }
}
