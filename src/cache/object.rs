use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::{ObjectStore, PutPayload, path::Path as ObjectPath};

use super::{CacheStore, Result};

const SNAPSHOT_PREFIX: &str = "snapshots";

/// Snapshot cache on top of any `object_store` backend
#[derive(Clone)]
pub struct ObjectCacheStore {
    store: Arc<dyn ObjectStore>,
}

impl ObjectCacheStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// In-memory store for tests and throwaway runs
    pub fn in_memory() -> Self {
        Self::new(Arc::new(object_store::memory::InMemory::new()))
    }

    /// Files under `root`, one per connection
    pub fn local<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        let store = object_store::local::LocalFileSystem::new_with_prefix(root)?;
        Ok(Self::new(Arc::new(store)))
    }

    fn object_path(key: &str) -> ObjectPath {
        ObjectPath::from_iter([SNAPSHOT_PREFIX, key])
    }

    pub async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        match self.store.get(&Self::object_path(key)).await {
            Ok(result) => Ok(Some(result.bytes().await?)),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl CacheStore for ObjectCacheStore {
    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        let size = value.len();
        self.store
            .put(&Self::object_path(key), PutPayload::from(value))
            .await?;

        tracing::debug!(key, size, "Snapshot stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_in_memory_overwrite() {
        let store = ObjectCacheStore::in_memory();

        store.set("mini:specinfo:gcp:tokyo", Bytes::from_static(b"v1")).await.unwrap();
        store.set("mini:specinfo:gcp:tokyo", Bytes::from_static(b"v2")).await.unwrap();

        let value = store.get("mini:specinfo:gcp:tokyo").await.unwrap().unwrap();
        assert_eq!(value.as_ref(), b"v2");
    }

    #[tokio::test]
    async fn test_missing_key() {
        let store = ObjectCacheStore::in_memory();
        assert!(store.get("absent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_local_filesystem() {
        let temp_dir = TempDir::new().unwrap();
        let store = ObjectCacheStore::local(temp_dir.path().join("snapshots")).unwrap();

        store.set("mini:imageinfo:aws:ohio", Bytes::from_static(b"{}")).await.unwrap();
        let value = store.get("mini:imageinfo:aws:ohio").await.unwrap().unwrap();
        assert_eq!(value.as_ref(), b"{}");
    }
}
