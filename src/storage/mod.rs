//! Artifact storage for decoded geometry and wind direction images
//! Uses Apache Arrow object_store crate
//!
//! Writes go through a temporary key first. The caller commits the temporary
//! object under the final record id once the ledger insert succeeded, or
//! discards it when the insert failed.

use bytes::Bytes;
use object_store::{
    ObjectStore, local::LocalFileSystem, memory::InMemory, path::Path as StoragePath,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to prepare artifact directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Object store error: {0}")]
    ObjectStoreError(#[from] object_store::Error),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

const TEMP_PREFIX: &str = "tmp";

/// Artifact format, determines the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// GeoJSON feature collection
    Geometry,
    /// Raw PNG passthrough
    Image,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Geometry => "json",
            ArtifactKind::Image => "png",
        }
    }

    pub fn content_type(&self) -> mime::Mime {
        match self {
            ArtifactKind::Geometry => mime::APPLICATION_JSON,
            ArtifactKind::Image => mime::IMAGE_PNG,
        }
    }

    /// Final key for the artifact of a record
    pub fn key(&self, id: &str) -> String {
        format!("{}.{}", id, self.extension())
    }
}

/// Artifact written under a temporary key, not yet visible by record id
#[derive(Debug)]
#[must_use = "pending artifacts must be committed or discarded"]
pub struct PendingArtifact {
    key: String,
    kind: ArtifactKind,
    size: usize,
}

impl PendingArtifact {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

/// Artifact store wrapping object_store
#[derive(Clone)]
pub struct ArtifactStore {
    store: Arc<dyn ObjectStore>,
}

impl ArtifactStore {
    /// Create new artifact store with any object_store backend
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Store artifacts as files under `dir`, creating it if needed
    pub fn local<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let store = LocalFileSystem::new_with_prefix(dir)?;
        tracing::info!(dir = %dir.display(), "Opened artifact directory");
        Ok(Self::new(Arc::new(store)))
    }

    /// Create in-memory storage for testing/development
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()))
    }

    /// Write bytes under a fresh temporary key
    pub async fn write_temp(&self, kind: ArtifactKind, data: Bytes) -> Result<PendingArtifact> {
        let key = format!("{}/{}.{}", TEMP_PREFIX, Uuid::new_v4(), kind.extension());
        let size = data.len();

        self.store
            .put(&StoragePath::from(key.as_str()), data.into())
            .await?;

        tracing::debug!(key, size, "Wrote temporary artifact");
        Ok(PendingArtifact { key, kind, size })
    }

    /// Move a pending artifact to its final key for record `id`
    pub async fn commit(&self, pending: PendingArtifact, id: &str) -> Result<String> {
        let key = pending.kind.key(id);
        self.store
            .rename(
                &StoragePath::from(pending.key.as_str()),
                &StoragePath::from(key.as_str()),
            )
            .await?;

        tracing::debug!(key, size = pending.size, "Committed artifact");
        Ok(key)
    }

    /// Drop a pending artifact that will never be committed
    pub async fn discard(&self, pending: PendingArtifact) -> Result<()> {
        match self
            .store
            .delete(&StoragePath::from(pending.key.as_str()))
            .await
        {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the artifact of record `id`
    pub async fn read(&self, kind: ArtifactKind, id: &str) -> Result<Bytes> {
        let key = kind.key(id);
        match self.store.get(&StoragePath::from(key.as_str())).await {
            Ok(result) => Ok(result.bytes().await?),
            Err(object_store::Error::NotFound { .. }) => Err(StorageError::NotFound(key)),
            Err(e) => Err(e.into()),
        }
    }

    /// Check if the artifact of record `id` exists
    pub async fn exists(&self, kind: ArtifactKind, id: &str) -> Result<bool> {
        let path = StoragePath::from(kind.key(id));

        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the artifact of record `id`; returns false if it was missing
    pub async fn delete(&self, kind: ArtifactKind, id: &str) -> Result<bool> {
        let path = StoragePath::from(kind.key(id));

        // LocalFileSystem reports missing files on delete, InMemory does not
        if !self.exists(kind, id).await? {
            return Ok(false);
        }
        match self.store.delete(&path).await {
            Ok(()) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_commit_moves_temp_to_final_key() {
        let store = ArtifactStore::in_memory();
        let pending = store
            .write_temp(ArtifactKind::Geometry, Bytes::from_static(b"{}"))
            .await
            .unwrap();
        assert!(pending.key().starts_with("tmp/"));
        assert!(pending.key().ends_with(".json"));
        assert_eq!(pending.size(), 2);

        let key = store.commit(pending, "abc").await.unwrap();
        assert_eq!(key, "abc.json");
        assert!(store.exists(ArtifactKind::Geometry, "abc").await.unwrap());
        assert_eq!(
            store.read(ArtifactKind::Geometry, "abc").await.unwrap(),
            Bytes::from_static(b"{}")
        );
    }

    #[tokio::test]
    async fn test_discard_leaves_nothing() {
        let store = ArtifactStore::in_memory();
        let pending = store
            .write_temp(ArtifactKind::Image, Bytes::from_static(b"png"))
            .await
            .unwrap();
        store.discard(pending).await.unwrap();
        assert!(!store.exists(ArtifactKind::Image, "abc").await.unwrap());
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let store = ArtifactStore::in_memory();
        let err = store.read(ArtifactKind::Geometry, "missing").await;
        assert!(matches!(err, Err(StorageError::NotFound(key)) if key == "missing.json"));
    }

    #[tokio::test]
    async fn test_delete_missing_returns_false() {
        let store = ArtifactStore::in_memory();
        assert!(!store.delete(ArtifactKind::Geometry, "missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_local_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::local(temp_dir.path().join("artifacts")).unwrap();

        let pending = store
            .write_temp(ArtifactKind::Image, Bytes::from_static(b"\x89PNG"))
            .await
            .unwrap();
        store.commit(pending, "wind1").await.unwrap();

        assert!(temp_dir.path().join("artifacts/wind1.png").exists());
        assert!(store.delete(ArtifactKind::Image, "wind1").await.unwrap());
        assert!(!store.delete(ArtifactKind::Image, "wind1").await.unwrap());
        assert!(!temp_dir.path().join("artifacts/wind1.png").exists());
    }

    #[test]
    fn test_content_types() {
        assert_eq!(ArtifactKind::Geometry.content_type(), mime::APPLICATION_JSON);
        assert_eq!(ArtifactKind::Image.content_type(), mime::IMAGE_PNG);
    }
}
