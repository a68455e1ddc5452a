//! Local file system blob store factories.
//!
//! `LocalFileSystemFactory` stores uploaded files under a configured
//! root directory. `TemporaryFileSystemFactory` creates the root in a
//! temporary location that is cleaned up when the factory is dropped,
//! which is what dev mode and the tests use.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use object_store::{Error as ObjectStoreError, ObjectStore, local::LocalFileSystem};
use tempfile::TempDir;

use crate::BlobStoreFactory;

/// Factory for blob stores backed by a directory on the local file
/// system.
pub struct LocalFileSystemFactory {
    root_path: PathBuf,
}

impl LocalFileSystemFactory {
    pub fn new(root_path: impl AsRef<Path>) -> Result<Self, ObjectStoreError> {
        let canonical_path =
            std::fs::canonicalize(root_path.as_ref()).map_err(|e| ObjectStoreError::Generic {
                store: "LocalFileSystem",
                source: Box::new(e),
            })?;

        Ok(Self {
            root_path: canonical_path,
        })
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

#[async_trait::async_trait]
impl BlobStoreFactory for LocalFileSystemFactory {
    async fn create_blob_store(&self) -> Result<Arc<dyn ObjectStore>, ObjectStoreError> {
        let local_fs = LocalFileSystem::new_with_prefix(&self.root_path)?;
        Ok(Arc::new(local_fs))
    }
}

/// Factory for blob stores backed by a temporary directory.
///
/// The directory is removed when the factory is dropped, so nothing is
/// persisted beyond the process. Ideal for development and testing.
pub struct TemporaryFileSystemFactory {
    _temp_dir: TempDir,
    local_factory: LocalFileSystemFactory,
}

impl TemporaryFileSystemFactory {
    pub fn new() -> Result<Self, ObjectStoreError> {
        let temp_dir = TempDir::new().map_err(|e| ObjectStoreError::Generic {
            store: "TemporaryFileSystem",
            source: Box::new(e),
        })?;

        let local_factory = LocalFileSystemFactory::new(temp_dir.path())?;

        Ok(Self {
            _temp_dir: temp_dir,
            local_factory,
        })
    }

    pub fn root_path(&self) -> &Path {
        self.local_factory.root_path()
    }
}

#[async_trait::async_trait]
impl BlobStoreFactory for TemporaryFileSystemFactory {
    async fn create_blob_store(&self) -> Result<Arc<dyn ObjectStore>, ObjectStoreError> {
        self.local_factory.create_blob_store().await
    }
}
