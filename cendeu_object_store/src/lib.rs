//! Blob store factory for creating ObjectStore instances from runtime
//! configuration.
//!
//! Components never construct a vendor storage client themselves: they
//! receive a [`BlobStoreFactory`] and ask it for an `ObjectStore` when
//! they need one. An implementation may resolve credentials from the
//! environment or an external vault; the ones provided here are backed
//! by the local file system for development and testing.

pub mod local;
pub mod paths;

use std::sync::Arc;

use object_store::ObjectStore;

pub use local::{LocalFileSystemFactory, TemporaryFileSystemFactory};
pub use paths::format_blob_key;

/// Factory trait for creating ObjectStore instances for uploaded ledger
/// files.
#[async_trait::async_trait]
pub trait BlobStoreFactory: Send + Sync {
    /// Create an ObjectStore client for the upload bucket.
    async fn create_blob_store(&self) -> Result<Arc<dyn ObjectStore>, object_store::Error>;
}
