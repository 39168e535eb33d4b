//! Object storage abstraction.
//!
//! The upload handler only ever needs one operation: write a blob under `(bucket, key)` and get
//! back the content digest the backend assigned. [`ObjectStorage`] captures exactly that, so the
//! real S3 client and the in-process store are interchangeable behind an `Arc<dyn ObjectStorage>`.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};

pub mod memory;
pub mod s3;

pub use memory::InMemoryStorage;
pub use s3::S3Storage;

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors returned by a storage backend
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend rejected the request or could not be reached. Carries the backend's error text.
    #[error("{0}")]
    Backend(String),

    #[error("NoSuchBucket: the specified bucket {bucket} does not exist")]
    NoSuchBucket { bucket: String },
}

/// Outcome of a successful write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutObjectOutput {
    /// Content digest assigned by the backend, if it returned one
    pub e_tag: Option<String>,
}

/// Trait for object storage backends
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Write `body` under `key` in `bucket`, replacing any existing object
    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> Result<PutObjectOutput>;
}

/// Create the storage backend described by the configuration.
///
/// For S3 this resolves credentials through the AWS SDK default chain, so it fails at startup
/// rather than on the first request if no usable configuration can be loaded.
pub async fn create_storage(config: &StorageConfig) -> anyhow::Result<Arc<dyn ObjectStorage>> {
    match config.backend {
        StorageBackend::S3 => Ok(Arc::new(S3Storage::from_config(config).await?)),
        StorageBackend::Memory => {
            tracing::warn!(bucket = %config.bucket, "Using in-memory object storage, objects will not survive a restart");
            Ok(Arc::new(InMemoryStorage::new([config.bucket.clone()])))
        }
    }
}
