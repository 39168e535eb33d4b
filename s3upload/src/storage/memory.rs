//! Process-local object store.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::{DashMap, DashSet};
use sha2::{Digest, Sha256};

use super::{ObjectStorage, PutObjectOutput, Result, StorageError};

/// Keeps objects in memory, keyed by `(bucket, key)`.
///
/// Only the buckets it was created with exist; writes to any other bucket fail the way S3 would.
/// ETags are the quoted hex SHA-256 of the body, so identical bodies share an ETag.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    buckets: DashSet<String>,
    objects: DashMap<(String, String), Bytes>,
}

impl InMemoryStorage {
    pub fn new<I, S>(buckets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            buckets: buckets.into_iter().map(Into::into).collect(),
            objects: DashMap::new(),
        }
    }

    /// Read back a stored object
    pub fn get(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.objects.get(&(bucket.to_string(), key.to_string())).map(|entry| entry.value().clone())
    }

    /// Number of objects across all buckets
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn e_tag(body: &[u8]) -> String {
        format!("\"{:x}\"", Sha256::digest(body))
    }
}

#[async_trait]
impl ObjectStorage for InMemoryStorage {
    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> Result<PutObjectOutput> {
        if !self.buckets.contains(bucket) {
            return Err(StorageError::NoSuchBucket {
                bucket: bucket.to_string(),
            });
        }

        let e_tag = Self::e_tag(&body);
        tracing::debug!(bucket, key, size = body.len(), e_tag = %e_tag, "Stored object in memory");
        self.objects.insert((bucket.to_string(), key.to_string()), body);

        Ok(PutObjectOutput { e_tag: Some(e_tag) })
    }
}
