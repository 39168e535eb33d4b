//! Test utilities for handler and integration tests.

use crate::config::{Config, StorageBackend, StorageConfig};
use crate::storage::{ObjectStorage, PutObjectOutput, StorageError};
use async_trait::async_trait;
use axum_test::TestServer;
use bytes::Bytes;
use std::sync::{Arc, Mutex};

pub const TEST_BUCKET: &str = "test-bucket";

/// A single `put_object` call seen by [`RecordingStorage`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPut {
    pub bucket: String,
    pub key: String,
    pub body: Bytes,
}

#[derive(Debug, Clone)]
enum Outcome {
    Succeed { e_tag: Option<String> },
    Fail { message: String },
}

/// Storage double that records every write and answers with a scripted outcome.
#[derive(Debug, Clone)]
pub struct RecordingStorage {
    outcome: Outcome,
    puts: Arc<Mutex<Vec<RecordedPut>>>,
}

impl RecordingStorage {
    /// Every write succeeds and returns `e_tag`
    pub fn succeeding(e_tag: Option<&str>) -> Self {
        Self {
            outcome: Outcome::Succeed {
                e_tag: e_tag.map(str::to_string),
            },
            puts: Arc::default(),
        }
    }

    /// Every write fails with a backend error carrying `message`
    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Outcome::Fail {
                message: message.to_string(),
            },
            puts: Arc::default(),
        }
    }

    /// All writes attempted so far, in order
    pub fn puts(&self) -> Vec<RecordedPut> {
        self.puts.lock().expect("recording lock poisoned").clone()
    }
}

#[async_trait]
impl ObjectStorage for RecordingStorage {
    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> crate::storage::Result<PutObjectOutput> {
        self.puts.lock().expect("recording lock poisoned").push(RecordedPut {
            bucket: bucket.to_string(),
            key: key.to_string(),
            body,
        });

        match &self.outcome {
            Outcome::Succeed { e_tag } => Ok(PutObjectOutput { e_tag: e_tag.clone() }),
            Outcome::Fail { message } => Err(StorageError::Backend(message.clone())),
        }
    }
}

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        storage: StorageConfig {
            backend: StorageBackend::Memory,
            bucket: TEST_BUCKET.to_string(),
            ..Default::default()
        },
        enable_metrics: false,
        enable_otel_export: false,
        ..Default::default()
    }
}

/// Build a test server around the real router, with `storage` standing in for the bucket
pub fn create_test_app<S>(config: Config, storage: S) -> TestServer
where
    S: ObjectStorage + 'static,
{
    crate::Application::new_with_storage(config, Arc::new(storage))
        .expect("Failed to create application")
        .into_test_server()
}
