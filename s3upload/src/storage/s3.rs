//! Amazon S3 backend.

use anyhow::Context as _;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_s3::{config::Region, error::DisplayErrorContext, primitives::ByteStream};
use bytes::Bytes;

use super::{ObjectStorage, PutObjectOutput, Result, StorageError};
use crate::config::StorageConfig;

/// S3 storage backend wrapping a single long-lived SDK client.
///
/// The client is cheap to share: every `put_object` call is an independent request, so one
/// instance serves all in-flight uploads.
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: aws_sdk_s3::Client,
}

impl S3Storage {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Build a client from the AWS SDK default configuration chain, bound to the configured region.
    ///
    /// Credentials are resolved eagerly so a misconfigured environment fails at startup.
    pub async fn from_config(config: &StorageConfig) -> anyhow::Result<Self> {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let credentials = sdk_config
            .credentials_provider()
            .context("no AWS credentials provider could be configured")?;
        credentials
            .provide_credentials()
            .await
            .context("unable to load AWS credentials")?;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(config.force_path_style);
        if let Some(endpoint) = &config.endpoint_url {
            // Url always renders a trailing slash for an empty path
            builder = builder.endpoint_url(endpoint.as_str().trim_end_matches('/'));
        }

        tracing::info!(
            region = %config.region,
            bucket = %config.bucket,
            endpoint = ?config.endpoint_url.as_ref().map(|u| u.as_str()),
            "S3 client initialized"
        );

        Ok(Self::new(aws_sdk_s3::Client::from_conf(builder.build())))
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> Result<PutObjectOutput> {
        let output = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::Backend(DisplayErrorContext(&e).to_string()))?;

        Ok(PutObjectOutput {
            e_tag: output.e_tag().map(str::to_string),
        })
    }
}
