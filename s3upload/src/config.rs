//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The file path
//! defaults to `config.yaml` but can be set with the `-f` flag or the `S3UPLOAD_CONFIG`
//! environment variable. A missing file is not an error; every field has a default.
//!
//! ## Loading Priority
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `S3UPLOAD_` override YAML values
//!
//! Nested values use double underscores, e.g. `S3UPLOAD_STORAGE__BUCKET=my-bucket` sets
//! `storage.bucket`.
//!
//! ## Example
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 8082
//! storage:
//!   backend: s3
//!   bucket: luongbuckettest
//!   region: ap-southeast-1
//! upload:
//!   max_body_size: 10485760
//!   key_header: object-key
//!   payload: fixed
//! ```
//!
//! AWS credentials are never part of this file. They are resolved by the AWS SDK default chain
//! (environment variables, shared config/credentials files, container and instance roles).

use axum::http::HeaderName;
use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "S3UPLOAD_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Where uploaded objects are written
    pub storage: StorageConfig,
    /// Behaviour of the upload endpoint
    pub upload: UploadConfig,
    /// Enable Prometheus metrics endpoint at `/internal/metrics`
    pub enable_metrics: bool,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

/// Object storage target.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Which backend receives the writes
    pub backend: StorageBackend,
    /// Target bucket name
    pub bucket: String,
    /// Region the S3 client is bound to
    pub region: String,
    /// Custom endpoint for S3-compatible stores (MinIO, R2, LocalStack, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<Url>,
    /// Use path-style addressing (`{endpoint}/{bucket}/{key}`), usually needed with `endpoint_url`
    pub force_path_style: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Amazon S3 (or a compatible service when `endpoint_url` is set)
    #[default]
    S3,
    /// Process-local store, for development. Objects are lost on restart.
    Memory,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::S3,
            bucket: "luongbuckettest".to_string(),
            region: "ap-southeast-1".to_string(),
            endpoint_url: None,
            force_path_style: false,
        }
    }
}

/// Upload endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Route the upload handler is mounted on
    pub path: String,
    /// Maximum accepted request body size in bytes (default: 10 MiB)
    pub max_body_size: usize,
    /// Request header carrying the object key
    pub key_header: String,
    /// Object key used when the header is missing or empty
    pub default_key: String,
    /// What is written to the bucket
    pub payload: PayloadMode,
    /// Multipart field holding the file, used in `forward` mode
    pub file_field: String,
}

/// What the upload endpoint writes as the object body.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PayloadMode {
    /// Always write the built-in example order document, ignoring the uploaded file
    #[default]
    Fixed,
    /// Write the bytes of the uploaded file field
    Forward,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: "/upload".to_string(),
            max_body_size: 10 << 20,
            key_header: "object-key".to_string(),
            default_key: "object-key".to_string(),
            payload: PayloadMode::Fixed,
            file_field: "file".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8082,
            storage: StorageConfig::default(),
            upload: UploadConfig::default(),
            enable_metrics: false,
            enable_otel_export: false,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.storage.bucket.trim().is_empty() {
            return Err(Error::InvalidConfig {
                message: "storage.bucket must not be empty".to_string(),
            });
        }

        if self.storage.backend == StorageBackend::S3 && self.storage.region.trim().is_empty() {
            return Err(Error::InvalidConfig {
                message: "storage.region must not be empty for the s3 backend".to_string(),
            });
        }

        if self.upload.max_body_size == 0 {
            return Err(Error::InvalidConfig {
                message: "upload.max_body_size must be greater than 0".to_string(),
            });
        }

        if !self.upload.path.starts_with('/') {
            return Err(Error::InvalidConfig {
                message: format!("upload.path must start with '/', got '{}'", self.upload.path),
            });
        }

        if HeaderName::from_bytes(self.upload.key_header.as_bytes()).is_err() {
            return Err(Error::InvalidConfig {
                message: format!(
                    "upload.key_header '{}' is not a valid HTTP header name",
                    self.upload.key_header
                ),
            });
        }

        if self.upload.default_key.is_empty() {
            return Err(Error::InvalidConfig {
                message: "upload.default_key must not be empty".to_string(),
            });
        }

        if self.upload.payload == PayloadMode::Forward && self.upload.file_field.is_empty() {
            return Err(Error::InvalidConfig {
                message: "upload.file_field must be set when upload.payload is 'forward'".to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values.
            // S3UPLOAD_CONFIG names the file itself and is consumed by clap.
            .merge(Env::prefixed("S3UPLOAD_").ignore(&["config"]).split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
