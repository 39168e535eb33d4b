//! Axum route handlers.
//!
//! - [`upload`]: multipart upload to object storage

pub mod upload;
