//! HTTP surface of the service.
//!
//! - `POST /upload` (path configurable): accept a multipart form and write an object to the bucket
//! - `GET /healthz`: liveness
//! - `GET /internal/metrics`: Prometheus metrics, when `enable_metrics` is set

pub mod handlers;
