//! # s3upload: multipart upload endpoint backed by S3
//!
//! `s3upload` is a small HTTP service with a single job: accept a multipart form upload on
//! `POST /upload` and write an object to an S3 bucket. The object key is taken from the
//! `object-key` request header (falling back to the literal `object-key`).
//!
//! By default the service keeps a long-standing behaviour of the endpoint: the uploaded file is
//! parsed and validated but **not** stored. Every request writes the same built-in example
//! order document (see [`payload::EXAMPLE_ORDER`]). Setting `upload.payload: forward` stores
//! the uploaded file instead.
//!
//! ## Request Flow
//!
//! 1. The multipart body is read in full, bounded by `upload.max_body_size` (10 MiB). Anything
//!    that does not parse is answered with `400 Unable to parse form data` and nothing is written.
//! 2. The key is resolved from the key header.
//! 3. One `put_object` call is made through the [`storage::ObjectStorage`] held in [`AppState`].
//! 4. Success returns `200 File uploaded successfully to S3. ETag: <etag>`; a backend failure
//!    returns `500` with the backend's error text. There are no retries.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use s3upload::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = s3upload::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     s3upload::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod errors;
pub mod payload;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
pub mod test_utils;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use std::sync::Arc;
use storage::ObjectStorage;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info};

/// Application state shared across all request handlers.
///
/// Both fields are read-only after startup; the storage client is shared by every in-flight
/// request.
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .storage(storage)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn ObjectStorage>,
}

/// Build the application router with all routes and middleware
pub fn build_router(state: &AppState) -> Router {
    let upload = &state.config.upload;

    let mut router = Router::new()
        .route(
            &upload.path,
            post(api::handlers::upload::upload_object).layer(DefaultBodyLimit::max(upload.max_body_size)),
        )
        .route("/healthz", get(|| async { "OK" }))
        .with_state(state.clone());

    // Add Prometheus metrics if enabled
    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    // Add tracing layer
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// Main application struct that owns the router and its configuration.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] builds the storage client from configuration
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown signal resolves, in-flight requests finish and telemetry is flushed
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance, building the configured storage backend
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting s3upload with configuration: {:#?}", config);

        let storage = storage::create_storage(&config.storage).await?;
        Self::new_with_storage(config, storage)
    }

    /// Create an application around an already constructed storage backend
    pub fn new_with_storage(config: Config, storage: Arc<dyn ObjectStorage>) -> anyhow::Result<Self> {
        config.validate().map_err(|e| anyhow::anyhow!("{e}"))?;

        let app_state = AppState::builder().config(config.clone()).storage(storage).build();
        let router = build_router(&app_state);

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Upload service listening on http://{}, uploads accepted at POST {}",
            bind_addr, self.config.upload.path
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
