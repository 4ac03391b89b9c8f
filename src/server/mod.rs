//! The axum HTTP surface of the gateway.
//!
//! One router, one [`AppState`]. All routes are GET; anything else on a
//! known path gets a 405 with an `Allow` header. The router is built
//! separately from the serve loop so integration tests can drive it with
//! `tower::ServiceExt::oneshot` instead of a live socket.

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod pages;
pub mod range;
pub mod statics;

pub use error::AppError;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::store::{BucketName, Buckets};

/// Shared state behind every handler.
///
/// Cheap to clone: buckets are `Arc`-backed and the metrics handle is a
/// shared registry reference.
#[derive(Clone)]
pub struct AppState {
    /// The resolved bucket table
    pub buckets: Buckets,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Prometheus handle, absent when recorder install failed
    pub metrics: Option<PrometheusHandle>,
}

/// Builds the gateway router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/list", get(handlers::home))
        .route("/list/", get(handlers::home))
        .route("/list/{chain}/{kind}", get(handlers::listing_page))
        .route("/archive/{bucket}/{*key}", get(handlers::archive))
        .route("/latest/{chain}", get(handlers::latest))
        .route("/latest-v1/{chain}", get(handlers::latest_v1))
        .route("/latest-v2/{chain}", get(handlers::latest_v2))
        .route("/static/{*path}", get(statics::serve_static))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics_text))
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .with_state(state)
}

/// Opens the buckets, binds the listener and serves until ctrl-c.
///
/// # Errors
///
/// Returns an error when a bucket directory cannot be opened or the
/// listener cannot bind.
pub async fn serve(config: &Config) -> Result<()> {
    let buckets = Buckets::open(&config.buckets)?;

    // A second recorder install (e.g. under tests) is not fatal; the
    // /metrics endpoint degrades to 503.
    let metrics_handle = match metrics::install() {
        Ok(handle) => Some(handle),
        Err(err) => {
            warn!("metrics disabled: {err:#}");
            None
        },
    };

    let state = AppState {
        buckets,
        static_dir: config.server.static_dir.clone(),
        metrics: metrics_handle,
    };

    let mut app = router(state).layer(CorsLayer::permissive());
    if config.server.request_timeout_secs > 0 {
        app = app.layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));
    }

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind: {addr}"))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %addr,
        "carport listening"
    );
    for name in BucketName::ALL {
        info!(bucket = %name, "bucket ready");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    // Errors installing the handler leave the server running until killed.
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to install ctrl-c handler: {err}");
        std::future::pending::<()>().await;
    }
}
