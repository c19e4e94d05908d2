pub mod config;
pub mod db;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use config::Config;
use metrics::MetricRegistry;
use middleware::instrument::{track_requests, HttpMetrics};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub registry: Arc<MetricRegistry>,
}

impl FromRef<AppState> for Arc<MetricRegistry> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.registry)
    }
}

/// Assembles the full router: ingestion, file listing, health, and the
/// scrape endpoint, all wrapped by the request instrumentation middleware.
pub fn build_router(state: AppState, http_metrics: Arc<HttpMetrics>) -> Router {
    Router::new()
        .route("/", post(routes::upload::upload_file))
        .route("/files", get(routes::files::list_recent))
        .route("/files/{id}", get(routes::files::get_file))
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::metrics::metrics_handler))
        .layer(axum::middleware::from_fn_with_state(
            http_metrics,
            track_requests,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
