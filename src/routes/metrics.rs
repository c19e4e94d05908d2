use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::metrics::{MetricRegistry, EXPOSITION_CONTENT_TYPE};

/// GET /metrics — Prometheus scrape endpoint.
///
/// A render failure answers 500 with the error text; it never takes the
/// process down.
pub async fn metrics_handler(State(registry): State<Arc<MetricRegistry>>) -> Response {
    match registry.render() {
        Ok(body) => ([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!("metrics render failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
