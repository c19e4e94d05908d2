//! Request instrumentation: one counter increment and one latency
//! observation per completed request, labeled (method, route, status).

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{MatchedPath, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, warn};

use crate::metrics::{
    Counter, Histogram, MetricRegistry, MetricsError, DEFAULT_LATENCY_BUCKETS,
};

/// Labels shared by both request metrics.
const REQUEST_LABELS: &[&str] = &["method", "route", "status"];

/// Handles to the two request-level metrics, registered once at startup.
///
/// Holds only shared references into the registry; series state itself stays
/// owned by the registry's metric objects.
pub struct HttpMetrics {
    requests_total: Arc<Counter>,
    request_duration_seconds: Arc<Histogram>,
}

impl HttpMetrics {
    pub fn register(registry: &MetricRegistry) -> Result<Self, MetricsError> {
        Ok(Self {
            requests_total: registry.register_counter(
                "http_requests_total",
                "Total HTTP requests by method, route, and status",
                REQUEST_LABELS,
            )?,
            request_duration_seconds: registry.register_histogram(
                "http_request_duration_seconds",
                "HTTP request latency in seconds by method, route, and status",
                REQUEST_LABELS,
                &DEFAULT_LATENCY_BUCKETS,
            )?,
        })
    }

    fn record(&self, method: &str, route: &str, status: &str, elapsed_secs: f64) {
        let labels = [method, route, status];
        self.requests_total.increment(&labels);
        self.request_duration_seconds.observe(&labels, elapsed_secs);
    }

    /// Read access for assertions; series state is never mutated through
    /// these handles outside [`track_requests`].
    pub fn requests_total(&self) -> &Counter {
        &self.requests_total
    }

    pub fn request_duration_seconds(&self) -> &Histogram {
        &self.request_duration_seconds
    }
}

/// Axum middleware wrapping every route.
///
/// The route label is the matched route template (`/files/{id}`) when the
/// router provides one, otherwise the literal request path — raw resource ids
/// must not become label values. Recording happens once, after the response
/// is produced; a request whose future is dropped before completion records
/// nothing, since no status code exists to label it.
///
/// Metrics are best-effort telemetry: a recording failure is logged and
/// discarded, never surfaced to the request.
pub async fn track_requests(
    State(metrics): State<Arc<HttpMetrics>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    let elapsed = start.elapsed();
    debug!("HTTP {} {} {} {:?}", method, route, status, elapsed);

    let recorded = catch_unwind(AssertUnwindSafe(|| {
        metrics.record(&method, &route, &status, elapsed.as_secs_f64());
    }));
    if recorded.is_err() {
        warn!("failed to record request metrics for {} {}", method, route);
    }

    response
}
