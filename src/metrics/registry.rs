//! Registry owning every metric and rendering the scrape snapshot.

use std::fmt::Write;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::{Counter, Histogram, MetricsError};

enum Metric {
    Counter(Arc<Counter>),
    Histogram(Arc<Histogram>),
}

impl Metric {
    fn name(&self) -> &str {
        match self {
            Metric::Counter(c) => c.name(),
            Metric::Histogram(h) => h.name(),
        }
    }
}

/// Central registry for all service metrics.
///
/// Constructed explicitly at startup and shared by reference; there is no
/// process-wide default registry. Registration returns shared handles that
/// the instrumentation layer mutates; the registry keeps exclusive ownership
/// of the metric objects themselves and is the only renderer.
pub struct MetricRegistry {
    started: Instant,
    metrics: RwLock<Vec<Metric>>,
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            metrics: RwLock::new(Vec::new()),
        }
    }

    /// Registers a labeled counter. Fails if `name` is already taken.
    pub fn register_counter(
        &self,
        name: &str,
        help: &str,
        label_names: &[&'static str],
    ) -> Result<Arc<Counter>, MetricsError> {
        let counter = Arc::new(Counter::new(name, help, label_names));
        self.register(Metric::Counter(Arc::clone(&counter)))?;
        Ok(counter)
    }

    /// Registers a labeled histogram with fixed bucket bounds. Fails if
    /// `name` is already taken.
    pub fn register_histogram(
        &self,
        name: &str,
        help: &str,
        label_names: &[&'static str],
        bounds: &[f64],
    ) -> Result<Arc<Histogram>, MetricsError> {
        let histogram = Arc::new(Histogram::new(name, help, label_names, bounds));
        self.register(Metric::Histogram(Arc::clone(&histogram)))?;
        Ok(histogram)
    }

    fn register(&self, metric: Metric) -> Result<(), MetricsError> {
        let mut metrics = self.metrics.write().unwrap_or_else(|e| e.into_inner());
        if metrics.iter().any(|m| m.name() == metric.name()) {
            return Err(MetricsError::DuplicateName(metric.name().to_string()));
        }
        metrics.push(metric);
        Ok(())
    }

    /// Renders every registered metric, in registration order, as one
    /// exposition-format document.
    ///
    /// Safe to call concurrently with ongoing increments and observations;
    /// read-only with respect to counter/histogram series. Also emits the
    /// registry-owned `process_uptime_seconds` gauge.
    pub fn render(&self) -> Result<String, MetricsError> {
        let mut out = String::with_capacity(4096);

        writeln!(
            out,
            "# HELP process_uptime_seconds Seconds since the service started"
        )?;
        writeln!(out, "# TYPE process_uptime_seconds gauge")?;
        writeln!(
            out,
            "process_uptime_seconds {}",
            self.started.elapsed().as_secs_f64()
        )?;

        let metrics = self.metrics.read().unwrap_or_else(|e| e.into_inner());
        for metric in metrics.iter() {
            out.push('\n');
            match metric {
                Metric::Counter(c) => c.render_into(&mut out)?,
                Metric::Histogram(h) => h.render_into(&mut out)?,
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_name_rejected() {
        let registry = MetricRegistry::new();
        registry
            .register_counter("http_requests_total", "Total requests", &["method"])
            .unwrap();

        let err = registry
            .register_histogram("http_requests_total", "Clash", &["method"], &[1.0])
            .unwrap_err();
        assert!(matches!(err, MetricsError::DuplicateName(name) if name == "http_requests_total"));
    }

    #[test]
    fn test_render_includes_uptime_gauge() {
        let registry = MetricRegistry::new();
        let out = registry.render().unwrap();
        assert!(out.contains("# TYPE process_uptime_seconds gauge"));
        assert!(out.contains("process_uptime_seconds "));
    }

    #[test]
    fn test_render_covers_observed_series_only() {
        let registry = MetricRegistry::new();
        let requests = registry
            .register_counter("http_requests_total", "Total requests", &["method", "route", "status"])
            .unwrap();
        let latency = registry
            .register_histogram(
                "http_request_duration_seconds",
                "Request latency",
                &["method", "route", "status"],
                &[0.1, 1.0],
            )
            .unwrap();

        requests.increment(&["GET", "/files", "200"]);
        latency.observe(&["GET", "/files", "200"], 0.05);
        // read-only probe of an unobserved key
        assert_eq!(requests.value(&["DELETE", "/files", "204"]), 0);

        let out = registry.render().unwrap();
        assert!(out.contains(r#"http_requests_total{method="GET",route="/files",status="200"} 1"#));
        assert!(out.contains(
            r#"http_request_duration_seconds_count{method="GET",route="/files",status="200"} 1"#
        ));
        assert!(!out.contains("DELETE"));
    }

    #[test]
    fn test_render_in_registration_order() {
        let registry = MetricRegistry::new();
        let a = registry.register_counter("a_total", "A", &["k"]).unwrap();
        let b = registry.register_counter("b_total", "B", &["k"]).unwrap();
        a.increment(&["x"]);
        b.increment(&["x"]);

        let out = registry.render().unwrap();
        let a_pos = out.find("# TYPE a_total counter").unwrap();
        let b_pos = out.find("# TYPE b_total counter").unwrap();
        assert!(a_pos < b_pos);
    }
}
