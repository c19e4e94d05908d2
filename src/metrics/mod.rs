//! In-process metrics core: labeled counters, latency histograms, and the
//! registry that renders them in the Prometheus text exposition format.
//!
//! Series state lives in concurrent hashmaps keyed by ordered label values;
//! mutation happens under the map's per-entry write guard, so concurrent
//! increments never lose updates and a rendered series is never torn.

mod counter;
mod histogram;
mod registry;

pub use counter::Counter;
pub use histogram::{Histogram, HistogramSnapshot, DEFAULT_LATENCY_BUCKETS};
pub use registry::MetricRegistry;

use thiserror::Error;

/// Media type of the rendered exposition format.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

#[derive(Debug, Error)]
pub enum MetricsError {
    /// A metric with this name is already registered. Registration happens
    /// at startup, so this aborts the process rather than being handled.
    #[error("duplicate metric name: {0}")]
    DuplicateName(String),

    #[error("failed to render metrics: {0}")]
    Render(#[from] std::fmt::Error),
}

/// Formats an ordered (name, value) label set as `{a="x",b="y"}`.
///
/// Caller guarantees `names.len() == values.len()`; that arity is fixed per
/// metric at registration time.
pub(crate) fn format_labels(names: &[&str], values: &[String]) -> String {
    let mut out = String::with_capacity(32);
    out.push('{');
    for (i, (name, value)) in names.iter().zip(values.iter()).enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_label_value(value));
        out.push('"');
    }
    out.push('}');
    out
}

/// Escapes a label value per the exposition format (backslash, quote, newline).
/// Literal-path route labels are attacker-controlled, so this is not optional.
pub(crate) fn escape_label_value(value: &str) -> String {
    if !value.contains(['\\', '"', '\n']) {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}
