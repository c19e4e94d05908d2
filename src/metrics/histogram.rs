//! Labeled latency histogram with fixed cumulative buckets.

use std::fmt::Write;

use dashmap::DashMap;

use super::format_labels;

/// Default bucket upper bounds for HTTP request latencies, in seconds.
/// 5ms up to 5s; anything slower lands only in the implicit `+Inf` bucket.
pub const DEFAULT_LATENCY_BUCKETS: [f64; 10] =
    [0.005, 0.01, 0.025, 0.05, 0.1, 0.3, 0.5, 1.0, 2.0, 5.0];

/// Per-series histogram state. The whole struct is mutated as one unit under
/// the map's entry write guard, so bucket counts, sum, and count always
/// reflect the same set of observations.
#[derive(Debug)]
struct Series {
    /// Cumulative counts, parallel to the bound list: bucket *i* counts every
    /// observation <= bound *i*.
    buckets: Vec<u64>,
    sum: f64,
    count: u64,
}

impl Series {
    fn new(bucket_count: usize) -> Self {
        Self {
            buckets: vec![0; bucket_count],
            sum: 0.0,
            count: 0,
        }
    }
}

/// Read-only copy of one series, for tests and assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    pub buckets: Vec<u64>,
    pub sum: f64,
    pub count: u64,
}

/// A labeled histogram metric with fixed, ascending bucket bounds.
///
/// Observations are cumulative across buckets (Prometheus semantics): an
/// observation increments every bucket whose bound is >= the value, plus the
/// running sum and total count. Negative values are accepted; the timing
/// caller never produces them but the metric imposes no lower bound.
#[derive(Debug)]
pub struct Histogram {
    name: String,
    help: String,
    label_names: Vec<&'static str>,
    bounds: Vec<f64>,
    series: DashMap<Vec<String>, Series>,
}

impl Histogram {
    pub(crate) fn new(
        name: &str,
        help: &str,
        label_names: &[&'static str],
        bounds: &[f64],
    ) -> Self {
        assert!(!bounds.is_empty(), "histogram {name} needs at least one bucket");
        assert!(
            bounds.windows(2).all(|w| w[0] < w[1]),
            "histogram {name} bucket bounds must be strictly ascending"
        );
        Self {
            name: name.to_string(),
            help: help.to_string(),
            label_names: label_names.to_vec(),
            bounds: bounds.to_vec(),
            series: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records `value` into the series for `labels`.
    ///
    /// No lost updates under concurrent calls on the same key: the series is
    /// updated while holding its entry write guard.
    pub fn observe(&self, labels: &[&str], value: f64) {
        assert_eq!(
            labels.len(),
            self.label_names.len(),
            "label arity mismatch for metric {}",
            self.name
        );
        let key: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        let mut series = self
            .series
            .entry(key)
            .or_insert_with(|| Series::new(self.bounds.len()));
        for (i, &bound) in self.bounds.iter().enumerate() {
            if value <= bound {
                series.buckets[i] += 1;
            }
        }
        series.sum += value;
        series.count += 1;
    }

    /// Snapshot of one series; `None` for a key never observed. Reading does
    /// not allocate a series.
    pub fn snapshot(&self, labels: &[&str]) -> Option<HistogramSnapshot> {
        let key: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        self.series.get(&key).map(|s| HistogramSnapshot {
            buckets: s.buckets.clone(),
            sum: s.sum,
            count: s.count,
        })
    }

    pub fn count(&self, labels: &[&str]) -> u64 {
        self.snapshot(labels).map(|s| s.count).unwrap_or(0)
    }

    pub fn sum(&self, labels: &[&str]) -> f64 {
        self.snapshot(labels).map(|s| s.sum).unwrap_or(0.0)
    }

    /// Appends this metric's exposition lines to `out`: per-bucket `_bucket`
    /// lines (including `+Inf`), then `_sum` and `_count`, per series, series
    /// sorted by label values.
    pub(crate) fn render_into(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "# HELP {} {}", self.name, self.help)?;
        writeln!(out, "# TYPE {} histogram", self.name)?;

        let mut snapshot: Vec<(Vec<String>, HistogramSnapshot)> = self
            .series
            .iter()
            .map(|entry| {
                (
                    entry.key().clone(),
                    HistogramSnapshot {
                        buckets: entry.value().buckets.clone(),
                        sum: entry.value().sum,
                        count: entry.value().count,
                    },
                )
            })
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));

        for (key, series) in &snapshot {
            for (i, &bound) in self.bounds.iter().enumerate() {
                let labels = self.bucket_labels(key, &bound.to_string());
                writeln!(out, "{}_bucket{} {}", self.name, labels, series.buckets[i])?;
            }
            let inf_labels = self.bucket_labels(key, "+Inf");
            writeln!(out, "{}_bucket{} {}", self.name, inf_labels, series.count)?;
            let labels = format_labels(&self.label_names, key);
            writeln!(out, "{}_sum{} {}", self.name, labels, series.sum)?;
            writeln!(out, "{}_count{} {}", self.name, labels, series.count)?;
        }
        Ok(())
    }

    /// Label set for a `_bucket` line: the series labels plus `le`.
    fn bucket_labels(&self, key: &[String], le: &str) -> String {
        let mut names = self.label_names.clone();
        names.push("le");
        let mut values = key.to_vec();
        values.push(le.to_string());
        format_labels(&names, &values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn latency_histogram(bounds: &[f64]) -> Histogram {
        Histogram::new(
            "http_request_duration_seconds",
            "HTTP request latency",
            &["method", "route", "status"],
            bounds,
        )
    }

    const KEY: &[&str] = &["GET", "/files/{id}", "200"];

    #[test]
    fn test_cumulative_bucket_semantics() {
        let h = latency_histogram(&[0.1, 0.5, 1.0]);
        for v in [0.05, 0.3, 0.9, 2.0] {
            h.observe(KEY, v);
        }

        let s = h.snapshot(KEY).unwrap();
        assert_eq!(s.buckets, vec![1, 2, 3]);
        assert_eq!(s.count, 4);
        assert!((s.sum - 3.25).abs() < 1e-9);
    }

    #[test]
    fn test_bucket_counts_non_decreasing() {
        let h = latency_histogram(&DEFAULT_LATENCY_BUCKETS);
        for v in [0.001, 0.02, 0.02, 0.4, 1.5, 10.0, 0.007] {
            h.observe(KEY, v);
        }

        let s = h.snapshot(KEY).unwrap();
        for w in s.buckets.windows(2) {
            assert!(w[0] <= w[1]);
        }
        assert_eq!(s.count, 7);
    }

    #[test]
    fn test_negative_values_accepted() {
        let h = latency_histogram(&[0.1, 1.0]);
        h.observe(KEY, -0.5);

        let s = h.snapshot(KEY).unwrap();
        assert_eq!(s.buckets, vec![1, 1]);
        assert_eq!(s.count, 1);
        assert!((s.sum + 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_unobserved_key_invisible() {
        let h = latency_histogram(&[0.1]);
        assert_eq!(h.snapshot(KEY), None);
        assert_eq!(h.count(KEY), 0);

        let mut out = String::new();
        h.render_into(&mut out).unwrap();
        assert!(!out.contains("_bucket"));
    }

    #[test]
    fn test_concurrent_observe_loses_nothing() {
        let h = Arc::new(latency_histogram(&DEFAULT_LATENCY_BUCKETS));
        let mut handles = vec![];

        for _ in 0..4 {
            let h = Arc::clone(&h);
            handles.push(thread::spawn(move || {
                for i in 0..500 {
                    h.observe(KEY, i as f64 / 1000.0);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let s = h.snapshot(KEY).unwrap();
        assert_eq!(s.count, 2000);
        // +Inf accounting: every observation is in the total count
        assert_eq!(*s.buckets.last().unwrap(), 2000);
    }

    #[test]
    fn test_render_exposition_shape() {
        let h = latency_histogram(&[0.1, 0.5, 1.0]);
        for v in [0.05, 0.3, 0.9, 2.0] {
            h.observe(KEY, v);
        }

        let mut out = String::new();
        h.render_into(&mut out).unwrap();

        assert!(out.contains("# TYPE http_request_duration_seconds histogram"));
        assert!(out.contains(
            r#"http_request_duration_seconds_bucket{method="GET",route="/files/{id}",status="200",le="0.1"} 1"#
        ));
        assert!(out.contains(
            r#"http_request_duration_seconds_bucket{method="GET",route="/files/{id}",status="200",le="+Inf"} 4"#
        ));
        assert!(out.contains(
            r#"http_request_duration_seconds_sum{method="GET",route="/files/{id}",status="200"} 3.25"#
        ));
        assert!(out.contains(
            r#"http_request_duration_seconds_count{method="GET",route="/files/{id}",status="200"} 4"#
        ));
    }

    #[test]
    #[should_panic(expected = "strictly ascending")]
    fn test_unsorted_bounds_rejected() {
        latency_histogram(&[1.0, 0.5]);
    }
}
