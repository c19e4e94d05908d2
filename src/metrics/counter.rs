//! Labeled, monotonically increasing counter series.

use std::fmt::Write;

use dashmap::DashMap;

use super::format_labels;

/// A labeled counter metric.
///
/// Each distinct ordered tuple of label values is an independent series,
/// created at 0 on its first increment. Values only ever grow; there is no
/// decrement or reset during the process lifetime.
///
/// Increments mutate the series under the map's per-entry write guard, so
/// N concurrent increments on one key always land as exactly N.
pub struct Counter {
    name: String,
    help: String,
    label_names: Vec<&'static str>,
    series: DashMap<Vec<String>, u64>,
}

impl Counter {
    pub(crate) fn new(name: &str, help: &str, label_names: &[&'static str]) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            label_names: label_names.to_vec(),
            series: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds 1 to the series for `labels`, creating it at 0 first if absent.
    ///
    /// Passing the wrong number of labels is a programming error, not data.
    pub fn increment(&self, labels: &[&str]) {
        assert_eq!(
            labels.len(),
            self.label_names.len(),
            "label arity mismatch for metric {}",
            self.name
        );
        let key: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        self.series.entry(key).and_modify(|v| *v += 1).or_insert(1);
    }

    /// Current value for `labels`; 0 for a key never incremented.
    ///
    /// Reading never allocates a series — an unobserved key stays invisible
    /// to `render()`.
    pub fn value(&self, labels: &[&str]) -> u64 {
        let key: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        self.series.get(&key).map(|v| *v).unwrap_or(0)
    }

    /// Appends this metric's exposition lines to `out`, series sorted by
    /// label values for deterministic scrapes.
    pub(crate) fn render_into(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "# HELP {} {}", self.name, self.help)?;
        writeln!(out, "# TYPE {} counter", self.name)?;

        let mut snapshot: Vec<(Vec<String>, u64)> = self
            .series
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));

        for (key, value) in &snapshot {
            writeln!(
                out,
                "{}{} {}",
                self.name,
                format_labels(&self.label_names, key),
                value
            )?;
        }
        Ok(())
    }
}
