//! Utilization threshold policy used by the status model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Degraded/failed cut-offs for one metric. A value strictly above a cut-off triggers it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub degraded: f64,
    pub failed: f64,
}

impl Threshold {
    pub const fn new(degraded: f64, failed: f64) -> Self {
        Self { degraded, failed }
    }
}

/// Per-metric thresholds with optional per-resource-type overrides.
///
/// ```yaml
/// thresholds:
///   defaults:
///     cpu_usage_percent: { degraded: 90, failed: 95 }
///   overrides:
///     postgres:
///       connection_usage_percent: { degraded: 75, failed: 90 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPolicy {
    #[serde(default = "default_thresholds")]
    pub defaults: BTreeMap<String, Threshold>,

    /// Keyed by resource type (`postgres`, `gcp-sql`, ...), then by metric name.
    #[serde(default)]
    pub overrides: BTreeMap<String, BTreeMap<String, Threshold>>,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            defaults: default_thresholds(),
            overrides: BTreeMap::new(),
        }
    }
}

impl ThresholdPolicy {
    /// Threshold for a metric on a given resource type, override first.
    pub fn threshold_for(&self, resource_type: &str, metric: &str) -> Option<Threshold> {
        self.overrides
            .get(resource_type)
            .and_then(|table| table.get(metric))
            .or_else(|| self.defaults.get(metric))
            .copied()
    }

    /// Set an override for one resource type.
    pub fn with_override(
        mut self,
        resource_type: impl Into<String>,
        metric: impl Into<String>,
        threshold: Threshold,
    ) -> Self {
        self.overrides
            .entry(resource_type.into())
            .or_default()
            .insert(metric.into(), threshold);
        self
    }

    /// Every entry whose failed cut-off is below its degraded cut-off, as `scope/metric`.
    pub fn inverted_entries(&self) -> Vec<String> {
        let defaults = self
            .defaults
            .iter()
            .map(|(metric, t)| (format!("defaults/{}", metric), t));
        let overrides = self.overrides.iter().flat_map(|(kind, table)| {
            table
                .iter()
                .map(move |(metric, t)| (format!("{}/{}", kind, metric), t))
        });

        defaults
            .chain(overrides)
            .filter(|(_, t)| t.failed < t.degraded)
            .map(|(key, _)| key)
            .collect()
    }
}

fn default_thresholds() -> BTreeMap<String, Threshold> {
    BTreeMap::from([
        ("cpu_usage_percent".to_string(), Threshold::new(90.0, 95.0)),
        ("memory_usage_percent".to_string(), Threshold::new(90.0, 95.0)),
        ("disk_usage_percent".to_string(), Threshold::new(95.0, 98.0)),
        ("connection_usage_percent".to_string(), Threshold::new(80.0, 95.0)),
        ("redis_memory_usage_percent".to_string(), Threshold::new(95.0, 98.0)),
    ])
}
