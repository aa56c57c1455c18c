//! Resource status model.
//!
//! Classification combines two independent sources and takes the more severe
//! result:
//!
//! 1. the discrete state reported by the runtime or vendor API (`running`,
//!    `TERMINATED`, `PENDING_CREATE`, ...), and
//! 2. utilization metrics compared against a [`ThresholdPolicy`].
//!
//! The model is pure and total: it never fails and never performs I/O.

use crate::config::ThresholdPolicy;
use crate::resource::{Metrics, ResourceStatus, ResourceType};

/// Derived metric holding connection usage as a percentage of the limit.
pub const CONNECTION_USAGE_PERCENT: &str = "connection_usage_percent";

/// `(used, limit)` metric pairs from which connection usage can be derived.
const CONNECTION_PAIRS: &[(&str, &str)] = &[
    ("total_connections", "max_connections"),
    ("active_connections", "worker_connections"),
];

/// Classifies raw resource state and metrics into a [`ResourceStatus`].
#[derive(Debug, Clone, Default)]
pub struct StatusModel {
    policy: ThresholdPolicy,
}

impl StatusModel {
    pub fn new(policy: ThresholdPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ThresholdPolicy {
        &self.policy
    }

    /// Classify a resource.
    ///
    /// A missing `raw_state` starts from `UNKNOWN`; metrics may still escalate it.
    pub fn classify(
        &self,
        resource_type: &ResourceType,
        raw_state: Option<&str>,
        metrics: &Metrics,
    ) -> ResourceStatus {
        let from_state = raw_state.map(map_state).unwrap_or(ResourceStatus::Unknown);

        match self.metric_level(resource_type, metrics) {
            MetricLevel::Failed => ResourceStatus::Failed,
            MetricLevel::Degraded if from_state == ResourceStatus::Failed => ResourceStatus::Failed,
            MetricLevel::Degraded => ResourceStatus::Degraded,
            MetricLevel::Normal => from_state,
        }
    }

    /// Copy of `metrics` with derived metrics filled in.
    ///
    /// Adds `connection_usage_percent` when it is absent and a used/limit
    /// connection pair with a positive limit is present.
    pub fn derive_metrics(metrics: &Metrics) -> Metrics {
        let mut derived = metrics.clone();
        if derived.contains_key(CONNECTION_USAGE_PERCENT) {
            return derived;
        }

        let usage = CONNECTION_PAIRS.iter().find_map(|(used, limit)| {
            let used = metrics.get(*used)?;
            let limit = metrics.get(*limit)?;
            (*limit > 0.0).then(|| used / limit * 100.0)
        });

        if let Some(percent) = usage {
            derived.insert(CONNECTION_USAGE_PERCENT.to_string(), percent);
        }
        derived
    }

    fn metric_level(&self, resource_type: &ResourceType, metrics: &Metrics) -> MetricLevel {
        let derived = Self::derive_metrics(metrics);
        let mut level = MetricLevel::Normal;

        for (name, value) in &derived {
            if value.is_nan() {
                continue;
            }
            let Some(threshold) = self.policy.threshold_for(resource_type.as_str(), name) else {
                continue;
            };

            if *value > threshold.failed {
                return MetricLevel::Failed;
            }
            if *value > threshold.degraded {
                level = MetricLevel::Degraded;
            }
        }

        level
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetricLevel {
    Normal,
    Degraded,
    Failed,
}

/// Map a discrete runtime/vendor state to a status.
///
/// Unrecognized states are preserved upper-cased as [`ResourceStatus::Transitional`].
pub fn map_state(raw: &str) -> ResourceStatus {
    let state = raw.trim().to_lowercase();

    // container CLI renders states with a suffix: "Up 3 hours", "Exited (137) 2 minutes ago"
    if state == "up" || state.starts_with("up ") {
        return ResourceStatus::Healthy;
    }
    if state.starts_with("exited") {
        return ResourceStatus::Failed;
    }
    if state.starts_with("restarting") {
        return ResourceStatus::Degraded;
    }

    match state.as_str() {
        "" | "unknown" => ResourceStatus::Unknown,
        "running" | "runnable" | "ready" | "healthy" | "active" | "available" => {
            ResourceStatus::Healthy
        }
        "dead" | "stopped" | "stopping" | "terminated" | "failed" | "maintenance"
        | "suspended" | "suspending" | "deleting" | "removing" => ResourceStatus::Failed,
        "starting" | "staging" | "provisioning" | "pending_create" | "pending_update"
        | "creating" | "updating" | "repairing" | "paused" | "created" | "degraded" => {
            ResourceStatus::Degraded
        }
        _ => ResourceStatus::Transitional(state.to_uppercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::config::Threshold;

    fn metrics(entries: &[(&str, f64)]) -> Metrics {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_map_state_vocabulary() {
        assert_eq!(map_state("running"), ResourceStatus::Healthy);
        assert_eq!(map_state("Up 3 hours"), ResourceStatus::Healthy);
        assert_eq!(map_state("RUNNABLE"), ResourceStatus::Healthy);
        assert_eq!(map_state("Exited (137) 2 minutes ago"), ResourceStatus::Failed);
        assert_eq!(map_state("TERMINATED"), ResourceStatus::Failed);
        assert_eq!(map_state("MAINTENANCE"), ResourceStatus::Failed);
        assert_eq!(map_state("PROVISIONING"), ResourceStatus::Degraded);
        assert_eq!(map_state("PENDING_CREATE"), ResourceStatus::Degraded);
        assert_eq!(map_state("Restarting (1) 5 seconds ago"), ResourceStatus::Degraded);
        assert_eq!(map_state(""), ResourceStatus::Unknown);
        assert_eq!(
            map_state("migrating"),
            ResourceStatus::Transitional("MIGRATING".to_string())
        );
    }

    #[test]
    fn test_running_without_pressure_is_healthy() {
        let model = StatusModel::default();
        let status = model.classify(
            &ResourceType::Redis,
            Some("running"),
            &metrics(&[("cpu_usage_percent", 12.0), ("memory_usage_percent", 40.0)]),
        );
        assert_eq!(status, ResourceStatus::Healthy);
    }

    #[test]
    fn test_memory_pressure_degrades() {
        let model = StatusModel::default();
        let status = model.classify(
            &ResourceType::Redis,
            Some("running"),
            &metrics(&[("memory_usage_percent", 95.0)]),
        );
        assert_eq!(status, ResourceStatus::Degraded);
    }

    #[test]
    fn test_failed_threshold_wins_over_degraded() {
        let model = StatusModel::default();
        let status = model.classify(
            &ResourceType::Docker,
            Some("running"),
            &metrics(&[("cpu_usage_percent", 93.0), ("disk_usage_percent", 99.0)]),
        );
        assert_eq!(status, ResourceStatus::Failed);
    }

    #[test]
    fn test_stopped_state_not_softened_by_metrics() {
        let model = StatusModel::default();
        let status = model.classify(
            &ResourceType::Other("gcp-compute".to_string()),
            Some("TERMINATED"),
            &metrics(&[("cpu_usage_percent", 91.0)]),
        );
        assert_eq!(status, ResourceStatus::Failed);
    }

    #[test]
    fn test_missing_state_and_metrics_is_unknown() {
        let model = StatusModel::default();
        let status = model.classify(&ResourceType::Postgres, None, &Metrics::new());
        assert_eq!(status, ResourceStatus::Unknown);
    }

    #[test]
    fn test_metrics_escalate_unknown_state() {
        let model = StatusModel::default();
        let status = model.classify(
            &ResourceType::Postgres,
            None,
            &metrics(&[("memory_usage_percent", 92.0)]),
        );
        assert_eq!(status, ResourceStatus::Degraded);
    }

    #[test]
    fn test_derived_connection_usage() {
        let model = StatusModel::default();
        let m = metrics(&[("total_connections", 90.0), ("max_connections", 100.0)]);

        let derived = StatusModel::derive_metrics(&m);
        assert_eq!(derived.get(CONNECTION_USAGE_PERCENT), Some(&90.0));
        assert_eq!(
            model.classify(&ResourceType::Postgres, Some("running"), &m),
            ResourceStatus::Degraded
        );

        let zero_limit = metrics(&[("active_connections", 5.0), ("worker_connections", 0.0)]);
        assert!(!StatusModel::derive_metrics(&zero_limit).contains_key(CONNECTION_USAGE_PERCENT));
    }

    #[test]
    fn test_per_type_override() {
        let policy = ThresholdPolicy::default().with_override(
            "postgres",
            CONNECTION_USAGE_PERCENT,
            Threshold::new(50.0, 70.0),
        );
        let model = StatusModel::new(policy);
        let m = metrics(&[(CONNECTION_USAGE_PERCENT, 75.0)]);

        assert_eq!(
            model.classify(&ResourceType::Postgres, Some("running"), &m),
            ResourceStatus::Failed
        );
        assert_eq!(
            model.classify(&ResourceType::Nginx, Some("running"), &m),
            ResourceStatus::Healthy
        );
    }

    #[test]
    fn test_unthresholded_metrics_ignored() {
        let model = StatusModel::default();
        let status = model.classify(
            &ResourceType::Docker,
            Some("running"),
            &metrics(&[("memory_usage_bytes", 1.0e12), ("cpu_usage_percent", f64::NAN)]),
        );
        assert_eq!(status, ResourceStatus::Healthy);
    }
}
