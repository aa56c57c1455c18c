//! Resource snapshots and the normalized status vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Numeric telemetry for a resource, keyed by metric name (e.g. `cpu_usage_percent`).
pub type Metrics = BTreeMap<String, f64>;

/// Normalized health of a resource.
///
/// Serialized as an upper-case string. Vendor states that have no normalized
/// meaning are kept verbatim (upper-cased) as [`ResourceStatus::Transitional`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceStatus {
    Healthy,
    Degraded,
    Failed,
    Unknown,
    Transitional(String),
}

impl ResourceStatus {
    /// Whether the orchestrator has to verify this resource after a fix.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Degraded | Self::Failed)
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Healthy => "HEALTHY",
            Self::Degraded => "DEGRADED",
            Self::Failed => "FAILED",
            Self::Unknown => "UNKNOWN",
            Self::Transitional(state) => state,
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ResourceStatus {
    fn from(value: String) -> Self {
        let upper = value.trim().to_uppercase();
        match upper.as_str() {
            "HEALTHY" => Self::Healthy,
            "DEGRADED" => Self::Degraded,
            "FAILED" => Self::Failed,
            "UNKNOWN" | "" => Self::Unknown,
            _ => Self::Transitional(upper),
        }
    }
}

impl From<ResourceStatus> for String {
    fn from(value: ResourceStatus) -> Self {
        match value {
            ResourceStatus::Transitional(state) => state,
            other => other.as_str().to_string(),
        }
    }
}

/// Kind of infrastructure a resource represents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceType {
    Postgres,
    Redis,
    Nginx,
    Application,
    Docker,
    Other(String),
}

impl ResourceType {
    /// Infer the resource type of a container from its image and name.
    pub fn infer(image: &str, name: &str) -> Self {
        let image = image.to_lowercase();
        let name = name.to_lowercase();

        if image.contains("postgres") {
            Self::Postgres
        } else if image.contains("redis") {
            Self::Redis
        } else if image.contains("nginx") || name.contains("nginx") {
            Self::Nginx
        } else if image.contains("sample-app") || name.contains("app") {
            Self::Application
        } else {
            Self::Docker
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Postgres => "postgres",
            Self::Redis => "redis",
            Self::Nginx => "nginx",
            Self::Application => "application",
            Self::Docker => "docker",
            Self::Other(kind) => kind,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ResourceType {
    fn from(value: String) -> Self {
        let lower = value.trim().to_lowercase();
        match lower.as_str() {
            "postgres" => Self::Postgres,
            "redis" => Self::Redis,
            "nginx" => Self::Nginx,
            "application" => Self::Application,
            "docker" => Self::Docker,
            _ => Self::Other(lower),
        }
    }
}

impl From<&str> for ResourceType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ResourceType> for String {
    fn from(value: ResourceType) -> Self {
        match value {
            ResourceType::Other(kind) => kind,
            other => other.as_str().to_string(),
        }
    }
}

/// Point-in-time normalized view of a resource.
///
/// Every collection produces a new snapshot; snapshots are never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSnapshot {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub status: ResourceStatus,
    #[serde(default)]
    pub metrics: Metrics,
    pub timestamp: DateTime<Utc>,
}

impl ResourceSnapshot {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        resource_type: ResourceType,
        status: ResourceStatus,
        metrics: Metrics,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            resource_type,
            status,
            metrics,
            timestamp: Utc::now(),
        }
    }

    /// Snapshot for a resource whose telemetry could not be read.
    pub fn unavailable(
        id: impl Into<String>,
        name: impl Into<String>,
        resource_type: ResourceType,
    ) -> Self {
        Self::new(id, name, resource_type, ResourceStatus::Unknown, Metrics::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_strings() {
        assert_eq!(ResourceStatus::from("healthy".to_string()), ResourceStatus::Healthy);
        assert_eq!(ResourceStatus::from(String::new()), ResourceStatus::Unknown);
        assert_eq!(
            ResourceStatus::from("updating".to_string()),
            ResourceStatus::Transitional("UPDATING".to_string())
        );
        assert_eq!(String::from(ResourceStatus::Failed), "FAILED");
    }

    #[test]
    fn test_status_serializes_as_plain_string() {
        let json = serde_json::to_value(ResourceStatus::Degraded).unwrap();
        assert_eq!(json, serde_json::json!("DEGRADED"));

        let parsed: ResourceStatus = serde_json::from_value(serde_json::json!("REPAIRING")).unwrap();
        assert_eq!(parsed.as_str(), "REPAIRING");
        assert!(!parsed.is_unhealthy());
    }

    #[test]
    fn test_infer_resource_type() {
        assert_eq!(ResourceType::infer("postgres:15", "db"), ResourceType::Postgres);
        assert_eq!(ResourceType::infer("redis:7-alpine", "cache"), ResourceType::Redis);
        assert_eq!(ResourceType::infer("openresty", "nginx-edge"), ResourceType::Nginx);
        assert_eq!(ResourceType::infer("acme/sample-app", "web"), ResourceType::Application);
        assert_eq!(ResourceType::infer("busybox", "webapp"), ResourceType::Application);
        assert_eq!(ResourceType::infer("busybox", "sidecar"), ResourceType::Docker);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = ResourceSnapshot::unavailable("c1", "redis", ResourceType::Redis);
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["type"], "redis");
        assert_eq!(json["status"], "UNKNOWN");
        assert!(json["metrics"].as_object().unwrap().is_empty());
        assert!(json.get("timestamp").is_some());
    }
}
