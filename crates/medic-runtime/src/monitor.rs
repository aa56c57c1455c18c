//! Telemetry collaborators.

use crate::error::MonitorError;
use async_trait::async_trait;
use medic_core::{FixScope, LogEntry, Metrics, ResourceSnapshot, ResourceType, StatusModel};

/// Raw telemetry for one resource, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub id: String,
    pub name: String,
    pub resource_type: ResourceType,
    /// Discrete state as reported by the runtime or vendor API, if any.
    pub raw_state: Option<String>,
    pub metrics: Metrics,
}

impl Observation {
    /// Normalize into a snapshot, adding derived metrics.
    pub fn classify(self, model: &StatusModel) -> ResourceSnapshot {
        let metrics = StatusModel::derive_metrics(&self.metrics);
        let status = model.classify(&self.resource_type, self.raw_state.as_deref(), &metrics);
        tracing::debug!(resource = %self.name, status = %status, "Classified resource");
        ResourceSnapshot::new(self.id, self.name, self.resource_type, status, metrics)
    }
}

/// Source of resource state and metrics.
#[async_trait]
pub trait ResourceMonitor: Send + Sync {
    /// Every resource the monitor knows about.
    async fn resource_ids(&self) -> Result<Vec<String>, MonitorError>;

    /// Read one resource by id or name. `Ok(None)` means no such resource.
    async fn observe(&self, id: &str) -> Result<Option<Observation>, MonitorError>;
}

/// Source of diagnostic context for the planner.
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Error and warning log entries inside `scope`, oldest first.
    async fn error_signals(&self, scope: &FixScope) -> anyhow::Result<Vec<LogEntry>>;

    /// Application configuration relevant to the resources.
    async fn app_config(&self) -> anyhow::Result<serde_json::Value>;
}

/// Signal source with nothing to say.
pub struct NullSignalSource;

#[async_trait]
impl SignalSource for NullSignalSource {
    async fn error_signals(&self, _scope: &FixScope) -> anyhow::Result<Vec<LogEntry>> {
        Ok(Vec::new())
    }

    async fn app_config(&self) -> anyhow::Result<serde_json::Value> {
        Ok(serde_json::Value::Object(Default::default()))
    }
}
