//! YAML-described resource inventory.
//!
//! An [`Inventory`] holds resources with a raw state, metrics and log lines.
//! It serves as both [`ResourceMonitor`] and [`SignalSource`], and its
//! [`InventoryTool`]s patch resources in place, so a whole fix run can be
//! exercised without touching real infrastructure.
//!
//! ```yaml
//! app_config:
//!   redis: { maxmemory: 256mb }
//! resources:
//!   - id: c-redis
//!     name: redis
//!     image: redis:7
//!     state: running
//!     metrics: { memory_usage_percent: 95 }
//!     logs:
//!       - "ERROR OOM command not allowed when used memory > 'maxmemory'"
//!       - at: 2024-05-01T10:15:00Z
//!         message: "WARNING memory usage above 90%"
//! tools:
//!   - name: cache_flush
//!     description: Flush the redis cache
//!     parameters:
//!       container_name: { type: string, required: true }
//!     target_parameter: container_name
//!     patch:
//!       metrics: { memory_usage_percent: 20 }
//! ```

use crate::error::{InventoryError, MonitorError};
use crate::monitor::{Observation, ResourceMonitor, SignalSource};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use medic_core::{
    FixScope, LogEntry, Metrics, ParameterSchema, Parameters, ResourceType, ToolResult,
    select_error_signals,
};
use medic_tools::{Tool, ToolRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One simulated resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    /// Inferred from `image` and `name` when absent.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<ResourceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default)]
    pub metrics: Metrics,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<LogLine>,
    /// Telemetry reads fail while set.
    #[serde(default)]
    pub unreachable: bool,
}

impl ResourceSpec {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: String::new(),
            resource_type: None,
            state: None,
            metrics: Metrics::new(),
            logs: Vec::new(),
            unreachable: false,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    pub fn with_log(mut self, line: impl Into<String>) -> Self {
        self.logs.push(LogLine::Text(line.into()));
        self
    }

    pub fn with_log_at(mut self, at: DateTime<Utc>, line: impl Into<String>) -> Self {
        self.logs.push(LogLine::Stamped {
            at,
            message: line.into(),
        });
        self
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
            .clone()
            .unwrap_or_else(|| ResourceType::infer(&self.image, &self.name))
    }

    fn matches(&self, key: &str) -> bool {
        self.id == key || self.name == key
    }

    fn apply(&mut self, patch: &ResourcePatch) {
        if let Some(state) = &patch.state {
            self.state = Some(state.clone());
        }
        self.metrics
            .extend(patch.metrics.iter().map(|(k, v)| (k.clone(), *v)));
        if let Some(reachable) = patch.reachable {
            self.unreachable = !reachable;
        }
    }
}

/// A log line. Unstamped lines are dated when the inventory is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogLine {
    Text(String),
    Stamped { at: DateTime<Utc>, message: String },
}

impl LogLine {
    fn timestamp(&self, default: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Text(_) => default,
            Self::Stamped { at, .. } => *at,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Text(message) | Self::Stamped { message, .. } => message,
        }
    }
}

/// Change a tool applies to its target resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourcePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Merged into the resource's metrics.
    #[serde(default)]
    pub metrics: Metrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reachable: Option<bool>,
}

impl ResourcePatch {
    pub fn state(state: impl Into<String>) -> Self {
        Self {
            state: Some(state.into()),
            ..Default::default()
        }
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    fn is_empty(&self) -> bool {
        self.state.is_none() && self.metrics.is_empty() && self.reachable.is_none()
    }
}

/// Declaration of a simulated remediation tool.
///
/// The target is read from `target_parameter` when set, else `target`. A tool
/// with no target and no patch reports success and changes nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: ParameterSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_parameter: Option<String>,
    #[serde(default)]
    pub patch: ResourcePatch,
    /// When false the tool reports a failure and applies nothing.
    #[serde(default = "default_succeeds")]
    pub succeeds: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn default_succeeds() -> bool {
    true
}

impl ToolSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            parameters: ParameterSchema::new(),
            target: None,
            target_parameter: None,
            patch: ResourcePatch::default(),
            succeeds: true,
            message: None,
        }
    }

    pub fn targeting(mut self, target: impl Into<String>, patch: ResourcePatch) -> Self {
        self.target = Some(target.into());
        self.patch = patch;
        self
    }

    pub fn failing(mut self) -> Self {
        self.succeeds = false;
        self
    }
}

#[derive(Debug, Deserialize)]
struct InventoryFile {
    #[serde(default)]
    app_config: serde_json::Value,
    #[serde(default)]
    resources: Vec<ResourceSpec>,
    #[serde(default)]
    tools: Vec<ToolSpec>,
}

#[derive(Debug)]
struct InventoryState {
    resources: Vec<ResourceSpec>,
    app_config: serde_json::Value,
    loaded_at: DateTime<Utc>,
}

/// Shared, mutable set of simulated resources.
#[derive(Debug, Clone)]
pub struct Inventory {
    state: Arc<RwLock<InventoryState>>,
    tools: Arc<Vec<ToolSpec>>,
}

impl Inventory {
    pub fn new(resources: Vec<ResourceSpec>) -> Result<Self, InventoryError> {
        Self::build(resources, serde_json::Value::Null, Vec::new())
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, InventoryError> {
        let file: InventoryFile = serde_yaml::from_str(yaml)?;
        Self::build(file.resources, file.app_config, file.tools)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, InventoryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    fn build(
        resources: Vec<ResourceSpec>,
        app_config: serde_json::Value,
        tools: Vec<ToolSpec>,
    ) -> Result<Self, InventoryError> {
        let mut ids = HashSet::new();
        let mut resource_names = HashSet::new();
        for resource in &resources {
            if !ids.insert(resource.id.as_str()) {
                return Err(InventoryError::Invalid(format!(
                    "duplicate resource id: {}",
                    resource.id
                )));
            }
            // snapshots are keyed by name
            if !resource_names.insert(resource.name.as_str()) {
                return Err(InventoryError::Invalid(format!(
                    "duplicate resource name: {}",
                    resource.name
                )));
            }
        }
        let mut names = HashSet::new();
        for tool in &tools {
            if !names.insert(tool.name.as_str()) {
                return Err(InventoryError::Invalid(format!(
                    "duplicate tool name: {}",
                    tool.name
                )));
            }
        }

        Ok(Self {
            state: Arc::new(RwLock::new(InventoryState {
                resources,
                app_config,
                loaded_at: Utc::now(),
            })),
            tools: Arc::new(tools),
        })
    }

    /// Attach application configuration served to the planner.
    pub async fn set_app_config(&self, app_config: serde_json::Value) {
        self.state.write().await.app_config = app_config;
    }

    /// Current state of a resource, by id or name.
    pub async fn resource(&self, key: &str) -> Option<ResourceSpec> {
        self.state
            .read()
            .await
            .resources
            .iter()
            .find(|r| r.matches(key))
            .cloned()
    }

    /// Apply `patch` to the resource with id or name `key`. Returns whether it exists.
    pub async fn patch(&self, key: &str, patch: &ResourcePatch) -> bool {
        let mut state = self.state.write().await;
        match state.resources.iter_mut().find(|r| r.matches(key)) {
            Some(resource) => {
                resource.apply(patch);
                true
            }
            None => false,
        }
    }

    /// A tool acting on this inventory.
    pub fn tool(&self, spec: ToolSpec) -> InventoryTool {
        InventoryTool {
            spec,
            inventory: self.clone(),
        }
    }

    /// Tools declared in the inventory file.
    pub fn tools(&self) -> Vec<InventoryTool> {
        self.tools.iter().cloned().map(|spec| self.tool(spec)).collect()
    }

    /// Register every declared tool.
    pub fn register_tools(&self, registry: &mut ToolRegistry) {
        for tool in self.tools() {
            registry.register(tool);
        }
    }
}

#[async_trait]
impl ResourceMonitor for Inventory {
    async fn resource_ids(&self) -> Result<Vec<String>, MonitorError> {
        Ok(self
            .state
            .read()
            .await
            .resources
            .iter()
            .map(|r| r.id.clone())
            .collect())
    }

    async fn observe(&self, id: &str) -> Result<Option<Observation>, MonitorError> {
        let Some(resource) = self.resource(id).await else {
            return Ok(None);
        };
        if resource.unreachable {
            return Err(MonitorError::Unavailable {
                resource: resource.name,
                reason: "telemetry endpoint not reachable".to_string(),
            });
        }
        Ok(Some(Observation {
            resource_type: resource.resource_type(),
            id: resource.id,
            name: resource.name,
            raw_state: resource.state,
            metrics: resource.metrics,
        }))
    }
}

#[async_trait]
impl SignalSource for Inventory {
    async fn error_signals(&self, scope: &FixScope) -> anyhow::Result<Vec<LogEntry>> {
        let state = self.state.read().await;
        let mut entries = Vec::new();
        for resource in &state.resources {
            for (index, line) in resource.logs.iter().enumerate() {
                let mut entry = LogEntry::from_line(
                    format!("{}-{}", resource.id, index),
                    resource.id.clone(),
                    line.timestamp(state.loaded_at),
                    line.message(),
                );
                if !scope.includes(&entry.resource_id) && scope.includes(&resource.name) {
                    entry.resource_id = resource.name.clone();
                }
                entries.push(entry);
            }
        }
        Ok(select_error_signals(&entries, scope))
    }

    async fn app_config(&self) -> anyhow::Result<serde_json::Value> {
        Ok(self.state.read().await.app_config.clone())
    }
}

/// Remediation tool that patches an [`Inventory`].
pub struct InventoryTool {
    spec: ToolSpec,
    inventory: Inventory,
}

impl InventoryTool {
    fn target(&self, params: &Parameters) -> Option<String> {
        self.spec
            .target_parameter
            .as_ref()
            .and_then(|p| params.get(p))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| self.spec.target.clone())
    }
}

#[async_trait]
impl Tool for InventoryTool {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn description(&self) -> &str {
        &self.spec.description
    }

    fn parameter_schema(&self) -> &ParameterSchema {
        &self.spec.parameters
    }

    async fn execute(&self, params: &Parameters) -> ToolResult {
        if !self.spec.succeeds {
            let message = self
                .spec
                .message
                .clone()
                .unwrap_or_else(|| format!("{} failed", self.spec.name));
            return ToolResult::failed(message, "simulated failure");
        }

        let target = self.target(params);
        if let Some(target) = &target {
            if !self.spec.patch.is_empty() && !self.inventory.patch(target, &self.spec.patch).await
            {
                return ToolResult::failed(
                    format!("Resource not found: {}", target),
                    "ResourceNotFound",
                );
            }
        }

        let message = self.spec.message.clone().unwrap_or_else(|| match &target {
            Some(target) => format!("{} applied to {}", self.spec.name, target),
            None => format!("{} completed", self.spec.name),
        });
        let mut data = serde_json::Map::new();
        if let Some(target) = target {
            data.insert("target".to_string(), serde_json::Value::String(target));
        }
        ToolResult::ok_with_data(message, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medic_core::TimeRange;
    use serde_json::json;

    const INVENTORY: &str = r#"
app_config:
  redis: { maxmemory: 256mb }
resources:
  - id: c-redis
    name: redis
    image: redis:7
    state: running
    metrics: { memory_usage_percent: 95 }
    logs:
      - "ERROR OOM command not allowed"
      - "Ready to accept connections"
  - id: c-pg
    name: postgres
    image: postgres:15
    state: exited (1) 3 minutes ago
tools:
  - name: cache_flush
    description: Flush the redis cache
    parameters:
      container_name: { type: string, required: true }
    target_parameter: container_name
    patch:
      metrics: { memory_usage_percent: 20 }
  - name: noop
"#;

    #[tokio::test]
    async fn test_load_and_observe() {
        let inventory = Inventory::from_yaml(INVENTORY).unwrap();
        assert_eq!(
            inventory.resource_ids().await.unwrap(),
            vec!["c-redis", "c-pg"]
        );

        let redis = inventory.observe("redis").await.unwrap().unwrap();
        assert_eq!(redis.id, "c-redis");
        assert_eq!(redis.resource_type, ResourceType::Redis);
        assert_eq!(redis.raw_state.as_deref(), Some("running"));
        assert!(inventory.observe("missing").await.unwrap().is_none());
        assert_eq!(
            inventory.app_config().await.unwrap(),
            json!({"redis": {"maxmemory": "256mb"}})
        );
    }

    #[tokio::test]
    async fn test_tool_patches_target_from_parameter() {
        let inventory = Inventory::from_yaml(INVENTORY).unwrap();
        let mut registry = ToolRegistry::new();
        inventory.register_tools(&mut registry);
        assert_eq!(registry.names(), vec!["cache_flush", "noop"]);

        let params = json!({"container_name": "redis"}).as_object().cloned().unwrap();
        let result = registry.execute_by_name("cache_flush", &params).await;
        assert!(result.success, "{}", result.message);
        assert_eq!(result.data["target"], "redis");

        let redis = inventory.resource("c-redis").await.unwrap();
        assert_eq!(redis.metrics["memory_usage_percent"], 20.0);
    }

    #[tokio::test]
    async fn test_tool_with_unknown_target_fails() {
        let inventory = Inventory::from_yaml(INVENTORY).unwrap();
        let tool = inventory.tool(
            ToolSpec::new("restart").targeting("nginx", ResourcePatch::state("running")),
        );
        let result = tool.execute(&Parameters::new()).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("ResourceNotFound"));
    }

    #[tokio::test]
    async fn test_failing_tool_leaves_state() {
        let inventory = Inventory::from_yaml(INVENTORY).unwrap();
        let tool = inventory.tool(
            ToolSpec::new("restart")
                .targeting("postgres", ResourcePatch::state("running"))
                .failing(),
        );
        assert!(!tool.execute(&Parameters::new()).await.success);
        let pg = inventory.resource("postgres").await.unwrap();
        assert_eq!(pg.state.as_deref(), Some("exited (1) 3 minutes ago"));
    }

    #[tokio::test]
    async fn test_unreachable_resource() {
        let inventory = Inventory::new(vec![ResourceSpec {
            unreachable: true,
            ..ResourceSpec::new("vm-1", "web")
        }])
        .unwrap();
        assert!(matches!(
            inventory.observe("vm-1").await,
            Err(MonitorError::Unavailable { .. })
        ));

        inventory
            .patch(
                "web",
                &ResourcePatch {
                    reachable: Some(true),
                    ..Default::default()
                },
            )
            .await;
        assert!(inventory.observe("vm-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_error_signals_scoped_by_id_or_name() {
        let inventory = Inventory::from_yaml(INVENTORY).unwrap();

        let all = inventory.error_signals(&FixScope::all()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].resource_id, "c-redis");

        let by_name = inventory
            .error_signals(&FixScope::resources(["redis"]))
            .await
            .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].resource_id, "redis");

        let other = inventory
            .error_signals(&FixScope::resources(["c-pg"]))
            .await
            .unwrap();
        assert!(other.is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = Inventory::new(vec![
            ResourceSpec::new("a", "one"),
            ResourceSpec::new("a", "two"),
        ]);
        assert!(matches!(result, Err(InventoryError::Invalid(_))));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = Inventory::new(vec![
            ResourceSpec::new("c-1", "redis"),
            ResourceSpec::new("c-2", "redis"),
        ]);
        match result {
            Err(InventoryError::Invalid(reason)) => {
                assert_eq!(reason, "duplicate resource name: redis")
            }
            other => panic!("expected duplicate name error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_stamped_logs_filtered_by_time_range() {
        let now = Utc::now();
        let inventory = Inventory::from_yaml(&format!(
            r#"
resources:
  - id: c-redis
    name: redis
    logs:
      - at: {old}
        message: "ERROR OOM command not allowed"
      - at: {recent}
        message: "WARNING memory usage above 90%"
      - "ERROR unstamped failure"
"#,
            old = (now - chrono::Duration::hours(3)).to_rfc3339(),
            recent = (now - chrono::Duration::minutes(5)).to_rfc3339(),
        ))
        .unwrap();

        let all = inventory.error_signals(&FixScope::all()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].message, "ERROR OOM command not allowed");

        let last_hour = FixScope::all().with_time_range(TimeRange {
            start: now - chrono::Duration::hours(1),
            end: now - chrono::Duration::minutes(1),
        });
        let recent = inventory.error_signals(&last_hour).await.unwrap();
        let messages: Vec<&str> = recent.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["WARNING memory usage above 90%"]);
    }
}
