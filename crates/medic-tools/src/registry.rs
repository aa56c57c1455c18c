//! Tool registry.
//!
//! Name-keyed catalog of [`Tool`]s. Registering a name twice replaces the
//! earlier tool.

use crate::error::ToolError;
use crate::tool::Tool;
use futures::FutureExt;
use medic_core::{ParameterSchema, Parameters, ToolDescriptor, ToolErrorKind, ToolResult};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Registry of available remediation tools.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    timeout: Duration,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Bound every invocation by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register a tool, replacing any tool already registered under its name.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.register_arc(Arc::new(tool));
    }

    /// Register a shared tool.
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::warn!(tool = %name, "Replaced previously registered tool");
        } else {
            tracing::debug!(tool = %name, "Registered tool");
        }
    }

    /// Get a tool by name.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::NotFound {
                name: name.to_string(),
            })
    }

    /// Check if a tool exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Catalog for the planner, sorted by name.
    pub fn list_for_planner(&self) -> Vec<ToolDescriptor> {
        let mut catalog: Vec<ToolDescriptor> =
            self.tools.values().map(|tool| tool.descriptor()).collect();
        catalog.sort_by(|a, b| a.name.cmp(&b.name));
        catalog
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Get tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Resolve `name` and run it.
    ///
    /// Never fails: an unknown name returns a `ToolNotFound` result without
    /// touching any tool, and invalid parameters, panics and timeouts are
    /// reported as failed results.
    pub async fn execute_by_name(&self, name: &str, params: &Parameters) -> ToolResult {
        let tool = match self.lookup(name) {
            Ok(tool) => tool,
            Err(e) => {
                tracing::warn!(error = %e, "Plan referenced an unregistered tool");
                return ToolResult::not_found(name);
            }
        };

        if let Err(reason) = validate_parameters(tool.parameter_schema(), params) {
            let e = ToolError::InvalidParameters {
                tool: name.to_string(),
                reason,
            };
            tracing::warn!(tool = %name, error = %e, "Rejected tool parameters");
            return ToolResult::failure(ToolErrorKind::InvalidParameters, e.to_string());
        }

        tracing::info!(tool = %name, params = %serde_json::Value::Object(params.clone()), "Executing tool");

        let guarded = AssertUnwindSafe(tool.execute(params)).catch_unwind();
        let result = match tokio::time::timeout(self.timeout, guarded).await {
            Ok(Ok(result)) => result,
            Ok(Err(_panic)) => {
                tracing::error!(tool = %name, "Tool panicked during execution");
                ToolResult::failure(
                    ToolErrorKind::ToolExecutionError,
                    format!("Error executing tool: {} panicked", name),
                )
            }
            Err(_elapsed) => {
                tracing::error!(tool = %name, timeout_ms = self.timeout.as_millis() as u64, "Tool timed out");
                ToolResult::failure(
                    ToolErrorKind::Timeout,
                    format!("Tool {} timed out after {:?}", name, self.timeout),
                )
            }
        };

        if !result.success {
            tracing::warn!(
                tool = %name,
                message = %result.message,
                error = result.error.as_deref().unwrap_or(""),
                "Tool reported failure"
            );
        }
        result
    }
}

/// Check `params` against a tool's declared schema.
///
/// Required parameters must be present and non-null; any declared parameter
/// that is present must match its type. Undeclared parameters pass through.
pub fn validate_parameters(schema: &ParameterSchema, params: &Parameters) -> Result<(), String> {
    for (field, spec) in schema {
        match params.get(field) {
            None | Some(serde_json::Value::Null) if spec.required => {
                return Err(format!("Missing required field: {}", field));
            }
            Some(value) if !value.is_null() && !spec.param_type.accepts(value) => {
                return Err(format!(
                    "Invalid value for '{}': expected {:?}, got {}",
                    field, spec.param_type, value
                ));
            }
            _ => {}
        }
    }
    Ok(())
}
