//! The tool capability.

use async_trait::async_trait;
use medic_core::{ParameterSchema, Parameters, ToolDescriptor, ToolResult};

/// A named remediation action.
///
/// Implementations report every failure through [`ToolResult`] and should be
/// safe to run again on a later attempt.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name; the registry key.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameter_schema(&self) -> &ParameterSchema;

    /// Run the action. Parameters have already been checked against the schema.
    async fn execute(&self, params: &Parameters) -> ToolResult;

    /// Catalog entry for the planner.
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameter_schema: self.parameter_schema().clone(),
        }
    }
}
