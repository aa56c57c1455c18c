//! Planner contract.
//!
//! A planner turns diagnostic context into a [`FixPlan`]. How it reasons is
//! its own business; the orchestrator only sees the plan and treats it as
//! untrusted input.

mod response;
mod scripted;

pub use response::parse_plan_response;
pub use scripted::ScriptedPlanner;

use async_trait::async_trait;
use medic_core::{AttemptFeedback, FixPlan, LogEntry, SnapshotMap, ToolDescriptor};
use serde::Serialize;

/// Everything the planner is given for one attempt.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningContext {
    pub signals: Vec<LogEntry>,
    pub app_config: serde_json::Value,
    pub tool_catalog: Vec<ToolDescriptor>,
    pub snapshots: SnapshotMap,
    /// Present from the second attempt on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<AttemptFeedback>,
}

#[async_trait]
pub trait Planner: Send + Sync {
    async fn analyze(&self, context: &PlanningContext) -> anyhow::Result<FixPlan>;
}

/// Stub planner: returns an empty plan.
pub struct NoopPlanner;

#[async_trait]
impl Planner for NoopPlanner {
    async fn analyze(&self, context: &PlanningContext) -> anyhow::Result<FixPlan> {
        tracing::debug!(
            resources = context.snapshots.len(),
            tools = context.tool_catalog.len(),
            "noop planner invoked"
        );
        Ok(FixPlan {
            root_cause: "planner not configured".to_string(),
            reasoning: "noop planner".to_string(),
            steps: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medic_core::UnresolvedResource;

    #[tokio::test]
    async fn test_noop_planner_returns_empty_plan() {
        let plan = NoopPlanner.analyze(&PlanningContext::default()).await.unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.root_cause, "planner not configured");
    }

    #[test]
    fn test_context_serializes_feedback_only_when_present() {
        let json = serde_json::to_value(PlanningContext::default()).unwrap();
        assert!(json.get("feedback").is_none());
        assert!(json.get("toolCatalog").is_some());

        let context = PlanningContext {
            feedback: Some(AttemptFeedback::new(
                1,
                vec!["restart_container".to_string()],
                vec![UnresolvedResource {
                    resource: "postgres".to_string(),
                    before_status: medic_core::ResourceStatus::Failed,
                    after_status: medic_core::ResourceStatus::Failed,
                }],
            )),
            ..Default::default()
        };
        let json = serde_json::to_value(&context).unwrap();
        assert_eq!(json["feedback"]["attemptNumber"], 1);
        assert_eq!(json["feedback"]["toolsUsed"][0], "restart_container");
    }
}
