//! Remediation plans.
//!
//! A [`FixPlan`] comes from the planner and is untrusted: tool names are only
//! checked when a step is executed through the registry, and a plan may have
//! no steps at all.

use crate::record::UnresolvedResource;
use crate::tool::Parameters;
use serde::{Deserialize, Serialize};

/// One tool invocation requested by a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(alias = "tool_name", alias = "tool")]
    pub tool_name: String,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default)]
    pub description: String,
}

impl Step {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            parameters: Parameters::new(),
            description: String::new(),
        }
    }
}

/// Plan returned by the planner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixPlan {
    #[serde(default, alias = "root_cause")]
    pub root_cause: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl FixPlan {
    /// Plan with no steps.
    pub fn empty(root_cause: impl Into<String>) -> Self {
        Self {
            root_cause: root_cause.into(),
            ..Default::default()
        }
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Tool names in plan order.
    pub fn tool_names(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.tool_name.clone()).collect()
    }
}

/// What the planner is told about the previous, unresolved attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptFeedback {
    pub attempt_number: u32,
    pub tools_used: Vec<String>,
    pub unresolved_resources: Vec<UnresolvedResource>,
    pub message: String,
}

impl AttemptFeedback {
    pub fn new(
        attempt_number: u32,
        tools_used: Vec<String>,
        unresolved_resources: Vec<UnresolvedResource>,
    ) -> Self {
        Self {
            attempt_number,
            tools_used,
            unresolved_resources,
            message: format!(
                "Previous attempt {} did not resolve the issue. Please try a different approach.",
                attempt_number
            ),
        }
    }
}
