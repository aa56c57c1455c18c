//! Planner that replays a fixed sequence of plans.

use crate::{Planner, PlanningContext, parse_plan_response};
use anyhow::Context;
use async_trait::async_trait;
use medic_core::{AttemptFeedback, FixPlan};
use serde::Deserialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Returns one plan per call, repeating the last once the script runs out.
///
/// Every context it receives is kept so callers can inspect the feedback the
/// orchestrator sent.
#[derive(Debug, Default)]
pub struct ScriptedPlanner {
    plans: Vec<FixPlan>,
    seen: Mutex<Vec<PlanningContext>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScriptFile {
    Many { plans: Vec<ScriptEntry> },
    One(FixPlan),
}

/// A plan, or a raw planner response recorded as text.
#[derive(Deserialize)]
#[serde(untagged)]
enum ScriptEntry {
    Plan(FixPlan),
    Response(String),
}

impl ScriptEntry {
    fn into_plan(self) -> anyhow::Result<FixPlan> {
        match self {
            Self::Plan(plan) => Ok(plan),
            Self::Response(text) => parse_plan_response(&text),
        }
    }
}

impl ScriptedPlanner {
    pub fn new(plans: Vec<FixPlan>) -> Self {
        Self {
            plans,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Same plan on every call.
    pub fn repeating(plan: FixPlan) -> Self {
        Self::new(vec![plan])
    }

    /// Load a script from YAML: either a single plan or `plans: [...]`.
    ///
    /// Entries of `plans` may also be strings holding a recorded planner
    /// response, parsed with [`parse_plan_response`].
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let script: ScriptFile = serde_yaml::from_str(yaml).context("invalid plan script")?;
        Ok(match script {
            ScriptFile::Many { plans } => Self::new(
                plans
                    .into_iter()
                    .enumerate()
                    .map(|(i, entry)| {
                        entry
                            .into_plan()
                            .with_context(|| format!("invalid response for plan {}", i + 1))
                    })
                    .collect::<anyhow::Result<Vec<_>>>()?,
            ),
            ScriptFile::One(plan) => Self::repeating(plan),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read plan script {}", path.display()))?;
        Self::from_yaml(&yaml)
    }

    /// Number of times `analyze` has been called.
    pub fn calls(&self) -> usize {
        self.seen().len()
    }

    /// Contexts received, in call order.
    pub fn contexts(&self) -> Vec<PlanningContext> {
        self.seen().clone()
    }

    /// Feedback received on each call, in call order.
    pub fn feedback_history(&self) -> Vec<Option<AttemptFeedback>> {
        self.seen().iter().map(|c| c.feedback.clone()).collect()
    }

    fn seen(&self) -> MutexGuard<'_, Vec<PlanningContext>> {
        self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Planner for ScriptedPlanner {
    async fn analyze(&self, context: &PlanningContext) -> anyhow::Result<FixPlan> {
        let call = {
            let mut seen = self.seen();
            seen.push(context.clone());
            seen.len() - 1
        };

        let plan = self
            .plans
            .get(call)
            .or_else(|| self.plans.last())
            .cloned()
            .context("plan script is empty")?;
        tracing::debug!(call = call + 1, steps = plan.steps.len(), "scripted plan");
        Ok(plan)
    }
}
