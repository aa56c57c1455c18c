//! Attempts and fix records produced by the orchestrator.

use crate::plan::{FixPlan, Step};
use crate::resource::{ResourceSnapshot, ResourceStatus};
use crate::tool::ToolResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Snapshots keyed by resource name.
pub type SnapshotMap = BTreeMap<String, ResourceSnapshot>;

/// Inclusive time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// What a fix run targets. Empty means every known resource, any time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixScope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
}

impl FixScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn resources<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            resource_ids: Some(ids.into_iter().map(Into::into).collect()),
            time_range: None,
        }
    }

    pub fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    /// Whether `resource` (an id or a name) falls inside the scope.
    pub fn includes(&self, resource: &str) -> bool {
        match &self.resource_ids {
            Some(ids) if !ids.is_empty() => ids.iter().any(|id| id == resource),
            _ => true,
        }
    }
}

/// A plan step paired with the result of executing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step: Step,
    pub result: ToolResult,
}

/// A resource that was unhealthy before an attempt and not healthy after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedResource {
    pub resource: String,
    pub before_status: ResourceStatus,
    pub after_status: ResourceStatus,
}

/// One plan → execute → verify pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    /// 1-based.
    pub attempt_number: u32,
    pub plan: FixPlan,
    #[serde(default)]
    pub step_results: Vec<StepResult>,
    #[serde(default)]
    pub before_snapshot: SnapshotMap,
    #[serde(default)]
    pub after_snapshot: SnapshotMap,
    pub resolved: bool,
    #[serde(default)]
    pub unresolved_resources: Vec<UnresolvedResource>,
    /// Set when context collection, planning or snapshotting failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Attempt {
    /// Attempt that failed before anything was executed.
    pub fn failed(attempt_number: u32, error: impl Into<String>) -> Self {
        Self {
            attempt_number,
            plan: FixPlan::default(),
            step_results: Vec::new(),
            before_snapshot: SnapshotMap::new(),
            after_snapshot: SnapshotMap::new(),
            resolved: false,
            unresolved_resources: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Logical AND of every step's success (true for a plan with no steps).
    pub fn tool_success(&self) -> bool {
        self.step_results.iter().all(|s| s.result.success)
    }

    /// Tool names that were executed, in order.
    pub fn tools_used(&self) -> Vec<String> {
        self.step_results
            .iter()
            .map(|s| s.step.tool_name.clone())
            .collect()
    }
}

/// Terminal outcome of a fix run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalStatus {
    Success,
    FailedAfterRetries,
}

impl std::fmt::Display for FinalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::FailedAfterRetries => write!(f, "FAILED_AFTER_RETRIES"),
        }
    }
}

/// History of one `trigger_fix` call.
///
/// Created when the run starts, grown only by [`FixRecord::push_attempt`] and
/// closed by [`FixRecord::finalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub attempts: Vec<Attempt>,
    pub final_status: FinalStatus,
}

impl Default for FixRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl FixRecord {
    /// Start a new record with a fresh `fix_xxxxxxxx` id.
    pub fn new() -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        Self {
            id: format!("fix_{}", &uuid[..8]),
            timestamp: Utc::now(),
            attempts: Vec::new(),
            final_status: FinalStatus::FailedAfterRetries,
        }
    }

    /// Append a completed attempt.
    pub fn push_attempt(&mut self, attempt: Attempt) {
        self.attempts.push(attempt);
    }

    /// Set the final status from the last attempt.
    pub fn finalize(&mut self) {
        self.final_status = match self.attempts.last() {
            Some(last) if last.resolved => FinalStatus::Success,
            _ => FinalStatus::FailedAfterRetries,
        };
    }

    /// The attempt that resolved the run, if any.
    pub fn resolved_attempt(&self) -> Option<&Attempt> {
        self.attempts.iter().find(|a| a.resolved)
    }

    pub fn is_success(&self) -> bool {
        self.final_status == FinalStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::resource::ResourceType;

    fn resolved_attempt(n: u32) -> Attempt {
        Attempt {
            resolved: true,
            error: None,
            ..Attempt::failed(n, "")
        }
    }

    #[test]
    fn test_record_id_format() {
        let record = FixRecord::new();
        assert!(record.id.starts_with("fix_"));
        assert_eq!(record.id.len(), 12);
        assert!(record.attempts.is_empty());
    }

    #[test]
    fn test_finalize_uses_last_attempt() {
        let mut record = FixRecord::new();
        record.push_attempt(Attempt::failed(1, "planner unavailable"));
        record.finalize();
        assert_eq!(record.final_status, FinalStatus::FailedAfterRetries);

        record.push_attempt(resolved_attempt(2));
        record.finalize();
        assert!(record.is_success());
        assert_eq!(record.resolved_attempt().map(|a| a.attempt_number), Some(2));
    }

    #[test]
    fn test_empty_attempt_has_tool_success() {
        assert!(Attempt::failed(1, "x").tool_success());
    }

    #[test]
    fn test_record_json_shape() {
        let mut record = FixRecord::new();
        let mut attempt = Attempt::failed(1, "boom");
        attempt.before_snapshot.insert(
            "postgres".to_string(),
            ResourceSnapshot::new(
                "c-pg",
                "postgres",
                ResourceType::Postgres,
                ResourceStatus::Failed,
                Default::default(),
            ),
        );
        attempt.unresolved_resources.push(UnresolvedResource {
            resource: "postgres".to_string(),
            before_status: ResourceStatus::Failed,
            after_status: ResourceStatus::Failed,
        });
        record.push_attempt(attempt);
        record.finalize();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["finalStatus"], "FAILED_AFTER_RETRIES");
        assert_eq!(json["attempts"][0]["attemptNumber"], 1);
        assert_eq!(json["attempts"][0]["error"], "boom");
        assert_eq!(
            json["attempts"][0]["unresolvedResources"][0],
            serde_json::json!({
                "resource": "postgres",
                "beforeStatus": "FAILED",
                "afterStatus": "FAILED"
            })
        );
        assert_eq!(json["attempts"][0]["beforeSnapshot"]["postgres"]["status"], "FAILED");

        let back: FixRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_scope_includes() {
        assert!(FixScope::all().includes("anything"));
        let scope = FixScope::resources(["redis"]);
        assert!(scope.includes("redis"));
        assert!(!scope.includes("postgres"));
    }
}
