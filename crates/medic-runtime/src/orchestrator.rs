//! Plan → execute → verify loop with retries.

use crate::error::{MonitorError, OrchestratorError};
use crate::monitor::{NullSignalSource, ResourceMonitor, SignalSource};
use futures::FutureExt;
use futures::future::join_all;
use medic_core::{
    Attempt, AttemptFeedback, FixPlan, FixRecord, FixScope, LogEntry, OrchestratorConfig,
    ResourceSnapshot, ResourceStatus, ResourceType, SnapshotMap, StatusModel, StepResult, ToolDescriptor,
    UnresolvedResource,
};
use medic_evaluation::{EvaluationSink, NullStore};
use medic_planner::{Planner, PlanningContext};
use medic_tools::ToolRegistry;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Drives fix runs. Build one with [`Orchestrator::builder`].
pub struct Orchestrator {
    planner: Arc<dyn Planner>,
    registry: Arc<ToolRegistry>,
    monitor: Arc<dyn ResourceMonitor>,
    signals: Arc<dyn SignalSource>,
    sink: Arc<dyn EvaluationSink>,
    status_model: StatusModel,
    config: OrchestratorConfig,
}

/// Builder for [`Orchestrator`].
///
/// Planner, registry and monitor are required. Signals default to
/// [`NullSignalSource`], the sink to [`NullStore`].
#[derive(Default)]
pub struct OrchestratorBuilder {
    planner: Option<Arc<dyn Planner>>,
    registry: Option<Arc<ToolRegistry>>,
    monitor: Option<Arc<dyn ResourceMonitor>>,
    signals: Option<Arc<dyn SignalSource>>,
    sink: Option<Arc<dyn EvaluationSink>>,
    status_model: StatusModel,
    config: OrchestratorConfig,
}

impl OrchestratorBuilder {
    pub fn planner(mut self, planner: Arc<dyn Planner>) -> Self {
        self.planner = Some(planner);
        self
    }

    pub fn registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn monitor(mut self, monitor: Arc<dyn ResourceMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn signals(mut self, signals: Arc<dyn SignalSource>) -> Self {
        self.signals = Some(signals);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn EvaluationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn status_model(mut self, status_model: StatusModel) -> Self {
        self.status_model = status_model;
        self
    }

    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Orchestrator, OrchestratorError> {
        Ok(Orchestrator {
            planner: self.planner.ok_or(OrchestratorError::MissingPlanner)?,
            registry: self.registry.ok_or(OrchestratorError::MissingRegistry)?,
            monitor: self.monitor.ok_or(OrchestratorError::MissingMonitor)?,
            signals: self.signals.unwrap_or_else(|| Arc::new(NullSignalSource)),
            sink: self.sink.unwrap_or_else(|| Arc::new(NullStore)),
            status_model: self.status_model,
            config: self.config,
        })
    }
}

/// Identity of a resource in scope, remembered so an unreadable resource can
/// still be reported under its name.
#[derive(Debug, Clone)]
struct Target {
    id: String,
    name: String,
    resource_type: ResourceType,
}

/// Context gathered once per run.
struct Collected {
    targets: Vec<Target>,
    snapshots: SnapshotMap,
    /// Names unhealthy at collection time. Every attempt verifies these.
    watched: Vec<String>,
    signals: Vec<LogEntry>,
    app_config: serde_json::Value,
    tool_catalog: Vec<ToolDescriptor>,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// [`trigger_fix`](Self::trigger_fix) with the configured retry budget.
    pub async fn run(&self, scope: &FixScope) -> FixRecord {
        self.trigger_fix(scope, self.config.max_retries).await
    }

    /// Run up to `max_retries + 1` attempts against `scope`.
    ///
    /// Always returns a record: collection, planner and tool failures are
    /// recorded on the attempt they happened in, and a failure to persist the
    /// record is only logged.
    pub async fn trigger_fix(&self, scope: &FixScope, max_retries: u32) -> FixRecord {
        let record = FixRecord::new();
        let span = tracing::info_span!("fix", fix_id = %record.id);
        self.drive(record, scope, max_retries).instrument(span).await
    }

    async fn drive(&self, mut record: FixRecord, scope: &FixScope, max_retries: u32) -> FixRecord {
        let total = max_retries + 1;
        tracing::info!(max_retries, "Starting fix workflow");

        let mut collected: Option<Collected> = None;
        let mut baseline: Option<SnapshotMap> = None;
        let mut feedback: Option<AttemptFeedback> = None;

        for attempt_number in 1..=total {
            tracing::info!(attempt = attempt_number, total, "Fix attempt");

            if collected.is_none() {
                match self.collect(scope).await {
                    Ok(context) => collected = Some(context),
                    Err(e) => {
                        tracing::error!(attempt = attempt_number, error = %e, "Failed to collect context");
                        record.push_attempt(Attempt::failed(
                            attempt_number,
                            format!("context collection failed: {}", e),
                        ));
                        feedback =
                            Some(AttemptFeedback::new(attempt_number, Vec::new(), Vec::new()));
                        if attempt_number < total {
                            pause(self.config.retry_backoff()).await;
                        }
                        continue;
                    }
                }
            }
            let Some(context) = collected.as_ref() else {
                continue;
            };

            let before = baseline.take().unwrap_or_else(|| context.snapshots.clone());
            let attempt = self
                .attempt(attempt_number, context, before, feedback.take())
                .await;

            if attempt.resolved {
                tracing::info!(attempt = attempt_number, "Fix successful");
                record.push_attempt(attempt);
                break;
            }

            feedback = Some(AttemptFeedback::new(
                attempt_number,
                attempt.tools_used(),
                attempt.unresolved_resources.clone(),
            ));
            baseline = Some(attempt.after_snapshot.clone());
            record.push_attempt(attempt);

            if attempt_number < total {
                tracing::warn!(attempt = attempt_number, "Fix attempt did not resolve issues, retrying");
                pause(self.config.retry_backoff()).await;
            } else {
                tracing::warn!(attempts = total, "All fix attempts completed, issues not resolved");
            }
        }

        record.finalize();

        if let Err(e) = self.sink.store(&record).await {
            tracing::warn!(error = %e, "Failed to persist fix record");
        }

        tracing::info!(
            final_status = %record.final_status,
            attempts = record.attempts.len(),
            "Fix workflow completed"
        );
        record
    }

    async fn attempt(
        &self,
        attempt_number: u32,
        context: &Collected,
        before: SnapshotMap,
        feedback: Option<AttemptFeedback>,
    ) -> Attempt {
        if feedback.is_some() {
            tracing::info!(attempt = attempt_number, "Previous attempt failed, asking for a different approach");
        }

        let planning = PlanningContext {
            signals: context.signals.clone(),
            app_config: context.app_config.clone(),
            tool_catalog: context.tool_catalog.clone(),
            snapshots: before.clone(),
            feedback,
        };

        let analyzed = AssertUnwindSafe(self.planner.analyze(&planning))
            .catch_unwind()
            .await;
        let (plan, error) = match analyzed {
            Ok(Ok(plan)) => {
                tracing::info!(
                    attempt = attempt_number,
                    root_cause = %plan.root_cause,
                    tools = ?plan.tool_names(),
                    "Fix plan created"
                );
                (plan, None)
            }
            Ok(Err(e)) => {
                tracing::error!(attempt = attempt_number, error = %e, "Planner failed");
                (FixPlan::default(), Some(format!("planner failed: {:#}", e)))
            }
            Err(panic) => {
                let reason = panic_message(&*panic);
                tracing::error!(attempt = attempt_number, panic = %reason, "Planner panicked");
                (FixPlan::default(), Some(format!("planner failed: panicked: {}", reason)))
            }
        };

        let mut step_results = Vec::with_capacity(plan.steps.len());
        for step in &plan.steps {
            let result = self
                .registry
                .execute_by_name(&step.tool_name, &step.parameters)
                .await;
            step_results.push(StepResult {
                step: step.clone(),
                result,
            });
        }

        pause(self.config.settle_delay()).await;

        let after = self.snapshot(&context.targets).await;
        let unresolved_resources = unresolved(&context.watched, &before, &after);
        for entry in &unresolved_resources {
            tracing::warn!(
                resource = %entry.resource,
                before = %entry.before_status,
                after = %entry.after_status,
                "Resource still unhealthy"
            );
        }

        let tool_success = step_results.iter().all(|s| s.result.success);
        let resolved = error.is_none() && tool_success && unresolved_resources.is_empty();

        Attempt {
            attempt_number,
            plan,
            step_results,
            before_snapshot: before,
            after_snapshot: after,
            resolved,
            unresolved_resources,
            error,
        }
    }

    async fn collect(&self, scope: &FixScope) -> Result<Collected, MonitorError> {
        let ids = match &scope.resource_ids {
            Some(ids) if !ids.is_empty() => ids.clone(),
            _ => self.monitor.resource_ids().await?,
        };

        let observations = join_all(ids.iter().map(|id| self.observe(id, None))).await;
        let mut targets = Vec::with_capacity(ids.len());
        let mut snapshots = SnapshotMap::new();
        for (id, observed) in ids.iter().zip(observations) {
            let Some(snapshot) = observed else {
                tracing::warn!(resource = %id, "Resource not found, excluding from scope");
                continue;
            };
            targets.push(Target {
                id: id.clone(),
                name: snapshot.name.clone(),
                resource_type: snapshot.resource_type.clone(),
            });
            snapshots.insert(snapshot.name.clone(), snapshot);
        }

        let names: Vec<&str> = snapshots.keys().map(String::as_str).collect();
        tracing::info!(count = snapshots.len(), resources = ?names, "Collected resource status");
        let watched: Vec<String> = snapshots
            .values()
            .filter(|s| s.status.is_unhealthy())
            .map(|s| s.name.clone())
            .collect();
        if !watched.is_empty() {
            tracing::warn!(resources = ?watched, "Found degraded/failed resources");
        }

        let signals = self.signals.error_signals(scope).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to collect error signals");
            Vec::new()
        });
        tracing::info!(count = signals.len(), "Collected error signals");

        let app_config = self.signals.app_config().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to collect application config");
            serde_json::Value::Null
        });

        let tool_catalog = self.registry.list_for_planner();
        tracing::info!(count = tool_catalog.len(), "Collected tool catalog");

        Ok(Collected {
            targets,
            snapshots,
            watched,
            signals,
            app_config,
            tool_catalog,
        })
    }

    /// Fresh snapshot of every target. Resources that disappeared are left out.
    async fn snapshot(&self, targets: &[Target]) -> SnapshotMap {
        let observations =
            join_all(targets.iter().map(|t| self.observe(&t.id, Some(t)))).await;
        targets
            .iter()
            .zip(observations)
            .filter_map(|(target, observed)| {
                if observed.is_none() {
                    tracing::warn!(resource = %target.name, "Resource disappeared during fix");
                }
                observed
            })
            .map(|snapshot| (snapshot.name.clone(), snapshot))
            .collect()
    }

    async fn observe(&self, id: &str, known: Option<&Target>) -> Option<ResourceSnapshot> {
        let observed = AssertUnwindSafe(self.monitor.observe(id))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(MonitorError::Unavailable {
                    resource: id.to_string(),
                    reason: format!("monitor panicked: {}", panic_message(&*panic)),
                })
            });
        match observed {
            Ok(Some(observation)) => Some(observation.classify(&self.status_model)),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(resource = %id, error = %e, "Telemetry unavailable, marking UNKNOWN");
                Some(match known {
                    Some(t) => ResourceSnapshot::unavailable(&t.id, &t.name, t.resource_type.clone()),
                    None => ResourceSnapshot::unavailable(id, id, ResourceType::Other("unknown".into())),
                })
            }
        }
    }
}

/// Watched resources that are not healthy in `after`.
///
/// The before status comes from `before`, the baseline of this attempt. A
/// resource missing from either map counts as `UNKNOWN` there.
fn unresolved(
    watched: &[String],
    before: &SnapshotMap,
    after: &SnapshotMap,
) -> Vec<UnresolvedResource> {
    let status = |map: &SnapshotMap, name: &str| {
        map.get(name)
            .map(|s| s.status.clone())
            .unwrap_or(ResourceStatus::Unknown)
    };
    watched
        .iter()
        .filter_map(|name| {
            let after_status = status(after, name);
            (!after_status.is_healthy()).then(|| UnresolvedResource {
                resource: name.clone(),
                before_status: status(before, name),
                after_status,
            })
        })
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
