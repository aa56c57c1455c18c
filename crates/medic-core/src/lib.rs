//! # medic-core
//!
//! Shared types for the medic remediation engine.
//!
//! - [`resource`]: resource snapshots and the normalized status vocabulary
//! - [`status`]: the status model that turns raw state and metrics into a status
//! - [`tool`]: values crossing the tool boundary (`ToolResult`, schemas, catalog entries)
//! - [`plan`]: remediation plans produced by a planner
//! - [`record`]: attempts and fix records produced by the orchestrator
//! - [`signal`]: log signals collected as diagnostic context
//! - [`config`]: `medic.yaml` configuration

pub mod config;
pub mod plan;
pub mod record;
pub mod resource;
pub mod signal;
pub mod status;
pub mod tool;

pub use config::{
    ConfigError, EvaluationBackend, EvaluationConfig, LogFormat, LoggingConfig, MedicConfig,
    OrchestratorConfig, Threshold, ThresholdPolicy, ToolsConfig,
};
pub use plan::{AttemptFeedback, FixPlan, Step};
pub use record::{
    Attempt, FinalStatus, FixRecord, FixScope, SnapshotMap, StepResult, TimeRange,
    UnresolvedResource,
};
pub use resource::{Metrics, ResourceSnapshot, ResourceStatus, ResourceType};
pub use signal::{LogEntry, LogLevel, select_error_signals};
pub use status::{StatusModel, map_state};
pub use tool::{
    ParameterSchema, ParameterSpec, ParameterType, Parameters, ToolDescriptor, ToolErrorKind,
    ToolResult,
};
