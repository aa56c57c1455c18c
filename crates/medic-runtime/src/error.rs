use thiserror::Error;

/// Construction-time faults. Once built, an orchestrator never fails a run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("no planner configured")]
    MissingPlanner,

    #[error("no tool registry configured")]
    MissingRegistry,

    #[error("no resource monitor configured")]
    MissingMonitor,
}

/// Telemetry failures.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Telemetry for one resource could not be read.
    #[error("resource {resource} unavailable: {reason}")]
    Unavailable { resource: String, reason: String },

    /// The set of known resources could not be listed.
    #[error("failed to list resources: {0}")]
    Listing(String),
}

/// Errors loading an inventory description.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid inventory: {0}")]
    Invalid(String),
}
