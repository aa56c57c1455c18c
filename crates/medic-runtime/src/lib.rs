//! # medic-runtime
//!
//! The remediation loop.
//!
//! [`Orchestrator::trigger_fix`] collects snapshots, signals and the tool
//! catalog, asks the planner for a plan, executes it through the registry and
//! re-measures the resources it was asked to fix, retrying with feedback until
//! the unhealthy resources are healthy or the retry budget runs out. The
//! resulting [`FixRecord`](medic_core::FixRecord) is persisted once and
//! returned.
//!
//! Telemetry enters through [`ResourceMonitor`] and [`SignalSource`].
//! [`inventory`] provides a YAML-described implementation of both, together
//! with tools that mutate it.

pub mod error;
pub mod inventory;
pub mod monitor;
pub mod orchestrator;

pub use error::{InventoryError, MonitorError, OrchestratorError};
pub use inventory::{Inventory, InventoryTool, LogLine, ResourcePatch, ResourceSpec, ToolSpec};
pub use monitor::{NullSignalSource, Observation, ResourceMonitor, SignalSource};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
