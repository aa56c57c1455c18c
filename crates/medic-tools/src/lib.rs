//! # medic-tools
//!
//! The remediation action abstraction.
//!
//! Every remediation action implements [`Tool`]; a [`ToolRegistry`] resolves
//! actions by name and executes them. The registry never lets a failure escape
//! as an error: unknown tools, bad parameters, panics and timeouts all come
//! back as a failed [`ToolResult`](medic_core::ToolResult).
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use medic_tools::ToolRegistry;
//! use serde_json::Map;
//!
//! # async fn example() {
//! let registry = ToolRegistry::new();
//! let result = registry.execute_by_name("does_not_exist", &Map::new()).await;
//! assert_eq!(result.error.as_deref(), Some("ToolNotFound"));
//! # }
//! ```

pub mod error;
pub mod registry;
pub mod tool;

pub use error::ToolError;
pub use registry::{ToolRegistry, validate_parameters};
pub use tool::Tool;
