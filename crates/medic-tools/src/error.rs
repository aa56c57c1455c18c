//! Error types for the tools crate.

use thiserror::Error;

/// Errors raised by registry lookups and parameter validation.
///
/// These never leave [`ToolRegistry::execute_by_name`](crate::ToolRegistry::execute_by_name);
/// it turns them into failed tool results.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    /// Tool not found.
    #[error("tool {name} is not registered")]
    NotFound { name: String },

    /// Invalid arguments for tool.
    #[error("invalid parameters for tool {tool}: {reason}")]
    InvalidParameters { tool: String, reason: String },
}
