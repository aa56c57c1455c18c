//! Values that cross the tool boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Tool parameters as a JSON object.
pub type Parameters = serde_json::Map<String, Value>;

/// Declared parameters of a tool, keyed by parameter name.
pub type ParameterSchema = BTreeMap<String, ParameterSpec>;

/// Kind of failure recorded in [`ToolResult::error`] by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolErrorKind {
    /// The plan referenced a tool that is not registered.
    ToolNotFound,
    /// Required parameter missing or of the wrong type.
    InvalidParameters,
    /// The tool itself failed in a way it did not report.
    ToolExecutionError,
    /// The tool exceeded its time budget.
    Timeout,
}

impl ToolErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToolNotFound => "ToolNotFound",
            Self::InvalidParameters => "InvalidParameters",
            Self::ToolExecutionError => "ToolExecutionError",
            Self::Timeout => "Timeout",
        }
    }
}

impl fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a tool invocation. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Map<String, Value>,
    #[serde(default)]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ToolResult {
    /// Successful result with no payload.
    pub fn ok(message: impl Into<String>) -> Self {
        Self::ok_with_data(message, serde_json::Map::new())
    }

    /// Successful result carrying structured data.
    pub fn ok_with_data(message: impl Into<String>, data: serde_json::Map<String, Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Failed result with a free-form error (typically the downstream error text).
    pub fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: serde_json::Map::new(),
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    /// Failed result classified by the registry.
    pub fn failure(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self::failed(message, kind.as_str())
    }

    pub fn not_found(name: &str) -> Self {
        Self::failure(ToolErrorKind::ToolNotFound, format!("Tool not found: {}", name))
    }
}

/// JSON type a parameter must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParameterType {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

/// Declaration of a single tool parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl ParameterSpec {
    pub fn required(param_type: ParameterType) -> Self {
        Self {
            param_type,
            required: true,
            description: String::new(),
        }
    }

    pub fn optional(param_type: ParameterType) -> Self {
        Self {
            param_type,
            required: false,
            description: String::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Read-only catalog entry handed to the planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub parameter_schema: ParameterSchema,
}
