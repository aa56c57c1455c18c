//! Configuration types for medic.
//!
//! Configuration is loaded from a single YAML file (`medic.yaml`). Every section
//! is optional; a missing file yields the defaults.
//!
//! ```yaml
//! orchestrator:
//!   max_retries: 2
//!   settle_delay_ms: 2000
//!   retry_backoff_ms: 3000
//! tools:
//!   timeout_ms: 30000
//! evaluation:
//!   backend: file
//!   directory: ./evaluations
//! logging:
//!   level: info
//!   format: pretty
//! ```

pub mod thresholds;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use thresholds::{Threshold, ThresholdPolicy};

/// Complete medic configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicConfig {
    /// Retry loop settings.
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Tool invocation settings.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Status thresholds.
    #[serde(default)]
    pub thresholds: ThresholdPolicy,

    /// Where fix records are persisted.
    #[serde(default)]
    pub evaluation: EvaluationConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Retry loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Retries after the first attempt (total attempts = max_retries + 1).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Pause after the last step of an attempt before re-measuring.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Pause between an unresolved attempt and the next one.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            settle_delay_ms: default_settle_delay_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl OrchestratorConfig {
    /// Config with no delays, for tests and dry environments.
    pub fn immediate() -> Self {
        Self {
            settle_delay_ms: 0,
            retry_backoff_ms: 0,
            ..Default::default()
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Tool invocation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Upper bound for a single tool invocation.
    #[serde(default = "default_tool_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_tool_timeout_ms(),
        }
    }
}

impl ToolsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Evaluation store backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationBackend {
    /// Keep records in process memory.
    Memory,
    /// One JSON document per record in `directory`.
    #[default]
    File,
    /// Discard records.
    None,
}

/// Evaluation store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default)]
    pub backend: EvaluationBackend,

    #[serde(default = "default_evaluation_dir")]
    pub directory: PathBuf,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            backend: EvaluationBackend::default(),
            directory: default_evaluation_dir(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// Default value functions
fn default_max_retries() -> u32 {
    2
}

fn default_settle_delay_ms() -> u64 {
    2000
}

fn default_retry_backoff_ms() -> u64 {
    3000
}

fn default_tool_timeout_ms() -> u64 {
    30_000
}

fn default_evaluation_dir() -> PathBuf {
    PathBuf::from("./evaluations")
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Invalid(String),
}

impl MedicConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let inverted = self.thresholds.inverted_entries();
        if !inverted.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "failed threshold below degraded threshold for: {}",
                inverted.join(", ")
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = MedicConfig::from_yaml("{}").unwrap();
        assert_eq!(config, MedicConfig::default());
        assert_eq!(config.orchestrator.max_retries, 2);
        assert_eq!(config.orchestrator.settle_delay(), Duration::from_secs(2));
        assert_eq!(config.evaluation.backend, EvaluationBackend::File);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
orchestrator:
  max_retries: 4
evaluation:
  backend: memory
thresholds:
  overrides:
    postgres:
      connection_usage_percent: { degraded: 70, failed: 90 }
logging:
  format: json
"#;
        let config = MedicConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.orchestrator.max_retries, 4);
        assert_eq!(config.orchestrator.retry_backoff_ms, 3000);
        assert_eq!(config.evaluation.backend, EvaluationBackend::Memory);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(
            config
                .thresholds
                .threshold_for("postgres", "connection_usage_percent"),
            Some(Threshold::new(70.0, 90.0))
        );
        // defaults survive when only overrides are given
        assert!(config.thresholds.threshold_for("redis", "cpu_usage_percent").is_some());
    }

    #[test]
    fn test_inverted_threshold_rejected() {
        let yaml = r#"
thresholds:
  defaults:
    cpu_usage_percent: { degraded: 90, failed: 80 }
"#;
        let err = MedicConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = MedicConfig::load_or_default("/nonexistent/medic.yaml").unwrap();
        assert_eq!(config.tools.timeout(), Duration::from_secs(30));
    }
}
