//! Log signals gathered as diagnostic context for the planner.

use crate::record::FixScope;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Infer a level from free-form log text.
    ///
    /// Load-generation chatter ("generating database load ...") is treated as a
    /// warning because it accompanies injected failures.
    pub fn infer(message: &str) -> Self {
        let upper = message.to_uppercase();

        let level = if upper.contains("ERROR") || upper.contains("CRITICAL") {
            Self::Error
        } else if upper.contains("WARN") {
            Self::Warning
        } else if upper.contains("DEBUG") {
            Self::Debug
        } else {
            Self::Info
        };

        let load_chatter = upper.contains("GENERATING")
            && (upper.contains("LOAD") || upper.contains("DATABASE") || upper.contains("REDIS"));
        if load_chatter && level < Self::Warning {
            Self::Warning
        } else {
            level
        }
    }

    /// Error or warning.
    pub fn is_signal(&self) -> bool {
        matches!(self, Self::Warning | Self::Error)
    }
}

/// One log line attributed to a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub resource_id: String,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    /// Build an entry, inferring its level from the message.
    pub fn from_line(
        id: impl Into<String>,
        resource_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        Self {
            id: id.into(),
            timestamp,
            resource_id: resource_id.into(),
            level: LogLevel::infer(&message),
            message,
        }
    }
}

/// Errors and warnings that fall inside `scope`, oldest first.
pub fn select_error_signals(entries: &[LogEntry], scope: &FixScope) -> Vec<LogEntry> {
    let mut selected: Vec<LogEntry> = entries
        .iter()
        .filter(|e| e.level.is_signal())
        .filter(|e| scope.includes(&e.resource_id))
        .filter(|e| scope.time_range.is_none_or(|range| range.contains(e.timestamp)))
        .cloned()
        .collect();
    selected.sort_by_key(|e| e.timestamp);
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TimeRange;
    use chrono::Duration;

    #[test]
    fn test_infer_level() {
        assert_eq!(LogLevel::infer("FATAL ERROR: out of memory"), LogLevel::Error);
        assert_eq!(LogLevel::infer("critical: disk full"), LogLevel::Error);
        assert_eq!(LogLevel::infer("WARNING: slow query"), LogLevel::Warning);
        assert_eq!(LogLevel::infer("debug tick"), LogLevel::Debug);
        assert_eq!(LogLevel::infer("Generating database load"), LogLevel::Warning);
        assert_eq!(LogLevel::infer("Generating redis load: error"), LogLevel::Error);
        assert_eq!(LogLevel::infer("ready to accept connections"), LogLevel::Info);
    }

    #[test]
    fn test_select_error_signals() {
        let now = Utc::now();
        let entries = vec![
            LogEntry::from_line("1", "redis", now - Duration::minutes(30), "ERROR old"),
            LogEntry::from_line("2", "redis", now, "OOM command not allowed: ERROR"),
            LogEntry::from_line("3", "redis", now, "accepted connection"),
            LogEntry::from_line("4", "postgres", now, "WARNING: too many clients"),
        ];

        let scope = FixScope::resources(["redis"]).with_time_range(TimeRange {
            start: now - Duration::minutes(5),
            end: now + Duration::minutes(5),
        });
        let selected = select_error_signals(&entries, &scope);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "2");

        let everything = select_error_signals(&entries, &FixScope::all());
        let ids: Vec<&str> = everything.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "4"]);
    }
}
