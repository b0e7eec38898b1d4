use std::sync::Arc;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Parameter map lifted out of a message body. Insertion order follows the source line.
pub type Params = Map<String, Value>;

/// Classified severity of a log line.
///
/// The raw level text is kept on [`LogLine`] so that both the long (`INFO`)
/// and the short (`INF`) spellings survive a round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Unknown,
}

impl LogLevel {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "TRC" | "TRACE" => LogLevel::Trace,
            "DBG" | "DEBUG" => LogLevel::Debug,
            "INF" | "INFO" => LogLevel::Info,
            "WRN" | "WARN" | "WARNING" => LogLevel::Warn,
            "ERR" | "ERROR" => LogLevel::Error,
            "FTL" | "FATAL" | "CRIT" | "CRITICAL" => LogLevel::Fatal,
            _ => LogLevel::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
            LogLevel::Unknown => "unknown",
        }
    }
}

/// Function scope marker carried by `| enter` / `| leave` suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeStatus {
    Enter,
    Leave,
}

/// One decomposed log line. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct LogLine {
    pub timestamp: Arc<str>,
    /// Level exactly as written in the source (`INF`, `ERROR`, ...)
    pub level: Arc<str>,
    pub process_id: Arc<str>,
    pub thread_id: Arc<str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<Arc<str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_name: Option<Arc<str>>,
    /// Message text with parameter groups and status suffix removed
    pub message: String,
    pub params: Params,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ScopeStatus>,
    /// Scope duration in milliseconds (only on `| leave, Nms`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// 1-based position in the source text
    pub line_index: usize,
}

impl LogLine {
    pub fn log_level(&self) -> LogLevel {
        LogLevel::parse(&self.level)
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }
}

/// Event notification lifted from a marker line.
#[derive(Debug, Clone, Serialize)]
pub struct EventNotification {
    pub timestamp: Arc<str>,
    pub level: Arc<str>,
    /// Logical event name, e.g. `Tasker.Task.Starting`
    pub message: String,
    /// Arbitrary JSON payload; fields the tree builder does not read pass through untouched
    pub details: Params,
    pub line_index: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Empty line")]
    Empty,

    #[error("Line too large: {0} bytes (max: {1} bytes)")]
    LineTooLarge(usize, usize),

    #[error("Line does not match the bracket-field grammar")]
    NoMatch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_short_and_long_forms() {
        assert_eq!(LogLevel::parse("INF"), LogLevel::Info);
        assert_eq!(LogLevel::parse("info"), LogLevel::Info);
        assert_eq!(LogLevel::parse("WRN"), LogLevel::Warn);
        assert_eq!(LogLevel::parse("WARNING"), LogLevel::Warn);
        assert_eq!(LogLevel::parse("ERR"), LogLevel::Error);
        assert_eq!(LogLevel::parse("DBG"), LogLevel::Debug);
        assert_eq!(LogLevel::parse("TRC"), LogLevel::Trace);
        assert_eq!(LogLevel::parse("FTL"), LogLevel::Fatal);
        assert_eq!(LogLevel::parse("NOTICE"), LogLevel::Unknown);
    }
}
