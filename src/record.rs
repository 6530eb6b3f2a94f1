use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Severity of a [`LogRecord`], rendered in lowercase as the `level` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Critical => "critical",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warning,
            tracing::Level::INFO => Level::Info,
            _ => Level::Debug,
        }
    }
}

/// Payload of a log call: plain text or an already structured JSON value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Message {
    Text(String),
    Structured(serde_json::Value),
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Text(text.to_string())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Text(text)
    }
}

impl From<serde_json::Value> for Message {
    fn from(value: serde_json::Value) -> Self {
        Message::Structured(value)
    }
}

/// A single log call as handed over by the logging front-end.
///
/// The timestamp is taken when the record is built, so it reflects the
/// moment of emission rather than the moment of delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub logger_name: String,
    pub level: Level,
    pub message: Message,
    pub timestamp: DateTime<Utc>,
    /// Per-call metadata; wins over logger and handler metadata.
    pub call_metadata: BTreeMap<String, String>,
}

impl LogRecord {
    pub fn new(logger_name: impl Into<String>, level: Level, message: impl Into<Message>) -> Self {
        LogRecord {
            logger_name: logger_name.into(),
            level,
            message: message.into(),
            timestamp: Utc::now(),
            call_metadata: BTreeMap::new(),
        }
    }

    pub fn with_meta<K, V>(mut self, meta: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.call_metadata
            .extend(meta.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_are_lowercase() {
        assert_eq!(Level::Warning.to_string(), "warning");
        assert_eq!(Level::Critical.as_str(), "critical");
    }

    #[test]
    fn tracing_levels_map_onto_record_levels() {
        assert_eq!(Level::from(&tracing::Level::TRACE), Level::Debug);
        assert_eq!(Level::from(&tracing::Level::DEBUG), Level::Debug);
        assert_eq!(Level::from(&tracing::Level::INFO), Level::Info);
        assert_eq!(Level::from(&tracing::Level::WARN), Level::Warning);
        assert_eq!(Level::from(&tracing::Level::ERROR), Level::Error);
    }

    #[test]
    fn builder_collects_call_metadata() {
        let record = LogRecord::new("component", Level::Info, "hello")
            .with_meta([("a", "1")])
            .with_meta([("b", "2")]);

        assert_eq!(record.message, Message::Text("hello".into()));
        assert_eq!(record.call_metadata.len(), 2);
        assert_eq!(record.call_metadata["b"], "2");
    }
}
