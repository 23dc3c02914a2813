use crate::source::level::LogLevel;
use crate::source::timestamp::TimestampExtractor;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A self-describing log line as written by the structured logger.
///
/// Keys are matched case-insensitively; only `timestamp` and `level` are
/// required.
#[derive(Debug, Clone, Deserialize)]
pub struct StructuredMessage {
    pub timestamp: i64,
    pub level: LogLevel,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub thread: Option<String>,
    #[serde(default, rename = "loggername")]
    pub logger_name: Option<String>,
    #[serde(default, rename = "eventtype")]
    pub event_type: Option<String>,
    #[serde(default)]
    pub contexts: Option<HashMap<String, Value>>,
    #[serde(default)]
    pub cause: Option<Value>,
}

impl StructuredMessage {
    /// Try to read `text` as a structured message. Any failure means the
    /// text is a plain record.
    pub fn parse(text: &str) -> Option<Self> {
        let object: Map<String, Value> = serde_json::from_str(text.trim()).ok()?;
        let normalized: Map<String, Value> = object
            .into_iter()
            .map(|(key, value)| (key.to_ascii_lowercase(), value))
            .collect();
        serde_json::from_value(Value::Object(normalized)).ok()
    }
}

/// One logical record with the timestamp and level it will be shipped with.
#[derive(Debug, Clone)]
pub struct ClassifiedRecord {
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Present only for structured records.
    pub level: Option<LogLevel>,
}

impl ClassifiedRecord {
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Structured records below `min_level` are dropped from the output.
    /// Plain records always pass.
    pub fn is_below(&self, min_level: LogLevel) -> bool {
        self.level.is_some_and(|level| level < min_level)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LineClassifier {
    timestamps: TimestampExtractor,
}

impl LineClassifier {
    pub fn new(timestamps: TimestampExtractor) -> Self {
        Self { timestamps }
    }

    pub fn classify(&self, text: String) -> ClassifiedRecord {
        if let Some(message) = StructuredMessage::parse(&text) {
            if let Some(timestamp) = Utc.timestamp_millis_opt(message.timestamp).single() {
                return ClassifiedRecord {
                    text,
                    timestamp,
                    level: Some(message.level),
                };
            }
        }

        let timestamp = self.timestamps.extract(&text).unwrap_or_else(Utc::now);
        ClassifiedRecord {
            text,
            timestamp,
            level: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_record() {
        let classifier = LineClassifier::default();
        let text = r#"{"thread":"main","level":"WARN","eventType":"stdout","message":"disk low","contexts":{},"loggerName":"app","timestamp":1607990400000,"cause":null}"#;

        let record = classifier.classify(format!("{}\n", text));

        assert_eq!(record.level, Some(LogLevel::Warn));
        assert_eq!(record.timestamp_millis(), 1607990400000);
        assert_eq!(record.text, format!("{}\n", text));
    }

    #[test]
    fn test_structured_keys_case_insensitive() {
        let message =
            StructuredMessage::parse(r#"{"LEVEL":"error","TimeStamp":5,"LoggerName":"x"}"#)
                .unwrap();

        assert_eq!(message.level, LogLevel::Error);
        assert_eq!(message.timestamp, 5);
        assert_eq!(message.logger_name.as_deref(), Some("x"));
    }

    #[test]
    fn test_json_without_level_is_plain() {
        let classifier = LineClassifier::default();

        let record = classifier.classify(r#"{"timestamp":1607990400000}"#.to_string());

        assert!(record.level.is_none());
    }

    #[test]
    fn test_unknown_level_is_plain() {
        assert!(StructuredMessage::parse(r#"{"level":"LOUD","timestamp":1}"#).is_none());
    }

    #[test]
    fn test_plain_with_timestamp() {
        let classifier = LineClassifier::default();

        let record = classifier.classify("2020-12-15T10:00:00Z service started\n".to_string());

        assert!(record.level.is_none());
        assert_eq!(record.timestamp.to_rfc3339(), "2020-12-15T10:00:00+00:00");
    }

    #[test]
    fn test_plain_without_timestamp_uses_now() {
        let classifier = LineClassifier::default();
        let before = Utc::now();

        let record = classifier.classify("hello world\n".to_string());

        assert!(record.timestamp >= before);
        assert!(record.timestamp <= Utc::now());
    }

    #[test]
    fn test_is_below() {
        let classifier = LineClassifier::default();
        let debug = classifier.classify(r#"{"level":"DEBUG","timestamp":1}"#.to_string());
        let plain = classifier.classify("plain".to_string());

        assert!(debug.is_below(LogLevel::Info));
        assert!(!debug.is_below(LogLevel::Debug));
        assert!(!plain.is_below(LogLevel::Error));
    }
}
