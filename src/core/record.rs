//! Log record structure and call-shape normalization

use super::error::{LoggerError, Result};
use super::level::LevelMapping;
use super::token::interpolate;
use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error as StdError;

/// Names the formatter resolves from the record itself rather than from `fields`
pub const CORE_TOKENS: [&str; 5] = ["timestamp", "level", "severity", "loggerName", "message"];

/// Level names tried, in order, when a record is built from an error value
const ERROR_LEVELS: [&str; 3] = ["error", "err", "defcon1"];

/// A level given either by name or by numeric severity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Level {
    Name(String),
    Severity(i64),
}

impl From<&str> for Level {
    fn from(name: &str) -> Self {
        Level::Name(name.to_string())
    }
}

impl From<String> for Level {
    fn from(name: String) -> Self {
        Level::Name(name)
    }
}

impl From<i64> for Level {
    fn from(severity: i64) -> Self {
        Level::Severity(severity)
    }
}

/// Every accepted shape of a log call, resolved once at the API boundary
#[derive(Debug, Clone)]
pub enum LogInput {
    /// A level and a message, with optional context fields
    Plain {
        level: Level,
        message: String,
        fields: Map<String, Value>,
    },
    /// An error value; the level is inferred from the active mapping
    FromError {
        message: String,
        stack: String,
        fields: Map<String, Value>,
    },
    /// A single object carrying at least a `level` key
    FromObject(Value),
    /// printf-style message with trailing arguments
    Formatted {
        level: Level,
        format: String,
        args: Vec<Value>,
    },
}

impl LogInput {
    pub fn plain(level: impl Into<Level>, message: impl Into<String>) -> Self {
        LogInput::Plain {
            level: level.into(),
            message: message.into(),
            fields: Map::new(),
        }
    }

    pub fn with_fields(
        level: impl Into<Level>,
        message: impl Into<String>,
        fields: Map<String, Value>,
    ) -> Self {
        LogInput::Plain {
            level: level.into(),
            message: message.into(),
            fields,
        }
    }

    /// Capture an error and its source chain as `message` and `stack`
    pub fn from_error(error: &(dyn StdError + 'static)) -> Self {
        let mut stack = format!("Error: {}", error);
        let mut source = error.source();
        while let Some(cause) = source {
            stack.push_str(&format!("\n    caused by: {}", cause));
            source = cause.source();
        }
        LogInput::FromError {
            message: error.to_string(),
            stack,
            fields: Map::new(),
        }
    }

    pub fn from_object(object: Value) -> Self {
        LogInput::FromObject(object)
    }

    pub fn formatted(level: impl Into<Level>, format: impl Into<String>, args: Vec<Value>) -> Self {
        LogInput::Formatted {
            level: level.into(),
            format: format.into(),
            args,
        }
    }
}

/// Per-call record threaded through filters, formatters and targets
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Creation time; the `timestamp` token is rendered from it
    #[serde(skip)]
    pub date: DateTime<Local>,
    pub level: String,
    pub severity: i64,
    pub logger_name: String,
    pub message: String,
    /// Context fields: HTTP fields, custom tokens, stack, correlation id
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    /// Rendered text, set once a formatter has run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Response body captured by the HTTP target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl LogRecord {
    pub fn new(level: impl Into<String>, severity: i64, message: &str) -> Self {
        Self {
            date: Local::now(),
            level: level.into(),
            severity,
            logger_name: String::new(),
            message: message.to_string(),
            fields: Map::new(),
            output: None,
            response: None,
        }
    }

    /// Normalize a call shape against the originating logger's mapping.
    pub fn from_input(input: LogInput, mapping: &LevelMapping) -> Result<Self> {
        match input {
            LogInput::Plain {
                level,
                message,
                fields,
            } => {
                let (name, severity) = resolve_level(&level, mapping)?;
                Ok(Self::new(name, severity, &message).with_fields(fields))
            }
            LogInput::FromError {
                message,
                stack,
                fields,
            } => {
                let level = ERROR_LEVELS
                    .iter()
                    .find(|name| mapping.contains(name))
                    .ok_or_else(|| {
                        LoggerError::invalid_call(format!(
                            "level mapper '{}' has no error level",
                            mapping.name()
                        ))
                    })?;
                let severity = mapping
                    .resolve_severity(level)
                    .ok_or_else(|| LoggerError::unknown_level(*level, mapping.name()))?;
                let mut record = Self::new(*level, severity, &message).with_fields(fields);
                record.fields.insert("stack".to_string(), Value::String(stack));
                Ok(record)
            }
            LogInput::FromObject(value) => {
                let mut object = match value {
                    Value::Object(object) => object,
                    other => {
                        return Err(LoggerError::invalid_call(format!(
                            "expected an object with a level, got {}",
                            kind_of(&other)
                        )))
                    }
                };
                let level = match object.remove("level") {
                    Some(Value::String(name)) => Level::Name(name),
                    Some(Value::Number(n)) => match n.as_i64() {
                        Some(severity) => Level::Severity(severity),
                        None => {
                            return Err(LoggerError::invalid_call(format!(
                                "level {} is not an integer",
                                n
                            )))
                        }
                    },
                    Some(other) => {
                        return Err(LoggerError::invalid_call(format!(
                            "level must be a string or number, got {}",
                            kind_of(&other)
                        )))
                    }
                    None => return Err(LoggerError::invalid_call("object has no 'level' field")),
                };
                let message = match object.remove("message") {
                    None | Some(Value::Null) => String::new(),
                    Some(Value::String(s)) => s,
                    Some(other) => other.to_string(),
                };
                let (name, severity) = resolve_level(&level, mapping)?;
                Ok(Self::new(name, severity, &message).with_fields(object))
            }
            LogInput::Formatted {
                level,
                format,
                args,
            } => {
                let (name, severity) = resolve_level(&level, mapping)?;
                Ok(Self::new(name, severity, &interpolate(&format, &args)))
            }
        }
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// The text a target writes: the rendered output, or the bare message when
    /// no formatter produced one.
    #[must_use]
    pub fn rendered(&self) -> &str {
        self.output.as_deref().unwrap_or(&self.message)
    }

    /// Ordered token view used by formatters. The internal date value is not
    /// part of it; `timestamp` is filled in by the formatter.
    #[must_use]
    pub fn tokens(&self) -> Map<String, Value> {
        let mut tokens = Map::with_capacity(self.fields.len() + CORE_TOKENS.len());
        tokens.insert("timestamp".to_string(), Value::Null);
        tokens.insert("level".to_string(), Value::String(self.level.clone()));
        tokens.insert("severity".to_string(), Value::from(self.severity));
        tokens.insert(
            "loggerName".to_string(),
            Value::String(self.logger_name.clone()),
        );
        tokens.insert("message".to_string(), Value::String(self.message.clone()));
        for (key, value) in &self.fields {
            if !tokens.contains_key(key) {
                tokens.insert(key.clone(), value.clone());
            }
        }
        tokens
    }
}

fn resolve_level(level: &Level, mapping: &LevelMapping) -> Result<(String, i64)> {
    match level {
        Level::Name(name) => mapping
            .resolve_severity(name)
            .map(|severity| (name.clone(), severity))
            .ok_or_else(|| LoggerError::unknown_level(name.as_str(), mapping.name())),
        Level::Severity(severity) => mapping
            .resolve_name(*severity)
            .map(|name| (name.to_string(), *severity))
            .ok_or_else(|| LoggerError::unknown_level(severity.to_string(), mapping.name())),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::{LevelRegistry, DEFCON, HTTP, NPM};
    use serde_json::json;

    #[derive(Debug)]
    struct Outer(Inner);
    #[derive(Debug)]
    struct Inner;

    impl std::fmt::Display for Outer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "request failed")
        }
    }
    impl std::fmt::Display for Inner {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "connection reset")
        }
    }
    impl StdError for Outer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }
    impl StdError for Inner {}

    #[test]
    fn test_plain_input() {
        let levels = LevelRegistry::new();
        let record =
            LogRecord::from_input(LogInput::plain("warn", "disk low"), levels.get(NPM).unwrap())
                .unwrap();
        assert_eq!(record.level, "warn");
        assert_eq!(record.severity, 1);
        assert_eq!(record.message, "disk low");
    }

    #[test]
    fn test_numeric_level_floors_on_http() {
        let levels = LevelRegistry::new();
        let record =
            LogRecord::from_input(LogInput::plain(404, "not found"), levels.get(HTTP).unwrap())
                .unwrap();
        assert_eq!(record.level, "clientError");
        assert_eq!(record.severity, 404);
    }

    #[test]
    fn test_unknown_level_rejected() {
        let levels = LevelRegistry::new();
        let err = LogRecord::from_input(LogInput::plain("loud", "x"), levels.get(NPM).unwrap());
        assert!(matches!(err, Err(LoggerError::UnknownLevel { .. })));
    }

    #[test]
    fn test_error_input_infers_level() {
        let levels = LevelRegistry::new();
        let input = LogInput::from_error(&Outer(Inner));

        let record = LogRecord::from_input(input.clone(), levels.get(NPM).unwrap()).unwrap();
        assert_eq!(record.level, "error");
        assert_eq!(record.message, "request failed");
        let stack = record.fields["stack"].as_str().unwrap();
        assert!(stack.contains("caused by: connection reset"));

        let record = LogRecord::from_input(input.clone(), levels.get(DEFCON).unwrap()).unwrap();
        assert_eq!(record.level, "defcon1");

        let err = LogRecord::from_input(input, levels.get(HTTP).unwrap());
        assert!(matches!(err, Err(LoggerError::InvalidLogCall(_))));
    }

    #[test]
    fn test_object_input() {
        let levels = LevelRegistry::new();
        let npm = levels.get(NPM).unwrap();
        let record = LogRecord::from_input(
            LogInput::from_object(json!({"level": "info", "message": "hi", "requestId": "r-1"})),
            npm,
        )
        .unwrap();
        assert_eq!(record.message, "hi");
        assert_eq!(record.fields["requestId"], json!("r-1"));
        assert!(!record.fields.contains_key("level"));

        let err = LogRecord::from_input(LogInput::from_object(json!({"message": "hi"})), npm);
        assert!(matches!(err, Err(LoggerError::InvalidLogCall(_))));

        let err = LogRecord::from_input(LogInput::from_object(json!("info")), npm);
        assert!(matches!(err, Err(LoggerError::InvalidLogCall(_))));
    }

    #[test]
    fn test_formatted_input() {
        let levels = LevelRegistry::new();
        let record = LogRecord::from_input(
            LogInput::formatted("debug", "%s=%d", vec![json!("retries"), json!(3)]),
            levels.get(NPM).unwrap(),
        )
        .unwrap();
        assert_eq!(record.message, "retries=3");
    }

    #[test]
    fn test_message_kept_verbatim() {
        let record = LogRecord::new("info", 2, "line one\nline two\tend");
        assert_eq!(record.message, "line one\nline two\tend");
    }

    #[test]
    fn test_token_view_order() {
        let mut record = LogRecord::new("info", 2, "hi");
        record.logger_name = "app".to_string();
        record.fields.insert("uuid".to_string(), json!("u"));
        let binding = record.tokens();
        let keys: Vec<&String> = binding.keys().collect();
        assert_eq!(
            keys,
            vec!["timestamp", "level", "severity", "loggerName", "message", "uuid"]
        );
    }

    #[test]
    fn test_rendered_falls_back_to_message() {
        let mut record = LogRecord::new("info", 2, "hi");
        assert_eq!(record.rendered(), "hi");
        record.output = Some("info hi".to_string());
        assert_eq!(record.rendered(), "info hi");
    }
}
