//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// HTTP transport error
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Registry already shut down
    #[error("Logging registry has been shut down")]
    LoggerStopped,

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// A name that must be unique was registered twice
    #[error("{kind} '{name}' is already registered")]
    DuplicateName { kind: String, name: String },

    /// Predefined entries cannot be replaced or removed
    #[error("{kind} '{name}' is reserved and cannot be modified")]
    ReservedName { kind: String, name: String },

    /// Level name or severity not present in the mapping
    #[error("Unknown level '{level}' for level mapper '{mapper}'")]
    UnknownLevel { level: String, mapper: String },

    /// Level mapper not registered
    #[error("Unknown level mapper '{0}'")]
    UnknownMapper(String),

    /// Log call arguments could not be normalized into a record
    #[error("Invalid log call: {0}")]
    InvalidLogCall(String),

    /// Transformer applied to a non-string value
    #[error("Transformer '{transformer}' expects a string, got {found}")]
    NotAString { transformer: String, found: String },

    /// Size rotation ran out of file slots
    #[error("Max file limit of {max_files} reached for '{path}'")]
    MaxFileLimit { path: String, max_files: u32 },

    /// File appender error with path
    #[error("File appender error for '{path}': {message}")]
    FileAppenderError { path: String, message: String },

    /// Formatter error with format type
    #[error("Formatter error ({format_type}): {message}")]
    FormatterError {
        format_type: String,
        message: String,
    },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn duplicate(kind: impl Into<String>, name: impl Into<String>) -> Self {
        LoggerError::DuplicateName {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn reserved(kind: impl Into<String>, name: impl Into<String>) -> Self {
        LoggerError::ReservedName {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn unknown_level(level: impl Into<String>, mapper: impl Into<String>) -> Self {
        LoggerError::UnknownLevel {
            level: level.into(),
            mapper: mapper.into(),
        }
    }

    pub fn invalid_call<S: Into<String>>(msg: S) -> Self {
        LoggerError::InvalidLogCall(msg.into())
    }

    pub fn not_a_string(transformer: impl Into<String>, found: impl Into<String>) -> Self {
        LoggerError::NotAString {
            transformer: transformer.into(),
            found: found.into(),
        }
    }

    pub fn max_file_limit(path: impl Into<String>, max_files: u32) -> Self {
        LoggerError::MaxFileLimit {
            path: path.into(),
            max_files,
        }
    }

    /// Create a file appender error
    pub fn file_appender(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileAppenderError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a formatter error
    pub fn formatter(format_type: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FormatterError {
            format_type: format_type.into(),
            message: message.into(),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Target errors that must reach the caller even when events are disabled
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LoggerError::MaxFileLimit { .. } | LoggerError::LoggerStopped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::config("FileTarget", "Invalid path");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = LoggerError::file_appender("/var/log/app.log", "Permission denied");
        assert!(matches!(err, LoggerError::FileAppenderError { .. }));

        let err = LoggerError::reserved("handle", "default");
        assert!(matches!(err, LoggerError::ReservedName { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::duplicate("formatter", "simple");
        assert_eq!(err.to_string(), "formatter 'simple' is already registered");

        let err = LoggerError::max_file_limit("/var/log/app.log", 3);
        assert_eq!(
            err.to_string(),
            "Max file limit of 3 reached for '/var/log/app.log'"
        );

        let err = LoggerError::unknown_level("loud", "npm");
        assert_eq!(
            err.to_string(),
            "Unknown level 'loud' for level mapper 'npm'"
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(LoggerError::max_file_limit("a.log", 1).is_fatal());
        assert!(LoggerError::LoggerStopped.is_fatal());
        assert!(!LoggerError::writer("broken pipe").is_fatal());
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::io_operation("writing log file", "cannot write to file", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("writing log file"));
        assert!(err.to_string().contains("cannot write to file"));
    }
}
