//! Logging macros for ergonomic log message formatting.
//!
//! `log!` takes any level name of the logger's mapping. The shorthand macros
//! cover the npm scale. Every macro expands to [`Logger::log`] and evaluates
//! to its `Result`.
//!
//! # Examples
//!
//! ```
//! use rust_handle_logger::prelude::*;
//! use rust_handle_logger::info;
//!
//! let registry = Registry::builder().default_handle(false).build();
//! let logger = registry.get_logger("server");
//!
//! info!(logger, "Server started").unwrap();
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port).unwrap();
//! ```
//!
//! [`Logger::log`]: crate::Logger::log

/// Log at a level given by name.
///
/// # Examples
///
/// ```
/// # use rust_handle_logger::prelude::*;
/// # let logger = Registry::builder().default_handle(false).build().get_logger("app");
/// use rust_handle_logger::log;
/// log!(logger, "info", "Simple message").unwrap();
/// log!(logger, "error", "Error code: {}", 500).unwrap();
/// assert!(log!(logger, "loud", "not an npm level").is_err());
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+))
    };
}

/// Log an error-level message.
///
/// ```
/// # use rust_handle_logger::prelude::*;
/// # let logger = Registry::builder().default_handle(false).build().get_logger("app");
/// use rust_handle_logger::error;
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error").unwrap();
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, "error", $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, "warn", $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, "info", $($arg)+)
    };
}

/// Log at the npm `http` level (request logging).
#[macro_export]
macro_rules! http {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, "http", $($arg)+)
    };
}

#[macro_export]
macro_rules! verbose {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, "verbose", $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, "debug", $($arg)+)
    };
}

#[macro_export]
macro_rules! silly {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, "silly", $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{HandleConfig, LoggerConfig, Registry, TargetSpec};

    fn logger_with_events() -> (crate::Logger, crossbeam_channel::Receiver<crate::LogEvent>) {
        let registry = Registry::builder().default_handle(false).build();
        registry
            .add_handle(
                HandleConfig::new("sink")
                    .target(TargetSpec::Null)
                    .formatter("simple")
                    .emit_events(true),
            )
            .unwrap();
        let logger = registry
            .create_logger(LoggerConfig::new("app").level("silly").handle("sink"))
            .unwrap();
        (logger, registry.events())
    }

    #[test]
    fn test_log_macro() {
        let (logger, events) = logger_with_events();
        log!(logger, "warn", "Formatted: {}", 42).unwrap();
        let record = events.try_recv().unwrap().record.unwrap();
        assert_eq!(record.level, "warn");
        assert_eq!(record.message, "Formatted: 42");
    }

    #[test]
    fn test_npm_shorthands() {
        let (logger, events) = logger_with_events();
        error!(logger, "e").unwrap();
        warn!(logger, "w").unwrap();
        info!(logger, "i").unwrap();
        http!(logger, "h").unwrap();
        verbose!(logger, "v").unwrap();
        debug!(logger, "d").unwrap();
        silly!(logger, "s {}", 1).unwrap();

        let levels: Vec<String> = events
            .try_iter()
            .map(|event| event.record.unwrap().level)
            .collect();
        assert_eq!(
            levels,
            vec!["error", "warn", "info", "http", "verbose", "debug", "silly"]
        );
    }
}
