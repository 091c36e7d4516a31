//! # Rust Handle Logger
//!
//! Hierarchical structured logging built around named handles.
//!
//! ## Features
//!
//! - **Logger hierarchy**: dotted names propagate records to their ancestors
//!   up to `root`, each with its own level, filters and handles
//! - **Handles**: a target (console, file, rotating file, HTTP, null or a
//!   closure) bound to a formatter, a filter chain and a level
//! - **Token formatters**: `%{token}` templates or JSON projections with
//!   per-token styles and transformers
//! - **Level scales**: npm, http, syslog, python and defcon built in, custom
//!   scales in either severity order
//! - **Events**: `logged`, `error`, `filtered` and stream lifecycle events on
//!   one bus per registry
//!
//! ## Example
//!
//! ```
//! use rust_handle_logger::prelude::*;
//!
//! let registry = Registry::builder().default_handle(false).build();
//! let logger = registry
//!     .create_logger(
//!         LoggerConfig::new("myLogger").handle(
//!             HandleConfig::new("myHandle")
//!                 .target(TargetSpec::Null)
//!                 .formatter(FormatterConfig::new("f").format("%{level} %{message}"))
//!                 .emit_events(true),
//!         ),
//!     )
//!     .unwrap();
//!
//! let events = registry.events();
//! logger.log("info", "Hi").unwrap();
//! let record = events.try_recv().unwrap().record.unwrap();
//! assert_eq!(record.output.as_deref(), Some("info Hi"));
//! ```

pub mod core;
pub mod macros;
pub mod targets;

pub mod prelude {
    pub use crate::core::{
        ColorMap, CustomToken, EventKind, FilterScope, FilterSpec, FormatterConfig, HandleConfig,
        LogEvent, LogInput, LogRecord, Logger, LoggerConfig, LoggerError, LoggingConfig, Registry,
        Result, TargetContext, TargetSpec, TokenDirective, TransformerRef,
        DEFAULT_SHUTDOWN_TIMEOUT,
    };
    pub use crate::targets::{Interval, RotationPolicy};
}

pub use core::{
    ColorMap, ContentType, CustomToken, DispatchMetrics, EventKind, FilterScope, FilterSpec,
    FormatterConfig, HandleConfig, HttpMethod, Level, LevelMapping, LogEvent, LogInput, LogRecord,
    Logger, LoggerConfig, LoggerError, LoggingConfig, Registry, RegistryBuilder, Result,
    SeverityOrder, Target, TargetContext, TargetSpec, TimestampFormat, TokenDirective,
    TransformerRef, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use targets::{Interval, RotationPolicy};
