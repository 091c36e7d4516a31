//! Core logger types and traits

pub mod config;
pub mod error;
pub mod events;
pub(crate) mod exclusive;
pub mod filter;
pub mod formatter;
pub mod handle;
pub mod level;
pub mod logger;
pub mod metrics;
pub mod record;
pub mod registry;
pub mod style;
pub mod target;
pub mod timestamp;
pub mod token;
pub mod transformer;

pub use config::LoggingConfig;
pub use error::{LoggerError, Result};
pub use events::{DeferredEvents, EventBus, EventKind, LogEvent, Subscriber};
pub use filter::{
    BurstWindow, FilterContext, FilterFn, FilterKind, FilterRegistry, FilterScope, FilterSpec,
    FilterState, OnMatch,
};
pub use formatter::{
    ColorMap, CustomToken, FormatterConfig, FormatterRegistry, TokenDirective, TokenFn,
};
pub use handle::{
    ContentType, FormatterRef, Handle, HandleConfig, HandleOutcome, HttpMethod, RotationType,
    TargetSpec, DEFAULT_HANDLE,
};
pub use level::{LevelMapping, LevelMappingConfig, LevelRegistry, SeverityOrder};
pub use logger::{HandleRef, Logger, LoggerConfig, DEFAULT_ROOT_LEVEL, ROOT_LOGGER};
pub use metrics::DispatchMetrics;
pub use record::{Level, LogInput, LogRecord};
pub use registry::{Registry, RegistryBuilder, DEFAULT_SHUTDOWN_TIMEOUT};
pub use style::StyleSpec;
pub use target::{Target, TargetContext};
pub use timestamp::TimestampFormat;
pub use token::Timezone;
pub use transformer::{TransformFn, TransformerRef, TransformerRegistry};
