//! Named loggers
//!
//! A [`Logger`] is a cheap handle: a dotted name plus the [`Registry`] that
//! owns its state. Parent/child relations come from the name segments, so
//! `"api.db"` propagates to `"api"` and then to `"root"`.

use super::error::Result;
use super::exclusive::Exclusive;
use super::filter::{deserialize_specs, FilterSpec, FilterState};
use super::handle::HandleConfig;
use super::record::{Level, LogInput};
use super::registry::Registry;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::error::Error as StdError;
use std::fmt;

/// Name of the logger every walk ends at
pub const ROOT_LOGGER: &str = "root";

/// Threshold of `root` in a fresh registry
pub const DEFAULT_ROOT_LEVEL: &str = "info";

/// `name`, its parents by dot-segment truncation, then `root`
#[must_use]
pub fn ancestry(name: &str) -> Vec<String> {
    let mut chain = Vec::new();
    if name != ROOT_LOGGER {
        let mut current = name;
        loop {
            chain.push(current.to_string());
            match current.rfind('.') {
                Some(idx) => current = &current[..idx],
                None => break,
            }
        }
    }
    chain.push(ROOT_LOGGER.to_string());
    chain
}

/// A handle attached by name or defined inline with the logger
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HandleRef {
    Name(String),
    Inline(Box<HandleConfig>),
}

impl From<&str> for HandleRef {
    fn from(name: &str) -> Self {
        HandleRef::Name(name.to_string())
    }
}

impl From<HandleConfig> for HandleRef {
    fn from(config: HandleConfig) -> Self {
        HandleRef::Inline(Box::new(config))
    }
}

fn deserialize_handle_refs<'de, D>(deserializer: D) -> std::result::Result<Vec<HandleRef>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<HandleRef>),
        One(HandleRef),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::Many(refs)) => refs,
        Some(OneOrMany::One(one)) => vec![one],
    })
}

/// Declarative logger definition
///
/// `handle` accepts one handle or a list, each either a registered name or an
/// inline handle definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggerConfig {
    pub name: String,
    pub level: Option<String>,
    /// Defaults to the mapper of the first handle, then of the nearest ancestor
    pub level_mapper: Option<String>,
    #[serde(alias = "handles", deserialize_with = "deserialize_handle_refs")]
    pub handle: Vec<HandleRef>,
    #[serde(deserialize_with = "deserialize_specs")]
    pub filter: Vec<FilterSpec>,
    pub propagate: bool,
    pub muted: bool,
    pub emit_events: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            level: None,
            level_mapper: None,
            handle: Vec::new(),
            filter: Vec::new(),
            propagate: true,
            muted: false,
            emit_events: false,
        }
    }
}

impl LoggerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    #[must_use]
    pub fn level_mapper(mut self, mapper: impl Into<String>) -> Self {
        self.level_mapper = Some(mapper.into());
        self
    }

    #[must_use]
    pub fn handle(mut self, handle: impl Into<HandleRef>) -> Self {
        self.handle.push(handle.into());
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: FilterSpec) -> Self {
        self.filter.push(filter);
        self
    }

    #[must_use]
    pub fn propagate(mut self, propagate: bool) -> Self {
        self.propagate = propagate;
        self
    }

    #[must_use]
    pub fn muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    #[must_use]
    pub fn emit_events(mut self, emit_events: bool) -> Self {
        self.emit_events = emit_events;
        self
    }
}

/// Registry-side state of one logger
#[derive(Debug, Clone)]
pub(crate) struct LoggerNode {
    pub(crate) level: Option<String>,
    pub(crate) level_mapper: String,
    pub(crate) handles: Vec<String>,
    /// Locked on its own so filters run outside the registry lock
    pub(crate) filters: Exclusive<Vec<FilterState>>,
    pub(crate) propagate: bool,
    pub(crate) muted: bool,
    pub(crate) emit_events: bool,
}

impl LoggerNode {
    pub(crate) fn new(level_mapper: impl Into<String>) -> Self {
        Self {
            level: None,
            level_mapper: level_mapper.into(),
            handles: Vec::new(),
            filters: Exclusive::new(Vec::new()),
            propagate: true,
            muted: false,
            emit_events: false,
        }
    }
}

/// A named logger bound to its registry
///
/// # Examples
///
/// ```
/// use rust_handle_logger::{Registry, HandleConfig, LoggerConfig, TargetSpec};
///
/// let registry = Registry::builder().default_handle(false).build();
/// registry
///     .add_handle(HandleConfig::new("quiet").target(TargetSpec::Null))
///     .unwrap();
/// let logger = registry
///     .create_logger(LoggerConfig::new("app.http").handle("quiet"))
///     .unwrap();
///
/// logger.log("info", "listening").unwrap();
/// logger.logf("warn", "slow request: %dms", vec![1200.into()]).unwrap();
/// ```
#[derive(Clone)]
pub struct Logger {
    name: String,
    registry: Registry,
}

impl Logger {
    pub(crate) fn new(name: impl Into<String>, registry: Registry) -> Self {
        Self {
            name: name.into(),
            registry,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Logger for `"{self}.{suffix}"`, created if needed
    #[must_use]
    pub fn child(&self, suffix: &str) -> Logger {
        if self.name == ROOT_LOGGER {
            self.registry.get_logger(suffix)
        } else {
            self.registry.get_logger(&format!("{}.{}", self.name, suffix))
        }
    }

    pub fn log(&self, level: impl Into<Level>, message: impl Into<String>) -> Result<()> {
        self.log_input(LogInput::plain(level, message))
    }

    /// Log with extra context fields
    pub fn log_fields(
        &self,
        level: impl Into<Level>,
        message: impl Into<String>,
        fields: Map<String, Value>,
    ) -> Result<()> {
        self.log_input(LogInput::with_fields(level, message, fields))
    }

    /// Log an error at the mapping's error level, with its source chain as `stack`
    pub fn log_error(&self, error: &(dyn StdError + 'static)) -> Result<()> {
        self.log_input(LogInput::from_error(error))
    }

    /// Log an object carrying `level`, an optional `message` and context fields
    pub fn log_object(&self, object: Value) -> Result<()> {
        self.log_input(LogInput::from_object(object))
    }

    /// printf-style message: `%s %d %i %f %j %o %O %%`
    pub fn logf(
        &self,
        level: impl Into<Level>,
        format: impl Into<String>,
        args: Vec<Value>,
    ) -> Result<()> {
        self.log_input(LogInput::formatted(level, format, args))
    }

    pub fn log_input(&self, input: LogInput) -> Result<()> {
        self.registry.dispatch(&self.name, input)
    }

    pub fn set_level(&self, level: Option<&str>) -> Result<()> {
        self.registry.set_level(&self.name, level)
    }

    pub fn set_propagate(&self, propagate: bool) -> Result<()> {
        self.registry.set_propagate(&self.name, propagate)
    }

    pub fn set_muted(&self, muted: bool) -> Result<()> {
        self.registry.set_muted(&self.name, muted)
    }

    pub fn set_emit_events(&self, emit_events: bool) -> Result<()> {
        self.registry.set_emit_events(&self.name, emit_events)
    }

    pub fn attach_handle(&self, handle: &str) -> Result<()> {
        self.registry.attach_handle(&self.name, handle)
    }

    pub fn detach_handle(&self, handle: &str) -> Result<()> {
        self.registry.detach_handle(&self.name, handle)
    }

    pub fn attach_filter(&self, filter: FilterSpec) -> Result<()> {
        self.registry.attach_filter(&self.name, filter)
    }

    /// Own level, or the nearest ancestor's
    #[must_use]
    pub fn effective_level(&self) -> Option<String> {
        self.registry.effective_level(&self.name)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ancestry() {
        assert_eq!(ancestry("a.b.c"), vec!["a.b.c", "a.b", "a", "root"]);
        assert_eq!(ancestry("api"), vec!["api", "root"]);
        assert_eq!(ancestry("root"), vec!["root"]);
    }

    #[test]
    fn test_config_defaults() {
        let config: LoggerConfig = serde_json::from_value(json!({"name": "svc"})).unwrap();
        assert!(config.propagate);
        assert!(!config.muted);
        assert!(config.handle.is_empty());
        assert!(config.level_mapper.is_none());
    }

    #[test]
    fn test_config_single_and_many_handles() {
        let one: LoggerConfig = serde_json::from_value(json!({
            "name": "myLogger",
            "handle": {"name": "myHandle", "target": null}
        }))
        .unwrap();
        assert!(matches!(one.handle.as_slice(), [HandleRef::Inline(_)]));

        let many: LoggerConfig = serde_json::from_value(json!({
            "name": "svc",
            "handles": ["default", {"name": "audit", "target": "null"}],
            "filter": "level",
            "propagate": false
        }))
        .unwrap();
        assert_eq!(many.handle.len(), 2);
        assert!(matches!(&many.handle[0], HandleRef::Name(n) if n == "default"));
        assert_eq!(many.filter.len(), 1);
        assert!(!many.propagate);
    }
}
