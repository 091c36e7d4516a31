//! Handles: a target bound to a formatter, a filter chain and a level
//!
//! A [`HandleConfig`] is the declarative form (deserializable with camelCase
//! keys, or built in code). The registry turns it into a [`Handle`], which
//! owns the target and the filter states and renders records for it.

use super::error::{LoggerError, Result};
use super::events::{EventBus, LogEvent};
use super::filter::{deserialize_specs, run_chain, FilterContext, FilterSpec, FilterState};
use super::formatter::{FormatterConfig, FormatterRegistry};
use super::level::{LevelRegistry, NPM};
use super::record::LogRecord;
use super::target::{Target, TargetContext};
use super::transformer::TransformerRegistry;
use crate::targets::{
    ConsoleTarget, FileSpec, FileTarget, FunctionTarget, Interval, NullTarget, RotatingFileTarget,
    RotationPolicy, TargetFn,
};
use chrono::Weekday;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Reserved name of the console handle attached to `root`
pub const DEFAULT_HANDLE: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum HttpMethod {
    #[serde(rename = "GET", alias = "get")]
    Get,
    #[default]
    #[serde(rename = "POST", alias = "post")]
    Post,
}

/// Body encoding of the HTTP target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ContentType {
    #[default]
    #[serde(rename = "form", alias = "application/x-www-form-urlencoded")]
    Form,
    #[serde(rename = "json", alias = "application/json")]
    Json,
    #[serde(rename = "xml", alias = "application/xml")]
    Xml,
}

impl ContentType {
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            ContentType::Form => "application/x-www-form-urlencoded",
            ContentType::Json => "application/json",
            ContentType::Xml => "application/xml",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationType {
    Size,
    Interval,
}

/// Which driver a handle writes through
#[derive(Clone, Default)]
pub enum TargetSpec {
    #[default]
    Console,
    File,
    RotatingFile,
    Http,
    /// Events only, no I/O
    Null,
    Custom(TargetFn),
}

impl TargetSpec {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&LogRecord, &mut TargetContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        TargetSpec::Custom(Arc::new(f))
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            TargetSpec::Console => "console",
            TargetSpec::File => "file",
            TargetSpec::RotatingFile => "rotatingFile",
            TargetSpec::Http => "http",
            TargetSpec::Null => "null",
            TargetSpec::Custom(_) => "function",
        }
    }
}

impl fmt::Debug for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<'de> Deserialize<'de> for TargetSpec {
    /// A driver name; JSON `null` selects the null target
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)?.as_deref() {
            None | Some("null") => Ok(TargetSpec::Null),
            Some("console") => Ok(TargetSpec::Console),
            Some("file") => Ok(TargetSpec::File),
            Some("rotatingFile") => Ok(TargetSpec::RotatingFile),
            Some("http") => Ok(TargetSpec::Http),
            Some(other) => Err(serde::de::Error::custom(format!(
                "unknown target '{}'",
                other
            ))),
        }
    }
}

/// A formatter referenced by name or defined inline
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FormatterRef {
    Name(String),
    Inline(Box<FormatterConfig>),
}

impl From<&str> for FormatterRef {
    fn from(name: &str) -> Self {
        FormatterRef::Name(name.to_string())
    }
}

impl From<FormatterConfig> for FormatterRef {
    fn from(config: FormatterConfig) -> Self {
        FormatterRef::Inline(Box::new(config))
    }
}

/// Declarative handle definition
///
/// # Examples
///
/// ```
/// use rust_handle_logger::{HandleConfig, TargetSpec};
///
/// let handle = HandleConfig::new("audit")
///     .target(TargetSpec::File)
///     .path("/var/log/audit.log")
///     .level("warn")
///     .formatter("simple");
/// assert!(handle.validate().is_ok());
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HandleConfig {
    pub name: String,
    pub active: bool,
    pub level: Option<String>,
    pub level_mapper: String,
    pub formatter: Option<FormatterRef>,
    #[serde(deserialize_with = "deserialize_specs")]
    pub filter: Vec<FilterSpec>,
    pub target: TargetSpec,
    pub path: Option<PathBuf>,
    pub directory: Option<PathBuf>,
    pub file_name: Option<String>,
    pub file_extension: Option<String>,
    pub file_name_pattern: Option<String>,
    pub rotation_type: Option<RotationType>,
    pub interval: Option<Interval>,
    pub rotate_day: Option<String>,
    pub max_files: Option<u32>,
    pub max_size: Option<u64>,
    pub url: Option<String>,
    pub port: Option<u16>,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub content_type: ContentType,
    pub allow_insecure: bool,
    pub emit_events: bool,
    /// Keys no built-in target understands; only custom targets accept them
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl Default for HandleConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            active: true,
            level: None,
            level_mapper: NPM.to_string(),
            formatter: None,
            filter: Vec::new(),
            target: TargetSpec::default(),
            path: None,
            directory: None,
            file_name: None,
            file_extension: None,
            file_name_pattern: None,
            rotation_type: None,
            interval: None,
            rotate_day: None,
            max_files: None,
            max_size: None,
            url: None,
            port: None,
            method: HttpMethod::default(),
            headers: BTreeMap::new(),
            content_type: ContentType::default(),
            allow_insecure: false,
            emit_events: false,
            options: Map::new(),
        }
    }
}

impl HandleConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn target(mut self, target: TargetSpec) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    #[must_use]
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    #[must_use]
    pub fn level_mapper(mut self, mapper: impl Into<String>) -> Self {
        self.level_mapper = mapper.into();
        self
    }

    #[must_use]
    pub fn formatter(mut self, formatter: impl Into<FormatterRef>) -> Self {
        self.formatter = Some(formatter.into());
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: FilterSpec) -> Self {
        self.filter.push(filter);
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    #[must_use]
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    #[must_use]
    pub fn file_extension(mut self, extension: impl Into<String>) -> Self {
        self.file_extension = Some(extension.into());
        self
    }

    /// Configure a rotating file target from a policy
    #[must_use]
    pub fn rotation(mut self, policy: RotationPolicy) -> Self {
        self.target = TargetSpec::RotatingFile;
        match policy {
            RotationPolicy::Size {
                max_size,
                max_files,
            } => {
                self.rotation_type = Some(RotationType::Size);
                self.max_size = Some(max_size);
                self.max_files = Some(max_files);
            }
            RotationPolicy::Interval {
                interval,
                rotate_day,
                pattern,
            } => {
                self.rotation_type = Some(RotationType::Interval);
                self.interval = Some(interval);
                self.rotate_day = Some(rotate_day.to_string());
                self.file_name_pattern = pattern;
            }
        }
        self
    }

    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    #[must_use]
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    #[must_use]
    pub fn allow_insecure(mut self, allow_insecure: bool) -> Self {
        self.allow_insecure = allow_insecure;
        self
    }

    #[must_use]
    pub fn emit_events(mut self, emit_events: bool) -> Self {
        self.emit_events = emit_events;
        self
    }

    /// Extra option handed to a custom target
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Checks that need no registry: names, option keys, target settings
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(LoggerError::config("handle", "name must not be empty"));
        }
        if !self.options.is_empty() && !matches!(self.target, TargetSpec::Custom(_)) {
            let keys: Vec<&str> = self.options.keys().map(String::as_str).collect();
            return Err(LoggerError::config(
                "handle",
                format!("'{}' has unknown options: {}", self.name, keys.join(", ")),
            ));
        }
        match self.target {
            TargetSpec::File => self.file_spec().map(|_| ()),
            TargetSpec::RotatingFile => {
                self.file_spec()?;
                self.rotation_policy().map(|_| ())
            }
            TargetSpec::Http => match &self.url {
                Some(_) => Ok(()),
                None => Err(LoggerError::config(
                    "handle",
                    format!("http handle '{}' requires 'url'", self.name),
                )),
            },
            _ => Ok(()),
        }
    }

    /// File location for file-backed targets
    pub fn file_spec(&self) -> Result<FileSpec> {
        match &self.path {
            Some(path) => FileSpec::from_path(path),
            None => Ok(FileSpec::new(
                self.directory.clone().unwrap_or_else(|| PathBuf::from(".")),
                self.file_name
                    .clone()
                    .unwrap_or_else(FileSpec::default_file_name),
                self.file_extension
                    .clone()
                    .unwrap_or_else(|| crate::targets::file::DEFAULT_EXTENSION.to_string()),
            )),
        }
    }

    /// The single rotation policy of a rotating file handle
    pub fn rotation_policy(&self) -> Result<RotationPolicy> {
        let invalid = |message: &str| {
            LoggerError::config("handle", format!("rotating handle '{}' {}", self.name, message))
        };
        if self.max_size.is_some() && self.interval.is_some() {
            return Err(invalid("must rotate by size or by interval, not both"));
        }
        let kind = match (self.rotation_type, self.max_size, self.interval) {
            (Some(kind), _, _) => kind,
            (None, Some(_), _) => RotationType::Size,
            (None, None, Some(_)) => RotationType::Interval,
            (None, None, None) => return Err(invalid("needs 'maxSize' or 'interval'")),
        };

        match kind {
            RotationType::Size => {
                if self.interval.is_some() || self.file_name_pattern.is_some() {
                    return Err(invalid("rotates by size but has interval settings"));
                }
                let max_size = self.max_size.ok_or_else(|| invalid("needs 'maxSize'"))?;
                let max_files = self.max_files.unwrap_or(10);
                if max_files == 0 {
                    return Err(invalid("needs 'maxFiles' of at least 1"));
                }
                Ok(RotationPolicy::size(max_size, max_files))
            }
            RotationType::Interval => {
                if self.max_size.is_some() {
                    return Err(invalid("rotates by interval but has 'maxSize'"));
                }
                let interval = self.interval.ok_or_else(|| invalid("needs 'interval'"))?;
                let rotate_day = match &self.rotate_day {
                    None => Weekday::Sun,
                    Some(day) => day
                        .parse::<Weekday>()
                        .map_err(|_| invalid(&format!("has invalid rotateDay '{}'", day)))?,
                };
                let mut policy = RotationPolicy::interval(interval).with_rotate_day(rotate_day);
                if let Some(pattern) = &self.file_name_pattern {
                    policy = policy.with_pattern(pattern.clone());
                }
                Ok(policy)
            }
        }
    }

    fn build_target(&self) -> Result<Box<dyn Target>> {
        Ok(match &self.target {
            TargetSpec::Console => Box::new(ConsoleTarget::new()),
            TargetSpec::Null => Box::new(NullTarget::new()),
            TargetSpec::Custom(f) => Box::new(FunctionTarget::new(Arc::clone(f))),
            TargetSpec::File => Box::new(FileTarget::new(&self.file_spec()?)),
            TargetSpec::RotatingFile => Box::new(RotatingFileTarget::new(
                self.file_spec()?,
                self.rotation_policy()?,
            )),
            TargetSpec::Http => self.build_http_target()?,
        })
    }

    #[cfg(feature = "http")]
    fn build_http_target(&self) -> Result<Box<dyn Target>> {
        use crate::targets::{HttpOptions, HttpTarget};

        let url = self.url.as_deref().ok_or_else(|| {
            LoggerError::config("handle", format!("http handle '{}' requires 'url'", self.name))
        })?;
        let mut options = HttpOptions::new(url, self.port)?
            .with_method(self.method)
            .with_content_type(self.content_type)
            .with_allow_insecure(self.allow_insecure);
        for (name, value) in &self.headers {
            options = options.with_header(name.clone(), value.clone());
        }
        Ok(Box::new(HttpTarget::new(&self.name, options)?))
    }

    #[cfg(not(feature = "http"))]
    fn build_http_target(&self) -> Result<Box<dyn Target>> {
        Err(LoggerError::config(
            "handle",
            format!("'{}' uses the http target, which this build does not include", self.name),
        ))
    }
}

/// Registries a handle renders against
#[derive(Clone, Copy)]
pub struct RenderEnv<'a> {
    pub levels: &'a LevelRegistry,
    pub formatters: &'a FormatterRegistry,
    pub transformers: &'a TransformerRegistry,
}

/// What became of one record at one handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    Emitted,
    Filtered,
    Failed,
    Inactive,
}

/// A live handle owned by the registry
pub struct Handle {
    name: String,
    active: bool,
    level: Option<String>,
    level_mapper: String,
    formatter: String,
    /// Formatter defined on this handle alone, never registered
    inline_formatter: Option<Arc<FormatterConfig>>,
    filters: Vec<FilterState>,
    emit_events: bool,
    options: Map<String, Value>,
    target: Box<dyn Target>,
    closed: bool,
}

impl Handle {
    /// Build from a validated config whose filters the registry has already
    /// resolved. A named formatter must already be registered; an inline one
    /// must have passed [`FormatterConfig::validate`].
    pub(crate) fn from_config(config: &HandleConfig, filters: Vec<FilterState>) -> Result<Self> {
        let (formatter, inline_formatter) = match &config.formatter {
            None => ("default".to_string(), None),
            Some(FormatterRef::Name(name)) => (name.clone(), None),
            Some(FormatterRef::Inline(inline)) => (
                inline.name.clone(),
                Some(Arc::new(FormatterConfig::clone(inline))),
            ),
        };
        Ok(Self {
            name: config.name.clone(),
            active: config.active,
            level: config.level.clone(),
            level_mapper: config.level_mapper.clone(),
            formatter,
            inline_formatter,
            filters,
            emit_events: config.emit_events,
            options: config.options.clone(),
            target: config.build_target()?,
            closed: false,
        })
    }

    /// The reserved `default` handle: console, `default` formatter, npm
    pub(crate) fn default_console() -> Self {
        Self {
            name: DEFAULT_HANDLE.to_string(),
            active: true,
            level: None,
            level_mapper: NPM.to_string(),
            formatter: "default".to_string(),
            inline_formatter: None,
            filters: Vec::new(),
            emit_events: false,
            options: Map::new(),
            target: Box::new(ConsoleTarget::new()),
            closed: false,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn level(&self) -> Option<&str> {
        self.level.as_deref()
    }

    #[must_use]
    pub fn level_mapper(&self) -> &str {
        &self.level_mapper
    }

    #[must_use]
    pub fn formatter(&self) -> &str {
        &self.formatter
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn target_name(&self) -> &str {
        self.target.name()
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn set_level(&mut self, level: Option<String>) {
        self.level = level;
    }

    pub(crate) fn push_filter(&mut self, filter: FilterState) {
        self.filters.push(filter);
    }

    /// Level check, filters, render, emit.
    ///
    /// Target errors are reported through events or diagnostics. Only fatal
    /// errors on a handle without events are returned.
    pub(crate) fn process(
        &mut self,
        record: &mut LogRecord,
        env: RenderEnv<'_>,
        logger: &str,
        bus: &Arc<EventBus>,
        pending: &mut Vec<LogEvent>,
    ) -> Result<HandleOutcome> {
        if !self.active || self.closed {
            return Ok(HandleOutcome::Inactive);
        }
        let mut ctx = TargetContext::new(
            &self.name,
            Some(logger),
            self.emit_events,
            &self.options,
            bus,
            pending,
        );

        let mapping = match env.levels.get(&self.level_mapper) {
            Ok(mapping) => mapping,
            Err(e) => {
                ctx.error(e, Some(record));
                return Ok(HandleOutcome::Failed);
            }
        };
        let threshold = self
            .level
            .as_deref()
            .and_then(|level| mapping.resolve_severity(level));
        let filter_context = FilterContext {
            level: self.level.as_deref(),
            severity: threshold,
            mapping,
        };
        let accepted = threshold.map_or(true, |t| mapping.meets(record.severity, t))
            && run_chain(&mut self.filters, record, &filter_context);
        if !accepted {
            ctx.filtered(record);
            return Ok(HandleOutcome::Filtered);
        }

        let rendered = match &self.inline_formatter {
            Some(inline) => env
                .formatters
                .render_inline(record, inline, mapping, env.transformers)
                .map(Some),
            None => env
                .formatters
                .render(record, &self.formatter, mapping, env.transformers),
        };
        match rendered {
            Ok(output) => record.output = output,
            Err(e) => {
                ctx.error(e, Some(record));
                return Ok(HandleOutcome::Failed);
            }
        }

        match self.target.emit(record, &mut ctx) {
            Ok(()) => Ok(HandleOutcome::Emitted),
            Err(e) if e.is_fatal() && !self.emit_events => Err(e),
            Err(e) => {
                ctx.error(e, Some(record));
                Ok(HandleOutcome::Failed)
            }
        }
    }

    pub(crate) fn flush(&mut self, bus: &Arc<EventBus>, pending: &mut Vec<LogEvent>) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let mut ctx = TargetContext::new(&self.name, None, self.emit_events, &self.options, bus, pending);
        self.target.flush(&mut ctx)
    }

    pub(crate) fn close(
        &mut self,
        bus: &Arc<EventBus>,
        pending: &mut Vec<LogEvent>,
        timeout: Duration,
    ) -> Result<()> {
        self.closed = true;
        let mut ctx = TargetContext::new(&self.name, None, self.emit_events, &self.options, bus, pending)
            .with_timeout(timeout);
        self.target.close(&mut ctx)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("name", &self.name)
            .field("active", &self.active)
            .field("level", &self.level)
            .field("level_mapper", &self.level_mapper)
            .field("formatter", &self.formatter)
            .field("filters", &self.filters.len())
            .field("target", &self.target.name())
            .finish()
    }
}
