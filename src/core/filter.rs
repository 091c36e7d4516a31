//! Record filters
//!
//! A filter is a [`FilterState`]: its kind, the options it was created with,
//! and any counters it mutates. Evaluation takes `&mut self`, so every state
//! change is an explicit transition owned by the logger or handle the filter is
//! attached to. Chains are AND-ed and stop at the first rejection.

use super::error::{LoggerError, Result};
use super::level::LevelMapping;
use super::record::LogRecord;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Built-in filter names; they cannot be replaced or removed
pub const RESERVED_FILTERS: [&str; 3] = ["level", "regex", "burst"];

/// User predicate: sees the record and its own mutable scope
pub type FilterFn = Arc<dyn Fn(&LogRecord, &mut FilterScope<'_>) -> bool + Send + Sync>;

/// What a filter knows about its owner at evaluation time
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    /// Owner's current threshold level name, if it has one
    pub level: Option<&'a str>,
    /// Owner's current threshold severity, if it has one
    pub severity: Option<i64>,
    pub mapping: &'a LevelMapping,
}

/// Mutable view handed to user predicates
pub struct FilterScope<'a> {
    pub config: &'a Map<String, Value>,
    pub counters: &'a mut HashMap<String, f64>,
    pub context: FilterContext<'a>,
}

impl FilterScope<'_> {
    /// Read a counter, defaulting to zero
    #[must_use]
    pub fn counter(&self, name: &str) -> f64 {
        self.counters.get(name).copied().unwrap_or(0.0)
    }

    /// Add `by` to a counter and return the new value
    pub fn increment(&mut self, name: &str, by: f64) -> f64 {
        let value = self.counters.entry(name.to_string()).or_insert(0.0);
        *value += by;
        *value
    }

    #[must_use]
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnMatch {
    #[default]
    Allow,
    Deny,
}

/// Sliding-window rate limiter state
#[derive(Debug, Clone)]
pub struct BurstWindow {
    pub rate: usize,
    pub period: Duration,
    pub max_burst: usize,
    pub max_burst_period: Duration,
    window: VecDeque<Instant>,
    burst: VecDeque<Instant>,
}

impl BurstWindow {
    #[must_use]
    pub fn new(rate: usize, period: Duration, max_burst: usize, max_burst_period: Duration) -> Self {
        Self {
            rate,
            period,
            max_burst,
            max_burst_period,
            window: VecDeque::new(),
            burst: VecDeque::new(),
        }
    }

    /// Admit or reject an event observed at `now`
    pub fn admit(&mut self, now: Instant) -> bool {
        evict(&mut self.window, now, self.period);
        if self.window.len() < self.rate {
            self.window.push_back(now);
            return true;
        }

        evict(&mut self.burst, now, self.max_burst_period);
        if self.burst.len() < self.max_burst {
            self.burst.push_back(now);
            return true;
        }
        false
    }
}

fn evict(timestamps: &mut VecDeque<Instant>, now: Instant, period: Duration) {
    while let Some(&oldest) = timestamps.front() {
        if now.duration_since(oldest) >= period {
            timestamps.pop_front();
        } else {
            break;
        }
    }
}

#[derive(Clone)]
pub enum FilterKind {
    /// Threshold from options, or the owner's level when absent
    Level { threshold: Option<String> },
    Regex { pattern: Regex, on_match: OnMatch },
    Burst(BurstWindow),
    Custom {
        name: Option<String>,
        predicate: FilterFn,
    },
}

impl fmt::Debug for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::Level { threshold } => f
                .debug_struct("Level")
                .field("threshold", threshold)
                .finish(),
            FilterKind::Regex { pattern, on_match } => f
                .debug_struct("Regex")
                .field("pattern", &pattern.as_str())
                .field("on_match", on_match)
                .finish(),
            FilterKind::Burst(window) => f.debug_tuple("Burst").field(window).finish(),
            FilterKind::Custom { name, .. } => {
                f.debug_struct("Custom").field("name", name).finish()
            }
        }
    }
}

/// One attached filter instance
#[derive(Debug, Clone)]
pub struct FilterState {
    pub kind: FilterKind,
    pub config: Map<String, Value>,
    pub counters: HashMap<String, f64>,
}

impl FilterState {
    #[must_use]
    pub fn new(kind: FilterKind, config: Map<String, Value>) -> Self {
        Self {
            kind,
            config,
            counters: HashMap::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            FilterKind::Level { .. } => Some("level"),
            FilterKind::Regex { .. } => Some("regex"),
            FilterKind::Burst(_) => Some("burst"),
            FilterKind::Custom { name, .. } => name.as_deref(),
        }
    }

    /// Evaluate against `record`, updating this filter's own state
    pub fn evaluate(&mut self, record: &LogRecord, context: &FilterContext<'_>) -> bool {
        match &mut self.kind {
            FilterKind::Level { threshold } => {
                let threshold = match threshold {
                    Some(level) => context.mapping.resolve_severity(level),
                    None => context.severity,
                };
                threshold.map_or(true, |t| context.mapping.meets(record.severity, t))
            }
            FilterKind::Regex { pattern, on_match } => {
                let matched = pattern.is_match(&record.message);
                match on_match {
                    OnMatch::Allow => matched,
                    OnMatch::Deny => !matched,
                }
            }
            FilterKind::Burst(window) => window.admit(Instant::now()),
            FilterKind::Custom { predicate, .. } => {
                let predicate = Arc::clone(predicate);
                let mut scope = FilterScope {
                    config: &self.config,
                    counters: &mut self.counters,
                    context: *context,
                };
                predicate(record, &mut scope)
            }
        }
    }
}

/// AND of every filter, stopping at the first rejection
pub fn run_chain(
    filters: &mut [FilterState],
    record: &LogRecord,
    context: &FilterContext<'_>,
) -> bool {
    filters
        .iter_mut()
        .all(|filter| filter.evaluate(record, context))
}

/// How a filter is requested in configuration
#[derive(Clone)]
pub enum FilterSpec {
    /// A built-in or globally registered filter, with options
    Named {
        name: String,
        options: Map<String, Value>,
    },
    /// An anonymous predicate attached to one logger or handle
    Inline {
        predicate: FilterFn,
        options: Map<String, Value>,
    },
}

impl FilterSpec {
    pub fn named(name: impl Into<String>) -> Self {
        FilterSpec::Named {
            name: name.into(),
            options: Map::new(),
        }
    }

    /// Named filter with options, e.g. `{"pattern": "^health", "onMatch": "deny"}`
    pub fn with_options(name: impl Into<String>, options: Value) -> Self {
        FilterSpec::Named {
            name: name.into(),
            options: match options {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        }
    }

    pub fn inline<F>(predicate: F, options: Value) -> Self
    where
        F: Fn(&LogRecord, &mut FilterScope<'_>) -> bool + Send + Sync + 'static,
    {
        FilterSpec::Inline {
            predicate: Arc::new(predicate),
            options: match options {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        }
    }
}

impl fmt::Debug for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSpec::Named { name, options } => f
                .debug_struct("Named")
                .field("name", name)
                .field("options", options)
                .finish(),
            FilterSpec::Inline { options, .. } => f
                .debug_struct("Inline")
                .field("options", options)
                .finish(),
        }
    }
}

impl<'de> Deserialize<'de> for FilterSpec {
    /// `"name"` or `{"name": "regex", "pattern": "..."}`
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(name) => Ok(FilterSpec::named(name)),
            Value::Object(mut options) => match options.remove("name") {
                Some(Value::String(name)) => Ok(FilterSpec::Named { name, options }),
                _ => Err(serde::de::Error::custom("filter object needs a string 'name'")),
            },
            other => Err(serde::de::Error::custom(format!(
                "filter must be a name or an object, got {}",
                other
            ))),
        }
    }
}

/// Accepts a single filter or a list
pub(crate) fn deserialize_specs<'de, D>(deserializer: D) -> std::result::Result<Vec<FilterSpec>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<FilterSpec>),
        One(FilterSpec),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(specs) => specs,
        OneOrMany::One(spec) => vec![spec],
    })
}

#[derive(Clone)]
struct FilterDefinition {
    predicate: FilterFn,
    defaults: Map<String, Value>,
}

/// Globally named user filters of one logging environment
#[derive(Clone, Default)]
pub struct FilterRegistry {
    definitions: HashMap<String, FilterDefinition>,
}

impl FilterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named predicate with default options
    pub fn add<F>(&mut self, name: impl Into<String>, predicate: F, defaults: Value) -> Result<()>
    where
        F: Fn(&LogRecord, &mut FilterScope<'_>) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        if RESERVED_FILTERS.contains(&name.as_str()) {
            return Err(LoggerError::reserved("filter", name));
        }
        if self.definitions.contains_key(&name) {
            return Err(LoggerError::duplicate("filter", name));
        }
        let defaults = match defaults {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(LoggerError::config(
                    "filter",
                    format!("default options for '{}' must be an object, got {}", name, other),
                ))
            }
        };
        self.definitions.insert(
            name,
            FilterDefinition {
                predicate: Arc::new(predicate),
                defaults,
            },
        );
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<()> {
        if RESERVED_FILTERS.contains(&name) {
            return Err(LoggerError::reserved("filter", name));
        }
        self.definitions
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| LoggerError::config("filter", format!("'{}' is not registered", name)))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        RESERVED_FILTERS.contains(&name) || self.definitions.contains_key(name)
    }

    /// Create a fresh filter instance; each attachment owns its own state.
    pub fn instantiate(&self, spec: &FilterSpec) -> Result<FilterState> {
        match spec {
            FilterSpec::Inline { predicate, options } => Ok(FilterState::new(
                FilterKind::Custom {
                    name: None,
                    predicate: Arc::clone(predicate),
                },
                options.clone(),
            )),
            FilterSpec::Named { name, options } => match name.as_str() {
                "level" => {
                    let threshold = optional_str(options, "level", name)?;
                    Ok(FilterState::new(
                        FilterKind::Level { threshold },
                        options.clone(),
                    ))
                }
                "regex" => {
                    let source = optional_str(options, "pattern", name)?.ok_or_else(|| {
                        LoggerError::config("filter", "regex filter requires 'pattern'")
                    })?;
                    let pattern = Regex::new(&source).map_err(|e| {
                        LoggerError::config("filter", format!("invalid regex '{}': {}", source, e))
                    })?;
                    let on_match = match options.get("onMatch") {
                        None => OnMatch::Allow,
                        Some(value) => OnMatch::deserialize(value).map_err(|_| {
                            LoggerError::config("filter", "onMatch must be 'allow' or 'deny'")
                        })?,
                    };
                    Ok(FilterState::new(
                        FilterKind::Regex { pattern, on_match },
                        options.clone(),
                    ))
                }
                "burst" => {
                    let rate = optional_u64(options, "rate", name)?.ok_or_else(|| {
                        LoggerError::config("filter", "burst filter requires 'rate'")
                    })?;
                    let period = optional_u64(options, "period", name)?.unwrap_or(1000);
                    let max_burst = optional_u64(options, "maxBurst", name)?.unwrap_or(0);
                    let max_burst_period =
                        optional_u64(options, "maxBurstPeriod", name)?.unwrap_or(period);
                    Ok(FilterState::new(
                        FilterKind::Burst(BurstWindow::new(
                            rate as usize,
                            Duration::from_millis(period),
                            max_burst as usize,
                            Duration::from_millis(max_burst_period),
                        )),
                        options.clone(),
                    ))
                }
                _ => {
                    let definition = self.definitions.get(name).ok_or_else(|| {
                        LoggerError::config("filter", format!("'{}' is not registered", name))
                    })?;
                    let mut config = definition.defaults.clone();
                    config.extend(options.clone());
                    Ok(FilterState::new(
                        FilterKind::Custom {
                            name: Some(name.clone()),
                            predicate: Arc::clone(&definition.predicate),
                        },
                        config,
                    ))
                }
            },
        }
    }
}

fn optional_str(options: &Map<String, Value>, key: &str, filter: &str) -> Result<Option<String>> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(LoggerError::config(
            "filter",
            format!("'{}' option '{}' must be a string, got {}", filter, key, other),
        )),
    }
}

fn optional_u64(options: &Map<String, Value>, key: &str, filter: &str) -> Result<Option<u64>> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or_else(|| {
            LoggerError::config(
                "filter",
                format!(
                    "'{}' option '{}' must be a non-negative integer, got {}",
                    filter, key, value
                ),
            )
        }),
    }
}
