//! Logging environment: level scales, formatters, filters, handles and loggers
//!
//! Everything a logger needs lives in one [`Registry`]. Independent registries
//! never share state, so tests and embedded components can each own one.
//!
//! A `log` call holds the registry lock only while it copies out the ancestor
//! chain. Filters, formatters and targets then run with the registry unlocked,
//! so they may log, reconfigure or read the registry themselves. Each handle
//! and each logger's filter chain is locked on its own. Events are published
//! once the walk is over.
//!
//! Changes that touch several entries at once ([`Registry::create_logger`],
//! [`Registry::configure`]) are staged on a copy and applied only when every
//! step succeeds.

use super::config::LoggingConfig;
use super::error::{LoggerError, Result};
use super::events::{EventBus, EventKind, LogEvent};
use super::exclusive::Exclusive;
use super::filter::{run_chain, FilterContext, FilterRegistry, FilterScope, FilterSpec, FilterState};
use super::formatter::{CustomToken, FormatterConfig, FormatterRegistry};
use super::handle::{FormatterRef, Handle, HandleConfig, HandleOutcome, RenderEnv, DEFAULT_HANDLE};
use super::level::{LevelMapping, LevelRegistry, NPM};
use super::logger::{ancestry, HandleRef, Logger, LoggerConfig, LoggerNode, DEFAULT_ROOT_LEVEL, ROOT_LOGGER};
use super::metrics::DispatchMetrics;
use super::record::{LogInput, LogRecord};
use super::transformer::TransformerRegistry;
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default shutdown timeout for registry cleanup (5 seconds)
///
/// Used when the last reference to a registry is dropped without an explicit
/// [`Registry::shutdown`].
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// A registered handle. The mapper is kept outside the lock for attach checks.
#[derive(Clone)]
struct HandleEntry {
    level_mapper: String,
    handle: Exclusive<Handle>,
}

impl HandleEntry {
    fn new(handle: Handle) -> Self {
        Self {
            level_mapper: handle.level_mapper().to_string(),
            handle: Exclusive::new(handle),
        }
    }
}

#[derive(Clone)]
pub(crate) struct RegistryState {
    levels: Arc<LevelRegistry>,
    formatters: Arc<FormatterRegistry>,
    transformers: Arc<TransformerRegistry>,
    filters: FilterRegistry,
    handles: BTreeMap<String, HandleEntry>,
    loggers: HashMap<String, LoggerNode>,
}

fn effective_level(loggers: &HashMap<String, LoggerNode>, name: &str) -> Option<String> {
    ancestry(name)
        .iter()
        .filter_map(|n| loggers.get(n))
        .find_map(|node| node.level.clone())
}

fn unknown_handle(name: &str) -> LoggerError {
    LoggerError::config("handle", format!("'{}' is not registered", name))
}

impl RegistryState {
    fn new(root_level: Option<String>, default_handle: bool) -> Self {
        let mut root = LoggerNode::new(NPM);
        root.level = root_level;
        let mut handles = BTreeMap::new();
        if default_handle {
            handles.insert(
                DEFAULT_HANDLE.to_string(),
                HandleEntry::new(Handle::default_console()),
            );
            root.handles.push(DEFAULT_HANDLE.to_string());
        }
        let mut loggers = HashMap::new();
        loggers.insert(ROOT_LOGGER.to_string(), root);

        Self {
            levels: Arc::new(LevelRegistry::new()),
            formatters: Arc::new(FormatterRegistry::new()),
            transformers: Arc::new(TransformerRegistry::new()),
            filters: FilterRegistry::new(),
            handles,
            loggers,
        }
    }

    /// Run `change` against a copy and keep the copy only if it succeeds
    fn staged<R>(&mut self, change: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let mut staged = self.clone();
        let result = change(&mut staged)?;
        *self = staged;
        Ok(result)
    }

    fn inherited_mapper(&self, name: &str) -> String {
        ancestry(name)
            .iter()
            .skip(1)
            .find_map(|n| self.loggers.get(n).map(|node| node.level_mapper.clone()))
            .unwrap_or_else(|| NPM.to_string())
    }

    /// Loggers are created on first reference and never removed
    fn ensure_logger(&mut self, name: &str) -> &mut LoggerNode {
        let mapper = if self.loggers.contains_key(name) {
            String::new()
        } else {
            self.inherited_mapper(name)
        };
        self.loggers
            .entry(name.to_string())
            .or_insert_with(|| LoggerNode::new(mapper))
    }

    fn check_level(&self, mapper: &str, level: Option<&str>) -> Result<()> {
        let mapping = self.levels.get(mapper)?;
        match level {
            Some(level) if !mapping.contains(level) => Err(LoggerError::unknown_level(level, mapper)),
            _ => Ok(()),
        }
    }

    /// A handle callers may reconfigure; `default` is off limits
    fn handle_entry(&self, name: &str) -> Result<&HandleEntry> {
        if name == DEFAULT_HANDLE {
            return Err(LoggerError::reserved("handle", name));
        }
        self.handles.get(name).ok_or_else(|| unknown_handle(name))
    }

    fn add_handle(&mut self, config: HandleConfig) -> Result<()> {
        config.validate()?;
        if config.name == DEFAULT_HANDLE {
            return Err(LoggerError::reserved("handle", config.name));
        }
        if self.handles.contains_key(&config.name) {
            return Err(LoggerError::duplicate("handle", config.name));
        }
        self.check_level(&config.level_mapper, config.level.as_deref())?;
        let filters = config
            .filter
            .iter()
            .map(|spec| self.filters.instantiate(spec))
            .collect::<Result<Vec<_>>>()?;

        match &config.formatter {
            None => {}
            Some(FormatterRef::Name(name)) => {
                if !self.formatters.contains(name) {
                    return Err(LoggerError::config(
                        "handle",
                        format!("'{}' uses unknown formatter '{}'", config.name, name),
                    ));
                }
            }
            // Inline formatters belong to their handle and are never registered
            Some(FormatterRef::Inline(formatter)) => formatter.validate(&self.transformers)?,
        }

        let handle = Handle::from_config(&config, filters)?;
        tracing::debug!(handle = %config.name, target = handle.target_name(), "handle added");
        self.handles.insert(config.name, HandleEntry::new(handle));
        Ok(())
    }

    fn remove_handle(&mut self, name: &str) -> Result<HandleEntry> {
        if name == DEFAULT_HANDLE {
            return Err(LoggerError::reserved("handle", name));
        }
        let entry = self.handles.remove(name).ok_or_else(|| unknown_handle(name))?;
        for node in self.loggers.values_mut() {
            node.handles.retain(|attached| attached != name);
        }
        Ok(entry)
    }

    fn create_logger(&mut self, config: LoggerConfig) -> Result<()> {
        if config.name.is_empty() {
            return Err(LoggerError::config("logger", "name must not be empty"));
        }

        let mut handle_names: Vec<String> = Vec::with_capacity(config.handle.len());
        for handle in config.handle {
            let name = match handle {
                HandleRef::Name(name) => {
                    if !self.handles.contains_key(&name) {
                        return Err(unknown_handle(&name));
                    }
                    name
                }
                HandleRef::Inline(handle) => {
                    let name = handle.name.clone();
                    self.add_handle(*handle)?;
                    name
                }
            };
            if !handle_names.contains(&name) {
                handle_names.push(name);
            }
        }

        let mapper = match config.level_mapper {
            Some(mapper) => mapper,
            None => match handle_names.first().and_then(|h| self.handles.get(h)) {
                Some(entry) => entry.level_mapper.clone(),
                None => match self.loggers.get(&config.name) {
                    Some(existing) => existing.level_mapper.clone(),
                    None => self.inherited_mapper(&config.name),
                },
            },
        };
        self.check_level(&mapper, config.level.as_deref())?;
        for name in &handle_names {
            self.check_attachable(&mapper, name)?;
        }
        let filters = config
            .filter
            .iter()
            .map(|spec| self.filters.instantiate(spec))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(logger = %config.name, mapper = %mapper, "logger configured");
        self.loggers.insert(
            config.name,
            LoggerNode {
                level: config.level,
                level_mapper: mapper,
                handles: handle_names,
                filters: Exclusive::new(filters),
                propagate: config.propagate,
                muted: config.muted,
                emit_events: config.emit_events,
            },
        );
        Ok(())
    }

    /// A logger's handles all use the logger's mapper
    fn check_attachable(&self, mapper: &str, handle: &str) -> Result<()> {
        let entry = self.handles.get(handle).ok_or_else(|| unknown_handle(handle))?;
        if entry.level_mapper != mapper {
            return Err(LoggerError::config(
                "logger",
                format!(
                    "handle '{}' uses level mapper '{}' but the logger uses '{}'",
                    handle, entry.level_mapper, mapper
                ),
            ));
        }
        Ok(())
    }

    /// Copy out what a dispatch from `origin` needs. `None` when it is muted.
    fn plan(&mut self, origin: &str) -> Option<DispatchPlan> {
        let node = self.ensure_logger(origin);
        if node.muted {
            return None;
        }
        let origin_mapper = node.level_mapper.clone();

        let steps = ancestry(origin)
            .into_iter()
            .filter_map(|name| {
                let node = self.loggers.get(&name)?;
                let threshold = effective_level(&self.loggers, &name);
                let handles = node
                    .handles
                    .iter()
                    .filter_map(|handle| self.handles.get(handle))
                    .map(|entry| entry.handle.clone())
                    .collect();
                Some(Step {
                    threshold,
                    level_mapper: node.level_mapper.clone(),
                    filters: node.filters.clone(),
                    handles,
                    propagate: node.propagate,
                    emit_events: node.emit_events,
                    name,
                })
            })
            .collect();

        Some(DispatchPlan {
            levels: Arc::clone(&self.levels),
            formatters: Arc::clone(&self.formatters),
            transformers: Arc::clone(&self.transformers),
            origin_mapper,
            steps,
        })
    }
}

/// One existing logger on the ancestor walk
struct Step {
    name: String,
    threshold: Option<String>,
    level_mapper: String,
    filters: Exclusive<Vec<FilterState>>,
    handles: Vec<Exclusive<Handle>>,
    propagate: bool,
    emit_events: bool,
}

/// A dispatch detached from the registry lock
struct DispatchPlan {
    levels: Arc<LevelRegistry>,
    formatters: Arc<FormatterRegistry>,
    transformers: Arc<TransformerRegistry>,
    origin_mapper: String,
    steps: Vec<Step>,
}

impl DispatchPlan {
    fn run(
        self,
        input: LogInput,
        bus: &Arc<EventBus>,
        metrics: &DispatchMetrics,
        pending: &mut Vec<LogEvent>,
    ) -> Result<()> {
        let origin_mapping = Arc::clone(self.levels.get(&self.origin_mapper)?);
        let mut record = LogRecord::from_input(input, &origin_mapping)?;
        let origin_severity = record.severity;

        let env = RenderEnv {
            levels: &self.levels,
            formatters: &self.formatters,
            transformers: &self.transformers,
        };
        let mut fatal = None;

        for step in &self.steps {
            record.logger_name.clone_from(&step.name);
            let mapping = match self.levels.get(&step.level_mapper) {
                Ok(mapping) => Arc::clone(mapping),
                Err(e) => {
                    tracing::warn!(logger = %step.name, error = %e, "skipping logger");
                    continue;
                }
            };

            let severity = if mapping.name() == origin_mapping.name() {
                Some(origin_severity)
            } else {
                mapping.resolve_severity(&record.level)
            };
            let threshold = step
                .threshold
                .as_deref()
                .and_then(|level| mapping.resolve_severity(level));
            let accepted = match severity {
                None => false,
                Some(severity) => {
                    record.severity = severity;
                    let context = FilterContext {
                        level: step.threshold.as_deref(),
                        severity: threshold,
                        mapping: &mapping,
                    };
                    threshold.map_or(true, |t| mapping.meets(severity, t))
                        && step
                            .filters
                            .with(|filters| run_chain(filters, &record, &context))
                            .unwrap_or_else(|e| {
                                tracing::warn!(logger = %step.name, error = %e, "logger filters busy, record rejected");
                                false
                            })
                }
            };

            if !accepted {
                metrics.record_filtered();
                if step.emit_events {
                    pending.push(
                        LogEvent::new(EventKind::Filtered)
                            .logger(&step.name)
                            .record(&record),
                    );
                }
                if !step.propagate {
                    break;
                }
                continue;
            }

            for handle in &step.handles {
                let outcome = handle
                    .with(|handle| handle.process(&mut record, env, &step.name, bus, pending))
                    .and_then(|outcome| outcome);
                match outcome {
                    Ok(HandleOutcome::Emitted) => {
                        metrics.record_emitted();
                    }
                    Ok(HandleOutcome::Filtered) => {
                        metrics.record_filtered();
                    }
                    Ok(HandleOutcome::Failed) => {
                        metrics.record_failed();
                    }
                    Ok(HandleOutcome::Inactive) => {}
                    Err(e) => {
                        metrics.record_failed();
                        if fatal.is_none() {
                            fatal = Some(e);
                        }
                    }
                }
            }
            if !step.propagate {
                break;
            }
        }

        fatal.map_or(Ok(()), Err)
    }
}

/// Close every handle, sharing one deadline
fn close_handles(
    handles: impl IntoIterator<Item = (String, HandleEntry)>,
    bus: &Arc<EventBus>,
    timeout: Duration,
) -> (Result<()>, Vec<LogEvent>) {
    let deadline = Instant::now() + timeout;
    let mut pending = Vec::new();
    let mut result = Ok(());
    for (name, entry) in handles {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let closed = entry
            .handle
            .with(|handle| handle.close(bus, &mut pending, remaining))
            .and_then(|closed| closed);
        if let Err(e) = closed {
            tracing::warn!(handle = %name, error = %e, "failed to close handle");
            if result.is_ok() {
                result = Err(e);
            }
        }
    }
    (result, pending)
}

struct Inner {
    state: Mutex<RegistryState>,
    bus: Arc<EventBus>,
    metrics: DispatchMetrics,
    shut_down: AtomicBool,
    shutdown_timeout: Duration,
}

impl Inner {
    fn publish(&self, pending: Vec<LogEvent>) {
        for event in &pending {
            self.bus.publish(event);
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if self.shut_down.load(Ordering::Acquire) {
            return;
        }
        let handles = std::mem::take(&mut self.state.get_mut().handles);
        let (result, pending) = close_handles(handles, &self.bus, self.shutdown_timeout);
        self.publish(pending);
        if let Err(e) = result {
            tracing::error!(error = %e, "failed to close handles on drop");
        }
    }
}

/// A logging environment
///
/// Cloning is cheap and every clone shares the same state.
///
/// # Example
///
/// ```
/// use rust_handle_logger::prelude::*;
///
/// let registry = Registry::builder().default_handle(false).build();
/// registry
///     .add_formatter(FormatterConfig::new("short").format("%{level} %{message}"))
///     .unwrap();
/// registry
///     .add_handle(HandleConfig::new("events").target(TargetSpec::Null).formatter("short").emit_events(true))
///     .unwrap();
///
/// let events = registry.events();
/// let logger = registry
///     .create_logger(LoggerConfig::new("app").handle("events"))
///     .unwrap();
/// logger.log("info", "Hi").unwrap();
///
/// let event = events.try_recv().unwrap();
/// assert_eq!(event.record.unwrap().output.as_deref(), Some("info Hi"));
/// ```
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl Registry {
    /// Registry with the `default` console handle on `root`
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Run one call through the ancestor walk
    pub(crate) fn dispatch(&self, origin: &str, input: LogInput) -> Result<()> {
        if self.inner.shut_down.load(Ordering::Acquire) {
            return Err(LoggerError::LoggerStopped);
        }
        let plan = self.inner.state.lock().plan(origin);
        let Some(plan) = plan else {
            self.inner.metrics.record_muted();
            return Ok(());
        };
        let mut pending = Vec::new();
        let result = plan.run(input, &self.inner.bus, &self.inner.metrics, &mut pending);
        self.inner.publish(pending);
        result
    }

    // Level scales

    pub fn add_level_mapping(&self, mapping: LevelMapping) -> Result<()> {
        Arc::make_mut(&mut self.inner.state.lock().levels).register(mapping)
    }

    #[must_use]
    pub fn level_mapping(&self, name: &str) -> Option<Arc<LevelMapping>> {
        self.inner.state.lock().levels.get(name).ok().cloned()
    }

    // Formatters, tokens, transformers

    pub fn add_formatter(&self, config: FormatterConfig) -> Result<()> {
        let mut state = self.inner.state.lock();
        let state = &mut *state;
        Arc::make_mut(&mut state.formatters).add(config, &state.transformers)
    }

    pub fn remove_formatter(&self, name: &str) -> Result<()> {
        Arc::make_mut(&mut self.inner.state.lock().formatters).remove(name)
    }

    #[must_use]
    pub fn has_formatter(&self, name: &str) -> bool {
        self.inner.state.lock().formatters.contains(name)
    }

    pub fn add_token(&self, name: impl Into<String>, token: CustomToken) -> Result<()> {
        Arc::make_mut(&mut self.inner.state.lock().formatters).add_token(name, token)
    }

    pub fn remove_token(&self, name: &str) -> Result<()> {
        Arc::make_mut(&mut self.inner.state.lock().formatters).remove_token(name)
    }

    pub fn add_transformer<F>(&self, name: impl Into<String>, transform: F) -> Result<()>
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.inner.state.lock().transformers).add(name, transform)
    }

    pub fn remove_transformer(&self, name: &str) -> Result<()> {
        Arc::make_mut(&mut self.inner.state.lock().transformers).remove(name)
    }

    // Filters

    /// Register a named filter; every attachment gets its own state
    pub fn add_filter<F>(&self, name: impl Into<String>, predicate: F, defaults: Value) -> Result<()>
    where
        F: Fn(&LogRecord, &mut FilterScope<'_>) -> bool + Send + Sync + 'static,
    {
        self.inner.state.lock().filters.add(name, predicate, defaults)
    }

    pub fn remove_filter(&self, name: &str) -> Result<()> {
        self.inner.state.lock().filters.remove(name)
    }

    pub fn attach_filter(&self, logger: &str, filter: FilterSpec) -> Result<()> {
        let (filters, instance) = {
            let mut state = self.inner.state.lock();
            let instance = state.filters.instantiate(&filter)?;
            (state.ensure_logger(logger).filters.clone(), instance)
        };
        filters.with(|filters| filters.push(instance))
    }

    pub fn attach_handle_filter(&self, handle: &str, filter: FilterSpec) -> Result<()> {
        let (shared, instance) = {
            let state = self.inner.state.lock();
            let instance = state.filters.instantiate(&filter)?;
            (state.handle_entry(handle)?.handle.clone(), instance)
        };
        shared.with(|handle| handle.push_filter(instance))
    }

    // Handles

    pub fn add_handle(&self, config: HandleConfig) -> Result<()> {
        self.inner.state.lock().add_handle(config)
    }

    /// Detach the handle from every logger and close its target
    pub fn remove_handle(&self, name: &str) -> Result<()> {
        let entry = self.inner.state.lock().remove_handle(name)?;
        let (result, pending) = close_handles(
            [(name.to_string(), entry)],
            &self.inner.bus,
            self.inner.shutdown_timeout,
        );
        self.inner.publish(pending);
        result
    }

    #[must_use]
    pub fn handle_names(&self) -> Vec<String> {
        self.inner.state.lock().handles.keys().cloned().collect()
    }

    pub fn set_handle_active(&self, handle: &str, active: bool) -> Result<()> {
        let shared = self.inner.state.lock().handle_entry(handle)?.handle.clone();
        shared.with(|handle| handle.set_active(active))
    }

    pub fn set_handle_level(&self, handle: &str, level: Option<&str>) -> Result<()> {
        let shared = {
            let state = self.inner.state.lock();
            let entry = state.handle_entry(handle)?;
            state.check_level(&entry.level_mapper, level)?;
            entry.handle.clone()
        };
        shared.with(|handle| handle.set_level(level.map(str::to_string)))
    }

    // Loggers

    /// Create or reconfigure a logger. On error nothing changes, including
    /// inline handles the config would have added.
    pub fn create_logger(&self, config: LoggerConfig) -> Result<Logger> {
        let name = config.name.clone();
        self.inner
            .state
            .lock()
            .staged(|state| state.create_logger(config))?;
        Ok(Logger::new(name, self.clone()))
    }

    /// Logger by name, created with inherited settings on first reference
    #[must_use]
    pub fn get_logger(&self, name: &str) -> Logger {
        let name = if name.is_empty() { ROOT_LOGGER } else { name };
        self.inner.state.lock().ensure_logger(name);
        Logger::new(name, self.clone())
    }

    #[must_use]
    pub fn root(&self) -> Logger {
        self.get_logger(ROOT_LOGGER)
    }

    #[must_use]
    pub fn logger_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.state.lock().loggers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn attach_handle(&self, logger: &str, handle: &str) -> Result<()> {
        let mut state = self.inner.state.lock();
        let mapper = state.ensure_logger(logger).level_mapper.clone();
        state.check_attachable(&mapper, handle)?;
        let node = state.ensure_logger(logger);
        if !node.handles.iter().any(|attached| attached == handle) {
            node.handles.push(handle.to_string());
        }
        Ok(())
    }

    pub fn detach_handle(&self, logger: &str, handle: &str) -> Result<()> {
        let mut state = self.inner.state.lock();
        let node = state.ensure_logger(logger);
        let before = node.handles.len();
        node.handles.retain(|attached| attached != handle);
        if node.handles.len() == before {
            return Err(LoggerError::config(
                "logger",
                format!("handle '{}' is not attached to '{}'", handle, logger),
            ));
        }
        Ok(())
    }

    pub fn set_level(&self, logger: &str, level: Option<&str>) -> Result<()> {
        let mut state = self.inner.state.lock();
        let mapper = state.ensure_logger(logger).level_mapper.clone();
        state.check_level(&mapper, level)?;
        state.ensure_logger(logger).level = level.map(str::to_string);
        Ok(())
    }

    pub fn set_propagate(&self, logger: &str, propagate: bool) -> Result<()> {
        self.inner.state.lock().ensure_logger(logger).propagate = propagate;
        Ok(())
    }

    pub fn set_muted(&self, logger: &str, muted: bool) -> Result<()> {
        self.inner.state.lock().ensure_logger(logger).muted = muted;
        Ok(())
    }

    pub fn set_emit_events(&self, logger: &str, emit_events: bool) -> Result<()> {
        self.inner.state.lock().ensure_logger(logger).emit_events = emit_events;
        Ok(())
    }

    /// Own level of `logger`, or the nearest ancestor's
    #[must_use]
    pub fn effective_level(&self, logger: &str) -> Option<String> {
        effective_level(&self.inner.state.lock().loggers, logger)
    }

    // Configuration

    /// Apply a whole configuration: level scales, formatters, handles, loggers.
    /// Either all of it takes effect or none of it does.
    pub fn configure(&self, config: LoggingConfig) -> Result<()> {
        self.inner.state.lock().staged(|state| {
            for level in &config.levels {
                Arc::make_mut(&mut state.levels).register(level.build()?)?;
            }
            for formatter in config.formatters {
                Arc::make_mut(&mut state.formatters).add(formatter, &state.transformers)?;
            }
            for handle in config.handles {
                state.add_handle(handle)?;
            }
            for logger in config.loggers {
                state.create_logger(logger)?;
            }
            Ok(())
        })
    }

    pub fn configure_json(&self, json: &str) -> Result<()> {
        self.configure(LoggingConfig::from_json_str(json)?)
    }

    // Events and metrics

    pub fn subscribe<F>(&self, subscriber: F)
    where
        F: Fn(&LogEvent) + Send + Sync + 'static,
    {
        self.inner.bus.subscribe(subscriber);
    }

    /// Every event from now on, through a channel
    #[must_use]
    pub fn events(&self) -> Receiver<LogEvent> {
        self.inner.bus.channel()
    }

    #[must_use]
    pub fn metrics(&self) -> &DispatchMetrics {
        &self.inner.metrics
    }

    // Lifecycle

    pub fn flush(&self) -> Result<()> {
        let handles: Vec<(String, Exclusive<Handle>)> = self
            .inner
            .state
            .lock()
            .handles
            .iter()
            .map(|(name, entry)| (name.clone(), entry.handle.clone()))
            .collect();
        let mut pending = Vec::new();
        let mut result = Ok(());
        for (name, handle) in handles {
            let flushed = handle
                .with(|handle| handle.flush(&self.inner.bus, &mut pending))
                .and_then(|flushed| flushed);
            if let Err(e) = flushed {
                tracing::warn!(handle = %name, error = %e, "flush failed");
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        self.inner.publish(pending);
        result
    }

    /// Close every handle and reject later `log` calls.
    ///
    /// HTTP workers get at most `timeout` to finish in-flight requests.
    /// Calling it again is a no-op.
    pub fn shutdown(&self, timeout: Duration) -> Result<()> {
        if self.inner.shut_down.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let handles = std::mem::take(&mut self.inner.state.lock().handles);
        let (result, pending) = close_handles(handles, &self.inner.bus, timeout);
        self.inner.publish(pending);
        tracing::debug!("registry shut down");
        result
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::Acquire)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Registry")
            .field("handles", &state.handles.keys().collect::<Vec<_>>())
            .field("loggers", &state.loggers.len())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

/// Builder for a [`Registry`]
///
/// # Example
/// ```
/// use rust_handle_logger::Registry;
/// use std::time::Duration;
///
/// let registry = Registry::builder()
///     .default_handle(false)
///     .root_level("debug")
///     .shutdown_timeout(Duration::from_secs(1))
///     .build();
/// assert!(registry.handle_names().is_empty());
/// ```
pub struct RegistryBuilder {
    default_handle: bool,
    root_level: Option<String>,
    shutdown_timeout: Duration,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            default_handle: true,
            root_level: Some(DEFAULT_ROOT_LEVEL.to_string()),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Attach the reserved console handle `default` to `root`
    #[must_use = "builder methods return a new value"]
    pub fn default_handle(mut self, enabled: bool) -> Self {
        self.default_handle = enabled;
        self
    }

    /// Threshold of `root`, an npm level name
    #[must_use = "builder methods return a new value"]
    pub fn root_level(mut self, level: impl Into<String>) -> Self {
        self.root_level = Some(level.into());
        self
    }

    /// Leave `root` without a threshold
    #[must_use = "builder methods return a new value"]
    pub fn no_root_level(mut self) -> Self {
        self.root_level = None;
        self
    }

    /// Bound for closing handles when the registry is dropped
    #[must_use = "builder methods return a new value"]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            inner: Arc::new(Inner {
                state: Mutex::new(RegistryState::new(self.root_level, self.default_handle)),
                bus: Arc::new(EventBus::new()),
                metrics: DispatchMetrics::new(),
                shut_down: AtomicBool::new(false),
                shutdown_timeout: self.shutdown_timeout,
            }),
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
