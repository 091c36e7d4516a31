//! Target trait for output destinations

use super::error::{LoggerError, Result};
use super::events::{DeferredEvents, EventBus, EventKind, LogEvent};
use super::record::LogRecord;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// An output sink owned by one handle.
///
/// `emit` receives the record after formatting. Successful writes report
/// `logged` through the context; a returned error is routed by the handle to
/// the `error` event, or back to the caller when it is fatal.
pub trait Target: Send {
    fn emit(&mut self, record: &LogRecord, ctx: &mut TargetContext<'_>) -> Result<()>;

    fn flush(&mut self, _ctx: &mut TargetContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Release streams and workers. Called once, on handle removal or shutdown.
    fn close(&mut self, _ctx: &mut TargetContext<'_>) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}

/// Everything a target may use while handling one record
pub struct TargetContext<'a> {
    pub handle: &'a str,
    /// Logger currently walking the record, `None` outside dispatch
    pub logger: Option<&'a str>,
    pub emit_events: bool,
    /// Handle options not understood by the built-in targets
    pub options: &'a Map<String, Value>,
    /// Upper bound for blocking work in `close`
    pub timeout: Duration,
    bus: &'a Arc<EventBus>,
    pending: &'a mut Vec<LogEvent>,
}

impl<'a> TargetContext<'a> {
    pub(crate) fn new(
        handle: &'a str,
        logger: Option<&'a str>,
        emit_events: bool,
        options: &'a Map<String, Value>,
        bus: &'a Arc<EventBus>,
        pending: &'a mut Vec<LogEvent>,
    ) -> Self {
        Self {
            handle,
            logger,
            emit_events,
            options,
            timeout: Duration::from_secs(5),
            bus,
            pending,
        }
    }

    #[must_use]
    pub(crate) fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn logged(&mut self, record: &LogRecord) {
        self.push(EventKind::Logged, Some(record));
    }

    pub fn filtered(&mut self, record: &LogRecord) {
        self.push(EventKind::Filtered, Some(record));
    }

    /// Report a non-fatal failure. Without events it only reaches diagnostics.
    pub fn error(&mut self, error: LoggerError, record: Option<&LogRecord>) {
        if self.emit_events {
            self.push(EventKind::Error(Arc::new(error)), record);
        } else {
            tracing::warn!(handle = %self.handle, error = %error, "target failed");
        }
    }

    /// Stream lifecycle notification (`drain`, `finish`, `close`)
    pub fn lifecycle(&mut self, kind: EventKind) {
        self.push(kind, None);
    }

    /// Event sink that outlives this call, for targets finishing work elsewhere
    #[must_use]
    pub fn deferred(&self) -> DeferredEvents {
        DeferredEvents::new(
            Arc::clone(self.bus),
            self.handle,
            self.logger.unwrap_or_default(),
            self.emit_events,
        )
    }

    fn push(&mut self, kind: EventKind, record: Option<&LogRecord>) {
        if !self.emit_events {
            return;
        }
        let mut event = LogEvent::new(kind).handle(self.handle);
        if let Some(logger) = self.logger {
            event = event.logger(logger);
        }
        if let Some(record) = record {
            event = event.record(record);
        }
        self.pending.push(event);
    }
}
