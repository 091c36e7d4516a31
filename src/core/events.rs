//! Dispatch events
//!
//! Every notification (`logged`, `error`, `filtered`, stream lifecycle) is a
//! [`LogEvent`] tagged with the handle and logger it came from and published on
//! one [`EventBus`] per registry. Subscribers are closures or channel receivers.

use super::error::LoggerError;
use super::record::LogRecord;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum EventKind {
    /// A target emitted the record
    Logged,
    /// A target failed
    Error(Arc<LoggerError>),
    /// A logger or handle filter dropped the record
    Filtered,
    /// A buffered stream was flushed
    Drain,
    /// A file-backed stream was closed
    Close,
    /// A file-backed stream finished writing its buffered data
    Finish,
}

impl EventKind {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Logged => "logged",
            EventKind::Error(_) => "error",
            EventKind::Filtered => "filtered",
            EventKind::Drain => "drain",
            EventKind::Close => "close",
            EventKind::Finish => "finish",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEvent {
    pub kind: EventKind,
    /// Handle that produced the event, absent for logger-level filtering
    pub handle: Option<String>,
    pub logger: Option<String>,
    /// Snapshot of the record at the time of the event
    pub record: Option<LogRecord>,
}

impl LogEvent {
    #[must_use]
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            handle: None,
            logger: None,
            record: None,
        }
    }

    #[must_use]
    pub fn handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    #[must_use]
    pub fn logger(mut self, logger: impl Into<String>) -> Self {
        self.logger = Some(logger.into());
        self
    }

    #[must_use]
    pub fn record(mut self, record: &LogRecord) -> Self {
        self.record = Some(record.clone());
        self
    }

    #[must_use]
    pub fn is_logged(&self) -> bool {
        matches!(self.kind, EventKind::Logged)
    }

    #[must_use]
    pub fn is_filtered(&self) -> bool {
        matches!(self.kind, EventKind::Filtered)
    }

    #[must_use]
    pub fn error(&self) -> Option<&LoggerError> {
        match &self.kind {
            EventKind::Error(err) => Some(err),
            _ => None,
        }
    }
}

pub type Subscriber = Arc<dyn Fn(&LogEvent) + Send + Sync>;

/// Fan-out of events to every subscriber
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<Vec<Subscriber>>,
    channels: RwLock<Vec<Sender<LogEvent>>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, subscriber: F)
    where
        F: Fn(&LogEvent) + Send + Sync + 'static,
    {
        self.subscribers.write().push(Arc::new(subscriber));
    }

    /// Subscribe through an unbounded channel.
    ///
    /// Dropping the receiver unsubscribes on the next publish.
    pub fn channel(&self) -> Receiver<LogEvent> {
        let (sender, receiver) = unbounded();
        self.channels.write().push(sender);
        receiver
    }

    pub fn publish(&self, event: &LogEvent) {
        // Clone the lists so subscribers may subscribe further without deadlocking
        let subscribers = self.subscribers.read().clone();
        for subscriber in subscribers {
            subscriber(event);
        }

        let channels = self.channels.read().clone();
        let closed: Vec<Sender<LogEvent>> = channels
            .into_iter()
            .filter(|sender| sender.send(event.clone()).is_err())
            .collect();
        if !closed.is_empty() {
            self.channels
                .write()
                .retain(|sender| !closed.iter().any(|c| c.same_channel(sender)));
        }
    }

    #[must_use]
    pub fn has_subscribers(&self) -> bool {
        !self.subscribers.read().is_empty() || !self.channels.read().is_empty()
    }

    /// Callbacks plus live channel receivers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len() + self.channels.read().len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Publishing handle for work that completes after dispatch (HTTP worker threads)
#[derive(Debug, Clone)]
pub struct DeferredEvents {
    bus: Arc<EventBus>,
    handle: String,
    logger: String,
    enabled: bool,
}

impl DeferredEvents {
    pub(crate) fn new(bus: Arc<EventBus>, handle: &str, logger: &str, enabled: bool) -> Self {
        Self {
            bus,
            handle: handle.to_string(),
            logger: logger.to_string(),
            enabled,
        }
    }

    pub fn logged(&self, record: &LogRecord) {
        self.publish(EventKind::Logged, Some(record));
    }

    /// Report a failure. Without event emission the failure only reaches diagnostics.
    pub fn error(&self, error: LoggerError, record: &LogRecord) {
        if self.enabled {
            self.publish(EventKind::Error(Arc::new(error)), Some(record));
        } else {
            tracing::warn!(handle = %self.handle, error = %error, "target failed");
        }
    }

    fn publish(&self, kind: EventKind, record: Option<&LogRecord>) {
        if !self.enabled {
            return;
        }
        let mut event = LogEvent::new(kind).handle(&self.handle).logger(&self.logger);
        if let Some(record) = record {
            event = event.record(record);
        }
        self.bus.publish(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let count = Arc::clone(&count);
            bus.subscribe(move |_| {
                count.fetch_add(1, Ordering::Relaxed);
            });
        }
        bus.publish(&LogEvent::new(EventKind::Drain));
        assert_eq!(count.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_channel_subscription() {
        let bus = EventBus::new();
        assert!(!bus.has_subscribers());
        let receiver = bus.channel();
        let record = LogRecord::new("info", 2, "hello");
        bus.publish(&LogEvent::new(EventKind::Logged).handle("h").record(&record));

        let event = receiver.try_recv().unwrap();
        assert!(event.is_logged());
        assert_eq!(event.handle.as_deref(), Some("h"));
        assert_eq!(event.record.unwrap().message, "hello");
    }

    #[test]
    fn test_dropped_channel_unsubscribes() {
        let bus = EventBus::new();
        let kept = bus.channel();
        let dropped = bus.channel();
        assert_eq!(bus.subscriber_count(), 2);

        drop(dropped);
        bus.publish(&LogEvent::new(EventKind::Drain));
        assert_eq!(bus.subscriber_count(), 1);
        assert!(kept.try_recv().is_ok());

        drop(kept);
        bus.publish(&LogEvent::new(EventKind::Drain));
        assert!(!bus.has_subscribers());
    }

    #[test]
    fn test_deferred_events_respect_flag() {
        let bus = Arc::new(EventBus::new());
        let receiver = bus.channel();
        let record = LogRecord::new("info", 2, "x");

        DeferredEvents::new(Arc::clone(&bus), "quiet", "root", false).logged(&record);
        assert!(receiver.try_recv().is_err());

        DeferredEvents::new(Arc::clone(&bus), "loud", "root", true)
            .error(LoggerError::writer("boom"), &record);
        let event = receiver.try_recv().unwrap();
        assert_eq!(event.kind.name(), "error");
        assert!(event.error().is_some());
    }
}
