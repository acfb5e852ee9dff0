//! The event bus: non-blocking pub/sub with per-subscription buffers.
//!
//! Each subscription owns a bounded channel (default 100) and a dedicated
//! handler task that processes events sequentially in arrival order.
//! `publish` offers the event to every matching subscription with a
//! non-blocking send; when a buffer is full the event is dropped for that
//! subscriber (drop-new) and counted. The publisher never waits on a slow
//! handler.
//!
//! # Example
//!
//! ```no_run
//! use shuttle::event::{Event, EventBus, EventFilter, FnHandler};
//!
//! # async fn demo() {
//! let bus = EventBus::new();
//! let sub = bus.subscribe(
//!     FnHandler::new(|ev: Event| println!("{}", ev.event_type)),
//!     vec![EventFilter::pattern("tool.*").unwrap()],
//! );
//! bus.publish(Event::new("tool.call", serde_json::Value::Null));
//! bus.unsubscribe(sub);
//! bus.close().await;
//! # }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use super::filter::{wildcard_to_regex, EventFilter};
use super::{Event, EventEmitter};

/// Default per-subscription buffer capacity.
pub const DEFAULT_BUFFER_SIZE: usize = 100;

/// Default per-event handler timeout.
pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from bus operations.
#[derive(Debug, Error)]
pub enum BusError {
    /// A pattern subscription carried an invalid wildcard/regex.
    #[error("invalid subscription pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    /// Publish was cancelled by the caller's context.
    #[error("publish cancelled")]
    Cancelled,
    /// The bus has been closed.
    #[error("event bus closed")]
    Closed,
}

/// Receives events for one subscription, one at a time in arrival order.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: Event);
}

/// Adapter turning a synchronous closure into an [`EventHandler`].
pub struct FnHandler<F>(F);

impl<F> FnHandler<F>
where
    F: Fn(Event) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> EventHandler for FnHandler<F>
where
    F: Fn(Event) + Send + Sync,
{
    async fn handle(&self, event: Event) {
        (self.0)(event);
    }
}

/// Opaque handle identifying a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct SubEntry {
    tx: mpsc::Sender<Event>,
    filters: Vec<EventFilter>,
    dropped: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

struct BusInner {
    subs: RwLock<HashMap<u64, SubEntry>>,
    next_id: AtomicU64,
    buffer_size: usize,
    handler_timeout: Duration,
    closed: AtomicBool,
}

/// In-process pub/sub for [`Event`]s. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// A bus with the default buffer size and handler timeout.
    pub fn new() -> Self {
        Self::with_buffer_size(DEFAULT_BUFFER_SIZE)
    }

    /// A bus whose subscriptions buffer at most `buffer_size` events.
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self::with_config(buffer_size, DEFAULT_HANDLER_TIMEOUT)
    }

    /// A bus with explicit buffer capacity and per-event handler timeout.
    pub fn with_config(buffer_size: usize, handler_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(BusInner {
                subs: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                buffer_size: buffer_size.max(1),
                handler_timeout,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Registers `handler` to receive every event matching all `filters`.
    ///
    /// The handler runs in its own task; events queue in a bounded buffer
    /// and are processed one at a time, in publish order.
    pub fn subscribe<H>(&self, handler: H, filters: Vec<EventFilter>) -> SubscriptionId
    where
        H: EventHandler + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, mut rx) = mpsc::channel::<Event>(self.inner.buffer_size);
        let dropped = Arc::new(AtomicU64::new(0));
        let timeout = self.inner.handler_timeout;
        let handler = Arc::new(handler);

        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let event_type = event.event_type.clone();
                if tokio::time::timeout(timeout, handler.handle(event)).await.is_err() {
                    warn!(event_type = %event_type, "event handler timed out");
                }
            }
        });

        let entry = SubEntry {
            tx,
            filters,
            dropped,
            task,
        };
        self.inner
            .subs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, entry);
        SubscriptionId(id)
    }

    /// Registers `handler` for event types matching the wildcard `pattern`
    /// (`*` matches any run of characters), ANDed with `filters`.
    pub fn subscribe_pattern<H>(
        &self,
        pattern: &str,
        handler: H,
        mut filters: Vec<EventFilter>,
    ) -> Result<SubscriptionId, BusError>
    where
        H: EventHandler + 'static,
    {
        let regex = wildcard_to_regex(pattern)?;
        filters.push(EventFilter::Pattern(regex));
        Ok(self.subscribe(handler, filters))
    }

    /// Cancels a subscription. Calling twice is a no-op the second time;
    /// the handler task drains its buffer and exits.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let entry = self
            .inner
            .subs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id.0);
        // Dropping the sender lets the handler task finish its queue and stop.
        drop(entry.map(|e| e.tx));
    }

    /// Offers `event` to every matching subscription without blocking.
    ///
    /// Full buffers drop the new event for that subscriber only.
    pub fn publish(&self, event: Event) {
        if self.inner.closed.load(Ordering::Acquire) {
            return;
        }
        let subs = self.inner.subs.read().unwrap_or_else(|e| e.into_inner());
        for entry in subs.values() {
            if !entry.filters.iter().all(|f| f.matches(&event)) {
                continue;
            }
            match entry.tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    entry.dropped.fetch_add(1, Ordering::Relaxed);
                    trace!(event_type = %event.event_type, "subscriber buffer full, event dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }
    }

    /// Like [`EventBus::publish`], but observes a cancellation token and the
    /// closed flag, reporting both.
    pub fn publish_ctx(&self, ctx: &CancellationToken, event: Event) -> Result<(), BusError> {
        if ctx.is_cancelled() {
            return Err(BusError::Cancelled);
        }
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(BusError::Closed);
        }
        self.publish(event);
        Ok(())
    }

    /// Events dropped so far for a subscription's full buffer.
    pub fn dropped(&self, id: SubscriptionId) -> u64 {
        self.inner
            .subs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id.0)
            .map(|e| e.dropped.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.inner.subs.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Closes the bus: stops accepting publishes, cancels all
    /// subscriptions, and waits for handlers to drain. Idempotent.
    pub async fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        let entries: Vec<SubEntry> = {
            let mut subs = self.inner.subs.write().unwrap_or_else(|e| e.into_inner());
            subs.drain().map(|(_, e)| e).collect()
        };
        for entry in entries {
            drop(entry.tx);
            if let Err(err) = entry.task.await {
                if !err.is_cancelled() {
                    warn!(error = %err, "event handler task failed during close");
                }
            }
        }
    }
}

impl EventEmitter for EventBus {
    fn emit(&self, event: Event) {
        self.publish(event);
    }
}

static DEFAULT_BUS: Lazy<Mutex<EventBus>> = Lazy::new(|| Mutex::new(EventBus::new()));

/// The process-wide default bus.
///
/// Tests and embedders that need isolation should construct their own
/// [`EventBus`] and pass it explicitly; this singleton exists for callers
/// that just want events to go somewhere observable.
pub fn default_bus() -> EventBus {
    DEFAULT_BUS.lock().unwrap_or_else(|e| e.into_inner()).clone()
}

/// Replaces the process-wide default bus, returning the previous one.
/// Intended for tests that need a fresh, isolated default.
pub fn set_default_bus(bus: EventBus) -> EventBus {
    let mut guard = DEFAULT_BUS.lock().unwrap_or_else(|e| e.into_inner());
    std::mem::replace(&mut *guard, bus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::types;
    use serde_json::Value;
    use std::sync::Mutex as StdMutex;

    struct Capture {
        seen: Arc<StdMutex<Vec<String>>>,
    }

    #[async_trait]
    impl EventHandler for Capture {
        async fn handle(&self, event: Event) {
            self.seen.lock().unwrap().push(event.event_type);
        }
    }

    async fn drain(bus: &EventBus) {
        // Give handler tasks a chance to work through their buffers.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = bus;
    }

    /// **Scenario**: A subscriber observes matching events in publish order.
    #[tokio::test]
    async fn fifo_delivery_per_subscription() {
        let bus = EventBus::new();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        bus.subscribe(Capture { seen: seen.clone() }, vec![]);

        for i in 0..5 {
            bus.publish(Event::new(format!("step.{i}"), Value::Null));
        }
        drain(&bus).await;
        bus.close().await;

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec!["step.0", "step.1", "step.2", "step.3", "step.4"]);
    }

    /// **Scenario**: Filters narrow delivery; pattern subscriptions reject bad patterns.
    #[tokio::test]
    async fn filtered_and_pattern_subscriptions() {
        let bus = EventBus::new();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        bus.subscribe_pattern("tool.*", Capture { seen: seen.clone() }, vec![])
            .expect("valid pattern");

        bus.publish(Event::new(types::TOOL_CALL, Value::Null));
        bus.publish(Event::new(types::AGENT_START, Value::Null));
        bus.publish(Event::new(types::TOOL_RESULT, Value::Null));
        drain(&bus).await;
        bus.close().await;

        assert_eq!(*seen.lock().unwrap(), vec![types::TOOL_CALL, types::TOOL_RESULT]);
    }

    /// **Scenario**: Unsubscribing stops delivery; a second unsubscribe is a no-op.
    #[tokio::test]
    async fn unsubscribe_idempotent() {
        let bus = EventBus::new();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sub = bus.subscribe(Capture { seen: seen.clone() }, vec![]);

        bus.publish(Event::new("a", Value::Null));
        drain(&bus).await;
        bus.unsubscribe(sub);
        bus.unsubscribe(sub);
        bus.publish(Event::new("b", Value::Null));
        drain(&bus).await;
        bus.close().await;

        assert_eq!(*seen.lock().unwrap(), vec!["a"]);
        assert_eq!(bus.subscription_count(), 0);
    }

    /// **Scenario**: Publishing to a closed bus is a silent no-op; close is idempotent.
    #[tokio::test]
    async fn close_idempotent_and_publish_after_close() {
        let bus = EventBus::new();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        bus.subscribe(Capture { seen: seen.clone() }, vec![]);
        bus.close().await;
        bus.close().await;
        bus.publish(Event::new("late", Value::Null));
        assert!(seen.lock().unwrap().is_empty());

        let token = CancellationToken::new();
        assert!(matches!(
            bus.publish_ctx(&token, Event::new("late", Value::Null)),
            Err(BusError::Closed)
        ));
        token.cancel();
        assert!(matches!(
            bus.publish_ctx(&token, Event::new("late", Value::Null)),
            Err(BusError::Cancelled)
        ));
    }
}
