//! Recording a bus into storage, and replaying storage into a bus.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::bus::{EventBus, EventHandler, SubscriptionId};
use super::filter::EventFilter;
use super::storage::{EventStorage, MemoryEventStorage, StorageError};
use super::Event;

struct StoreHandler {
    storage: Arc<dyn EventStorage>,
}

#[async_trait]
impl EventHandler for StoreHandler {
    async fn handle(&self, event: Event) {
        if let Err(err) = self.storage.store(&event).await {
            warn!(error = %err, event_type = %event.event_type, "event recording failed");
        }
    }
}

/// Subscribes to a bus and stores every matching event.
///
/// Dropping the recorder does not unsubscribe; call [`EventRecorder::stop`]
/// to detach from the bus.
pub struct EventRecorder {
    bus: EventBus,
    sub_id: SubscriptionId,
}

impl EventRecorder {
    /// Starts recording events matching all `filters` into `storage`.
    pub fn start(bus: &EventBus, storage: Arc<dyn EventStorage>, filters: Vec<EventFilter>) -> Self {
        let sub_id = bus.subscribe(StoreHandler { storage }, filters);
        Self {
            bus: bus.clone(),
            sub_id,
        }
    }

    /// Detaches from the bus; already-buffered events still get stored.
    pub fn stop(self) {
        self.bus.unsubscribe(self.sub_id);
    }
}

/// Replays stored events into a bus.
///
/// `speed` is a multiplier over the original inter-event intervals:
/// `1.0` replays in real time, `2.0` twice as fast, `0.0` instantly.
pub struct EventReplayer {
    storage: Arc<MemoryEventStorage>,
    speed: f64,
    filter: Option<EventFilter>,
    transform: Option<Arc<dyn Fn(Event) -> Event + Send + Sync>>,
}

impl EventReplayer {
    pub fn new(storage: Arc<MemoryEventStorage>) -> Self {
        Self {
            storage,
            speed: 1.0,
            filter: None,
            transform: None,
        }
    }

    /// Sets the replay speed multiplier; `0.0` means no inter-event delay.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed.max(0.0);
        self
    }

    /// Replays only events matching `filter`.
    pub fn with_filter(mut self, filter: EventFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Applies `transform` to each event before publishing.
    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Event) -> Event + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Publishes the stored events into `bus` in timestamp order,
    /// preserving inter-event intervals scaled by the speed multiplier.
    /// Returns how many events were published.
    pub async fn replay(&self, bus: &EventBus) -> Result<usize, StorageError> {
        let mut events = self.storage.events();
        events.sort_by_key(|e| e.timestamp);

        let mut published = 0usize;
        let mut previous: Option<chrono::DateTime<chrono::Utc>> = None;
        for event in events {
            if let Some(filter) = &self.filter {
                if !filter.matches(&event) {
                    continue;
                }
            }
            if self.speed > 0.0 {
                if let Some(prev) = previous {
                    let gap = (event.timestamp - prev).to_std().unwrap_or_default();
                    let scaled = gap.div_f64(self.speed);
                    if !scaled.is_zero() {
                        tokio::time::sleep(scaled).await;
                    }
                }
            }
            previous = Some(event.timestamp);

            let event = match &self.transform {
                Some(t) => t(event),
                None => event,
            };
            bus.publish(event);
            published += 1;
        }
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::types;
    use serde_json::Value;
    use std::sync::Mutex;

    struct Capture(Arc<Mutex<Vec<Event>>>);

    #[async_trait]
    impl EventHandler for Capture {
        async fn handle(&self, event: Event) {
            self.0.lock().unwrap().push(event);
        }
    }

    /// **Scenario**: A recorder stores only matching events; stop detaches it.
    #[tokio::test]
    async fn recorder_stores_matching_events() {
        let bus = EventBus::new();
        let storage = Arc::new(MemoryEventStorage::new());
        let recorder = EventRecorder::start(
            &bus,
            storage.clone(),
            vec![EventFilter::types([types::TOOL_CALL])],
        );

        bus.publish(Event::new(types::TOOL_CALL, Value::Null));
        bus.publish(Event::new(types::AGENT_START, Value::Null));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        recorder.stop();
        bus.publish(Event::new(types::TOOL_CALL, Value::Null));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        bus.close().await;

        assert_eq!(storage.count(), 1);
        assert_eq!(storage.events()[0].event_type, types::TOOL_CALL);
    }

    /// **Scenario**: Instant replay republishes stored events field-for-field, in order.
    #[tokio::test]
    async fn instant_replay_preserves_events() {
        let storage = Arc::new(MemoryEventStorage::new());
        let mut originals = Vec::new();
        for i in 0..10 {
            let mut ev = Event::new(format!("step.{i}"), serde_json::json!({"i": i}));
            ev.timestamp = chrono::Utc::now() + chrono::Duration::seconds(i);
            storage.store(&ev).await.unwrap();
            originals.push(ev);
        }

        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(Capture(seen.clone()), vec![]);

        let replayer = EventReplayer::new(storage).with_speed(0.0);
        let published = replayer.replay(&bus).await.unwrap();
        assert_eq!(published, 10);

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        bus.close().await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 10);
        for (got, want) in seen.iter().zip(&originals) {
            assert_eq!(got, want);
        }
    }

    /// **Scenario**: Replay applies filter and transformer.
    #[tokio::test]
    async fn replay_filter_and_transform() {
        let storage = Arc::new(MemoryEventStorage::new());
        storage.store(&Event::new(types::TOOL_CALL, Value::Null)).await.unwrap();
        storage.store(&Event::new(types::AGENT_START, Value::Null)).await.unwrap();

        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(Capture(seen.clone()), vec![]);

        let replayer = EventReplayer::new(storage)
            .with_speed(0.0)
            .with_filter(EventFilter::types([types::TOOL_CALL]))
            .with_transform(|ev| ev.with_metadata("replayed", serde_json::json!(true)));
        assert_eq!(replayer.replay(&bus).await.unwrap(), 1);

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        bus.close().await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].metadata["replayed"], serde_json::json!(true));
    }
}
