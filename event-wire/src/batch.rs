//! Batch form: a group of full-form events under one batch id.

use serde::{Deserialize, Serialize};

use crate::event::WireEvent;

/// A serialized group of events.
///
/// `count` always equals `events.len()`; it is carried explicitly so
/// consumers can sanity-check truncated transfers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventBatch {
    /// Unique id for this batch.
    pub batch_id: String,
    /// ISO8601 timestamp at which the batch was assembled.
    pub timestamp: String,
    /// Number of events in the batch.
    pub count: usize,
    /// The events, in original publish order.
    pub events: Vec<WireEvent>,
}

impl EventBatch {
    /// Assembles a batch, filling `count` from the event list.
    pub fn new(batch_id: impl Into<String>, timestamp: impl Into<String>, events: Vec<WireEvent>) -> Self {
        Self {
            batch_id: batch_id.into(),
            timestamp: timestamp.into(),
            count: events.len(),
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: `new` fills count from the event list and round-trips.
    #[test]
    fn batch_count_matches_events() {
        let ev = WireEvent {
            version: crate::WIRE_VERSION.to_string(),
            id: "e1".into(),
            event_type: "agent.start".into(),
            agent_id: String::new(),
            agent_name: String::new(),
            timestamp: "2024-01-01T00:00:00Z".into(),
            data: serde_json::Value::Null,
            metadata: Default::default(),
            error: None,
        };
        let batch = EventBatch::new("b1", "2024-01-01T00:00:01Z", vec![ev.clone(), ev]);
        assert_eq!(batch.count, 2);
        let s = serde_json::to_string(&batch).expect("serialize");
        let back: EventBatch = serde_json::from_str(&s).expect("deserialize");
        assert_eq!(batch, back);
    }
}
