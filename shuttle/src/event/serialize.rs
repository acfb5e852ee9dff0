//! Bridges between runtime [`Event`]s and the `event-wire` shapes.
//!
//! The full form keeps RFC3339 timestamps with nanosecond precision; the
//! compact form truncates to whole Unix seconds. That asymmetry is load
//! bearing: existing bridges parse the integer form, so a compact
//! round-trip loses sub-second precision on purpose.

use chrono::{DateTime, SecondsFormat, Utc};
use event_wire::{CompactEvent, EventBatch, WireEvent, WIRE_VERSION};
use thiserror::Error;

use super::Event;

/// Errors from wire bridging.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("invalid wire timestamp {0:?}")]
    Timestamp(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Converts to the full wire form.
pub fn to_wire(event: &Event) -> WireEvent {
    WireEvent {
        version: WIRE_VERSION.to_string(),
        id: event.id.clone(),
        event_type: event.event_type.clone(),
        agent_id: event.agent_id.clone(),
        agent_name: event.agent_name.clone(),
        timestamp: event.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
        data: event.data.clone(),
        metadata: event.metadata.clone(),
        error: event.error.clone(),
    }
}

/// Converts back from the full wire form.
pub fn from_wire(wire: WireEvent) -> Result<Event, SerializeError> {
    let timestamp = DateTime::parse_from_rfc3339(&wire.timestamp)
        .map_err(|_| SerializeError::Timestamp(wire.timestamp.clone()))?
        .with_timezone(&Utc);
    Ok(Event {
        id: wire.id,
        event_type: wire.event_type,
        agent_id: wire.agent_id,
        agent_name: wire.agent_name,
        timestamp,
        data: wire.data,
        metadata: wire.metadata,
        error: wire.error,
    })
}

/// Converts to the compact form (whole-second timestamp; agent name and
/// metadata are not carried).
pub fn to_compact(event: &Event) -> CompactEvent {
    CompactEvent {
        i: event.id.clone(),
        t: event.event_type.clone(),
        a: event.agent_id.clone(),
        s: event.timestamp.timestamp(),
        d: event.data.clone(),
        e: event.error.clone(),
    }
}

/// Reconstructs an event from the compact form. Fields the compact form
/// does not carry come back empty.
pub fn from_compact(compact: CompactEvent) -> Result<Event, SerializeError> {
    let timestamp = DateTime::from_timestamp(compact.s, 0)
        .ok_or_else(|| SerializeError::Timestamp(compact.s.to_string()))?;
    Ok(Event {
        id: compact.i,
        event_type: compact.t,
        agent_id: compact.a,
        agent_name: String::new(),
        timestamp,
        data: compact.d,
        metadata: Default::default(),
        error: compact.e,
    })
}

/// Serializes to one full-form JSON line.
pub fn to_json(event: &Event) -> Result<String, serde_json::Error> {
    serde_json::to_string(&to_wire(event))
}

/// Parses a full-form JSON line.
pub fn from_json(line: &str) -> Result<Event, SerializeError> {
    let wire: WireEvent = serde_json::from_str(line)?;
    from_wire(wire)
}

/// Serializes to one compact JSON line.
pub fn to_compact_json(event: &Event) -> Result<String, serde_json::Error> {
    serde_json::to_string(&to_compact(event))
}

/// Parses a compact JSON line.
pub fn from_compact_json(line: &str) -> Result<Event, SerializeError> {
    let compact: CompactEvent = serde_json::from_str(line)?;
    from_compact(compact)
}

/// Groups events into a batch with a fresh batch id, stamped now.
pub fn to_batch(events: &[Event]) -> EventBatch {
    EventBatch::new(
        uuid::Uuid::new_v4().to_string(),
        Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true),
        events.iter().map(to_wire).collect(),
    )
}
