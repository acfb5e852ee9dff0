//! Typed events and the asynchronous bus that distributes them.
//!
//! Every transition in an agent run — start, model call, tool call, tool
//! result, completion, failure — is recorded as an [`Event`] and published
//! through an [`EventBus`](bus::EventBus). Subscribers attach handlers with
//! [`filters`](filter::EventFilter); each subscription owns a bounded buffer
//! and a dedicated handler task, so a slow observer can never stall the
//! publisher (events are dropped for that subscriber instead).
//!
//! Storage backends ([`MemoryEventStorage`], [`FileEventStorage`]) persist
//! events; [`EventRecorder`] wires a bus subscription into storage and
//! [`EventReplayer`] publishes stored events back, optionally preserving the
//! original inter-event timing.
//!
//! Wire forms (full JSON, compact, batches) live in the `event-wire` crate;
//! [`serialize`] bridges to them.

pub mod bus;
pub mod filter;
pub mod record;
pub mod serialize;
pub mod storage;

pub use bus::{default_bus, BusError, EventBus, EventHandler, FnHandler, SubscriptionId};
pub use filter::{EventField, EventFilter, FieldOp};
pub use record::{EventRecorder, EventReplayer};
pub use storage::{EventQuery, EventStorage, FileEventStorage, MemoryEventStorage, StorageError};

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event type constants, dotted by subsystem.
pub mod types {
    pub const AGENT_START: &str = "agent.start";
    pub const AGENT_COMPLETE: &str = "agent.complete";
    pub const AGENT_ERROR: &str = "agent.error";
    pub const GENERATE_BEFORE: &str = "generate.before";
    pub const GENERATE_AFTER: &str = "generate.after";
    pub const TOOL_CALL: &str = "tool.call";
    pub const TOOL_RESULT: &str = "tool.result";
    pub const WORKFLOW_START: &str = "workflow.start";
    pub const WORKFLOW_STEP: &str = "workflow.step";
    pub const WORKFLOW_COMPLETE: &str = "workflow.complete";
    pub const GUARDRAIL_ERROR: &str = "guardrail.error";
}

/// One observed transition in a run.
///
/// Events are ephemeral: created by an emitter, alive as long as a
/// subscriber holds them. Events emitted from within an agent carry that
/// agent's id and name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique id, assigned at construction.
    pub id: String,
    /// Dotted type string (e.g. `"tool.call"`).
    pub event_type: String,
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub agent_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Event {
    /// Creates an event of `event_type` carrying `data`, stamped now.
    pub fn new(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type: event_type.into(),
            agent_id: String::new(),
            agent_name: String::new(),
            timestamp: Utc::now(),
            data,
            metadata: HashMap::new(),
            error: None,
        }
    }

    /// Attributes the event to an agent.
    pub fn with_agent(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.agent_id = id.into();
        self.agent_name = name.into();
        self
    }

    /// Marks the event as recording a failure.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Adds a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Whether this event records a failure: an error is attached or the
    /// type carries an `error` suffix.
    pub fn is_error(&self) -> bool {
        self.error.is_some() || self.event_type.ends_with("error")
    }
}

/// Sink for events; implementations must not block the caller.
///
/// The bus implements this by non-blocking channel offers; agents thread an
/// emitter through their run context so every subsystem reports into the
/// same place. [`NoopEmitter`] discards everything.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: Event);
}

/// Emitter that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEmitter;

impl EventEmitter for NoopEmitter {
    fn emit(&self, _event: Event) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// **Scenario**: is_error is true with an attached error or an error-suffixed type.
    #[test]
    fn is_error_by_field_or_suffix() {
        let ok = Event::new(types::AGENT_COMPLETE, Value::Null);
        assert!(!ok.is_error());
        let by_type = Event::new(types::AGENT_ERROR, Value::Null);
        assert!(by_type.is_error());
        let by_field = Event::new(types::TOOL_RESULT, Value::Null).with_error("boom");
        assert!(by_field.is_error());
    }

    /// **Scenario**: Builder methods attribute agent identity and metadata.
    #[test]
    fn builder_fills_fields() {
        let ev = Event::new(types::TOOL_CALL, json!({"tool": "echo"}))
            .with_agent("a-1", "planner")
            .with_metadata("trace_id", json!("t-9"));
        assert_eq!(ev.agent_id, "a-1");
        assert_eq!(ev.agent_name, "planner");
        assert_eq!(ev.metadata["trace_id"], json!("t-9"));
        assert!(!ev.id.is_empty());
    }

    /// **Scenario**: Two events get distinct ids.
    #[test]
    fn ids_are_unique() {
        let a = Event::new("x", Value::Null);
        let b = Event::new("x", Value::Null);
        assert_ne!(a.id, b.id);
    }
}
