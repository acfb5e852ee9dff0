//! Full and compact wire forms for one event.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Version marker written into every full-form event.
pub const WIRE_VERSION: &str = "1.0";

fn default_version() -> String {
    WIRE_VERSION.to_string()
}

/// Full JSON wire form: spelled-out field names, ISO8601 timestamp.
///
/// `data`, `metadata`, and `error` are omitted from the serialized object
/// when empty so the line stays compact in JSON-lines storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireEvent {
    /// Wire format version; defaults to [`WIRE_VERSION`] when absent.
    #[serde(default = "default_version")]
    pub version: String,
    /// Unique event id.
    pub id: String,
    /// Dotted event type (e.g. `agent.start`).
    #[serde(rename = "type")]
    pub event_type: String,
    /// Id of the agent that emitted the event; empty when none.
    #[serde(default)]
    pub agent_id: String,
    /// Display name of the emitting agent; empty when none.
    #[serde(default)]
    pub agent_name: String,
    /// ISO8601 / RFC3339 timestamp string, nanosecond precision.
    pub timestamp: String,
    /// Event payload.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
    /// Cross-cutting annotations (trace ids, timings).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
    /// Error message, when the event records a failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Compact wire form: short field names, Unix-seconds timestamp.
///
/// Field mapping: `i` = id, `t` = type, `a` = agent id, `s` = timestamp
/// (whole Unix seconds), `d` = data, `e` = error. Agent name and metadata
/// are not carried; round-tripping through this form loses them along with
/// sub-second timestamp precision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompactEvent {
    pub i: String,
    pub t: String,
    #[serde(default)]
    pub a: String,
    pub s: i64,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub d: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}
