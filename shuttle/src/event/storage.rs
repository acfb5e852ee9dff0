//! Event storage backends: in-memory queries and append-only files.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::serialize;
use super::Event;

/// Errors from storing or reading events.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("event serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("stored event malformed: {0}")]
    Malformed(#[from] serialize::SerializeError),
}

/// Sink for events; backends decide durability.
#[async_trait]
pub trait EventStorage: Send + Sync {
    async fn store(&self, event: &Event) -> Result<(), StorageError>;
}

/// Query over stored events; unset fields match everything.
#[derive(Clone, Debug, Default)]
pub struct EventQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub agent_id: Option<String>,
    pub event_type: Option<String>,
}

impl EventQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    pub fn to(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    pub fn agent_id(mut self, id: impl Into<String>) -> Self {
        self.agent_id = Some(id.into());
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    fn matches(&self, event: &Event) -> bool {
        self.from.map_or(true, |f| event.timestamp >= f)
            && self.to.map_or(true, |t| event.timestamp <= t)
            && self.agent_id.as_deref().map_or(true, |a| a == event.agent_id)
            && self
                .event_type
                .as_deref()
                .map_or(true, |t| t == event.event_type)
    }
}

/// In-memory store backing the recorder/replayer and tests.
///
/// Keeps events in arrival order; queries filter a snapshot.
#[derive(Debug, Default)]
pub struct MemoryEventStorage {
    events: RwLock<Vec<Event>>,
}

impl MemoryEventStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored events, in arrival order (snapshot copy).
    pub fn events(&self) -> Vec<Event> {
        self.events.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Events matching `query`, in arrival order.
    pub fn query(&self, query: &EventQuery) -> Vec<Event> {
        self.events
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.events.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn clear(&self) {
        self.events.write().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// A lazy stream over a snapshot of the stored events.
    pub fn stream(&self) -> tokio_stream::Iter<std::vec::IntoIter<Event>> {
        tokio_stream::iter(self.events())
    }
}

#[async_trait]
impl EventStorage for MemoryEventStorage {
    async fn store(&self, event: &Event) -> Result<(), StorageError> {
        self.events
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
        Ok(())
    }
}

/// Append-only file store: one full-form JSON event per line, no framing.
pub struct FileEventStorage {
    file: Mutex<File>,
}

impl FileEventStorage {
    /// Opens (creating if needed) `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Reads every event back from a JSON-lines file. Blank lines are
    /// skipped; a malformed line fails the whole read.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<Event>, StorageError> {
        let content = std::fs::read_to_string(path)?;
        let mut events = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            events.push(serialize::from_json(line)?);
        }
        Ok(events)
    }
}

#[async_trait]
impl EventStorage for FileEventStorage {
    async fn store(&self, event: &Event) -> Result<(), StorageError> {
        let line = serialize::to_json(event)?;
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::types;
    use serde_json::{json, Value};

    fn ev(event_type: &str, agent: &str) -> Event {
        Event::new(event_type, json!({"n": 1})).with_agent(agent, agent)
    }

    /// **Scenario**: Memory storage keeps arrival order; queries filter by agent and type.
    #[tokio::test]
    async fn memory_storage_query() {
        let store = MemoryEventStorage::new();
        store.store(&ev(types::AGENT_START, "a")).await.unwrap();
        store.store(&ev(types::TOOL_CALL, "a")).await.unwrap();
        store.store(&ev(types::TOOL_CALL, "b")).await.unwrap();

        assert_eq!(store.count(), 3);
        let calls = store.query(&EventQuery::new().event_type(types::TOOL_CALL));
        assert_eq!(calls.len(), 2);
        let by_agent = store.query(&EventQuery::new().agent_id("b"));
        assert_eq!(by_agent.len(), 1);
        assert_eq!(by_agent[0].agent_id, "b");

        store.clear();
        assert_eq!(store.count(), 0);
    }

    /// **Scenario**: Time-range queries are inclusive on both ends.
    #[tokio::test]
    async fn memory_storage_time_range() {
        let store = MemoryEventStorage::new();
        let event = ev(types::AGENT_START, "a");
        let at = event.timestamp;
        store.store(&event).await.unwrap();

        assert_eq!(store.query(&EventQuery::new().from(at).to(at)).len(), 1);
        let later = at + chrono::Duration::seconds(5);
        assert!(store.query(&EventQuery::new().from(later)).is_empty());
    }

    /// **Scenario**: File storage appends JSON lines that read back field-for-field.
    #[tokio::test]
    async fn file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        let store = FileEventStorage::open(&path).unwrap();
        let first = ev(types::TOOL_CALL, "a");
        let second = Event::new(types::AGENT_ERROR, Value::Null).with_error("boom");
        store.store(&first).await.unwrap();
        store.store(&second).await.unwrap();
        drop(store);

        let back = FileEventStorage::read_all(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].id, first.id);
        assert_eq!(back[0].data, first.data);
        assert_eq!(back[1].error.as_deref(), Some("boom"));

        // Reopening appends rather than truncating.
        let store = FileEventStorage::open(&path).unwrap();
        store.store(&ev(types::TOOL_RESULT, "a")).await.unwrap();
        drop(store);
        assert_eq!(FileEventStorage::read_all(&path).unwrap().len(), 3);
    }
}
