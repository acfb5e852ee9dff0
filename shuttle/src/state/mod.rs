//! State: the mutable bag of values, messages, artifacts, and metadata
//! that flows through an agent run.
//!
//! One [`State`] is created per run, threaded through every step, and
//! usually discarded at the end. It is deliberately weakly typed: agents
//! and tools negotiate keys by convention (`"prompt"` in, `"result"` out),
//! and guardrails police that boundary. `Clone` is a deep copy — all data
//! is owned — so the parallel workflow combinator can hand each child an
//! independent copy and merge afterwards.
//!
//! # Example
//!
//! ```
//! use shuttle::state::State;
//! use shuttle::message::Message;
//!
//! let mut state = State::new();
//! state.set("prompt", "What is 2+2?".into());
//! state.add_message(Message::user("What is 2+2?"));
//! let snapshot = state.clone();
//! state.set("result", "4".into());
//! assert!(snapshot.get("result").is_none());
//! ```

mod artifact;

pub use artifact::{Artifact, ArtifactKind};

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::Message;

/// The conversational context threaded through every step of a run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct State {
    values: HashMap<String, Value>,
    artifacts: HashMap<String, Artifact>,
    messages: Vec<Message>,
    metadata: HashMap<String, Value>,
}

impl State {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value under `key`, when present.
    ///
    /// Callers use the `Option` idiom rather than a not-found error.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Removes `key`; removing an absent key is a no-op.
    pub fn delete(&mut self, key: &str) {
        self.values.remove(key);
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// All value keys, in unspecified order.
    pub fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    /// Snapshot copy of the value map.
    pub fn values(&self) -> HashMap<String, Value> {
        self.values.clone()
    }

    /// Appends a message; insertion order is the conversation order.
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Ordered snapshot of the conversation.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Replaces the whole message list. The agent loop uses this to write
    /// back the conversation it assembled during a run.
    pub fn set_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Stores an artifact, assigning a fresh id when the artifact carries
    /// none. Returns the id under which it is addressable; the id never
    /// changes afterwards.
    pub fn add_artifact(&mut self, mut artifact: Artifact) -> String {
        if artifact.id.is_empty() {
            artifact.id = uuid::Uuid::new_v4().to_string();
        }
        let id = artifact.id.clone();
        self.artifacts.insert(id.clone(), artifact);
        id
    }

    pub fn artifact(&self, id: &str) -> Option<&Artifact> {
        self.artifacts.get(id)
    }

    /// Snapshot copy of the artifact map.
    pub fn artifacts(&self) -> HashMap<String, Artifact> {
        self.artifacts.clone()
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }

    pub fn get_metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Snapshot copy of the metadata map.
    pub fn metadata(&self) -> HashMap<String, Value> {
        self.metadata.clone()
    }

    /// Convenience: the string under `key`, when present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Freezes a read-only snapshot for handing to tools.
    pub fn reader(&self) -> StateReader {
        StateReader {
            inner: Arc::new(self.clone()),
        }
    }
}

/// Read-only view of a [`State`] snapshot.
///
/// Handed to tools via their invocation context so tool code can inspect
/// the run without mutating it. Cheap to clone; all clones share one
/// frozen snapshot.
#[derive(Clone, Debug)]
pub struct StateReader {
    inner: Arc<State>,
}

impl StateReader {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.inner.has(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }

    pub fn messages(&self) -> &[Message] {
        self.inner.messages()
    }

    pub fn artifact(&self, id: &str) -> Option<&Artifact> {
        self.inner.artifact(id)
    }

    pub fn get_metadata(&self, key: &str) -> Option<&Value> {
        self.inner.get_metadata(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// **Scenario**: Set/get/has/delete behave as a plain map; delete of absent key is a no-op.
    #[test]
    fn value_bag_operations() {
        let mut state = State::new();
        assert!(!state.has("k"));
        state.set("k", json!(1));
        assert_eq!(state.get("k"), Some(&json!(1)));
        state.set("k", json!(2));
        assert_eq!(state.get("k"), Some(&json!(2)));
        state.delete("k");
        state.delete("k");
        assert!(state.get("k").is_none());
    }

    /// **Scenario**: Clone is deep — mutating either side leaves the other unchanged.
    #[test]
    fn clone_independence() {
        let mut state = State::new();
        state.set("a", json!("original"));
        state.add_message(Message::user("hi"));
        let id = state.add_artifact(Artifact::data("blob", b"abc".to_vec()));

        let mut cloned = state.clone();
        cloned.set("a", json!("changed"));
        cloned.add_message(Message::assistant("hello"));
        cloned.delete("a");
        cloned.set_metadata("trace", json!("t-1"));

        assert_eq!(state.get("a"), Some(&json!("original")));
        assert_eq!(state.messages().len(), 1);
        assert!(state.get_metadata("trace").is_none());
        assert!(state.artifact(&id).is_some());

        state.set("b", json!(true));
        assert!(!cloned.has("b"));
    }

    /// **Scenario**: add_artifact assigns a unique id when missing and keeps a provided one.
    #[test]
    fn artifact_id_assignment() {
        let mut state = State::new();
        let id1 = state.add_artifact(Artifact::data("one", vec![1]));
        let id2 = state.add_artifact(Artifact::data("two", vec![2]));
        assert_ne!(id1, id2);
        assert_eq!(state.artifact(&id1).unwrap().name, "one");

        let mut fixed = Artifact::data("fixed", vec![3]);
        fixed.id = "art-7".into();
        let id3 = state.add_artifact(fixed);
        assert_eq!(id3, "art-7");
    }

    /// **Scenario**: values() and artifacts() are snapshots, not live views.
    #[test]
    fn snapshots_are_copies() {
        let mut state = State::new();
        state.set("x", json!(1));
        let snap = state.values();
        state.set("x", json!(2));
        assert_eq!(snap["x"], json!(1));
    }

    /// **Scenario**: A StateReader sees the snapshot at freeze time only.
    #[test]
    fn reader_is_frozen() {
        let mut state = State::new();
        state.set("k", json!("before"));
        let reader = state.reader();
        state.set("k", json!("after"));
        assert_eq!(reader.get("k"), Some(&json!("before")));
        assert!(reader.keys().contains(&"k".to_string()));
    }
}
