//! Run-scoped context: cancellation, identity, and event emission.
//!
//! A [`RunContext`] is created per run and threaded through every call —
//! provider I/O, tool dispatch, guardrails, workflows. It carries the
//! cancellation token, the run id, the event emitter, and the identity of
//! the agent currently executing, so events emitted anywhere in the stack
//! are attributed correctly.

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::event::{Event, EventEmitter, NoopEmitter};

/// Identity of the agent a context is executing for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AgentInfo {
    pub id: String,
    pub name: String,
}

impl AgentInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Context for one run: cancellation signal, run id, emitter, agent identity.
///
/// Cheap to clone. [`RunContext::for_agent`] derives a child context sharing
/// the same run id, token, and emitter but attributed to a sub-agent — the
/// way workflows hand control to their children.
#[derive(Clone)]
pub struct RunContext {
    run_id: String,
    cancellation: CancellationToken,
    emitter: Arc<dyn EventEmitter>,
    agent: Option<AgentInfo>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    /// A fresh context with a generated run id and a no-op emitter.
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            cancellation: CancellationToken::new(),
            emitter: Arc::new(NoopEmitter),
            agent: None,
        }
    }

    /// Routes emitted events into `emitter` (usually an
    /// [`EventBus`](crate::event::EventBus)).
    pub fn with_emitter(mut self, emitter: Arc<dyn EventEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    /// Uses `token` as the cancellation signal for this run.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn emitter(&self) -> Arc<dyn EventEmitter> {
        Arc::clone(&self.emitter)
    }

    pub fn agent(&self) -> Option<&AgentInfo> {
        self.agent.as_ref()
    }

    /// Derives a child context attributed to `agent`, sharing run id,
    /// cancellation, and emitter.
    pub fn for_agent(&self, agent: AgentInfo) -> Self {
        Self {
            run_id: self.run_id.clone(),
            cancellation: self.cancellation.clone(),
            emitter: Arc::clone(&self.emitter),
            agent: Some(agent),
        }
    }

    /// Emits an event of `event_type`, attributed to the current agent and
    /// annotated with the run id.
    pub fn emit(&self, event_type: &str, data: Value) {
        self.emitter.emit(self.build_event(event_type, data, None));
    }

    /// Emits an error event.
    pub fn emit_error(&self, event_type: &str, data: Value, error: impl Into<String>) {
        self.emitter
            .emit(self.build_event(event_type, data, Some(error.into())));
    }

    fn build_event(&self, event_type: &str, data: Value, error: Option<String>) -> Event {
        let mut event = Event::new(event_type, data)
            .with_metadata("run_id", Value::String(self.run_id.clone()));
        if let Some(agent) = &self.agent {
            event = event.with_agent(agent.id.clone(), agent.name.clone());
        }
        if let Some(error) = error {
            event = event.with_error(error);
        }
        event
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("run_id", &self.run_id)
            .field("cancelled", &self.is_cancelled())
            .field("agent", &self.agent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Capture(Mutex<Vec<Event>>);

    impl EventEmitter for Capture {
        fn emit(&self, event: Event) {
            self.0.lock().unwrap().push(event);
        }
    }

    /// **Scenario**: Emitted events carry run id metadata and the agent's identity.
    #[test]
    fn emit_attributes_agent_and_run() {
        let capture = Arc::new(Capture(Mutex::new(Vec::new())));
        let ctx = RunContext::new()
            .with_emitter(capture.clone())
            .for_agent(AgentInfo::new("a-1", "planner"));
        ctx.emit("agent.start", Value::Null);
        ctx.emit_error("agent.error", Value::Null, "boom");

        let events = capture.0.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].agent_id, "a-1");
        assert_eq!(events[0].agent_name, "planner");
        assert_eq!(
            events[0].metadata["run_id"],
            Value::String(ctx.run_id().to_string())
        );
        assert!(events[1].is_error());
    }

    /// **Scenario**: A child context shares the run id and token, changing only the agent.
    #[test]
    fn child_context_shares_run() {
        let ctx = RunContext::new();
        let child = ctx.for_agent(AgentInfo::new("c-1", "child"));
        assert_eq!(ctx.run_id(), child.run_id());
        ctx.cancellation().cancel();
        assert!(child.is_cancelled());
    }
}
