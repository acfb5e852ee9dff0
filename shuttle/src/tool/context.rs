//! Per-invocation context handed to every tool.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::event::{EventEmitter, NoopEmitter};
use crate::run_context::{AgentInfo, RunContext};
use crate::state::{State, StateReader};

/// What a tool gets to see and use during one call.
///
/// The state is a frozen read-only snapshot; tools that want to affect the
/// run return data and let the agent loop write it back. `retry` counts
/// prior attempts of this same call (0 on the first).
#[derive(Clone)]
pub struct ToolContext {
    pub cancellation: CancellationToken,
    pub state: StateReader,
    pub run_id: String,
    pub retry: u32,
    pub started: Instant,
    pub emitter: Arc<dyn EventEmitter>,
    pub agent: AgentInfo,
}

impl ToolContext {
    /// Builds a tool context from the surrounding run context and a state
    /// snapshot.
    pub fn from_run(ctx: &RunContext, state: &State) -> Self {
        Self {
            cancellation: ctx.cancellation().clone(),
            state: state.reader(),
            run_id: ctx.run_id().to_string(),
            retry: 0,
            started: Instant::now(),
            emitter: ctx.emitter(),
            agent: ctx.agent().cloned().unwrap_or_default(),
        }
    }

    /// A detached context for tests and direct invocation.
    pub fn detached(state: &State) -> Self {
        Self {
            cancellation: CancellationToken::new(),
            state: state.reader(),
            run_id: String::new(),
            retry: 0,
            started: Instant::now(),
            emitter: Arc::new(NoopEmitter),
            agent: AgentInfo::default(),
        }
    }

    /// Marks this context as retry attempt `retry`.
    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Elapsed time since the call started.
    pub fn elapsed(&self) -> std::time::Duration {
        self.started.elapsed()
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("run_id", &self.run_id)
            .field("retry", &self.retry)
            .field("agent", &self.agent)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
