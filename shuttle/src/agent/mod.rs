//! Agents: state in, state out.
//!
//! An [`Agent`] receives a [`State`], does its work — one or more model
//! calls, tool invocations, or plain computation — and returns the updated
//! state. [`LlmAgent`] is the built-in model-driven loop; workflows
//! (crate::workflow) are agents too, so everything composes.
//!
//! # Example
//!
//! ```
//! use async_trait::async_trait;
//! use shuttle::agent::Agent;
//! use shuttle::error::AgentError;
//! use shuttle::message::Message;
//! use shuttle::run_context::RunContext;
//! use shuttle::state::State;
//!
//! struct EchoAgent;
//!
//! #[async_trait]
//! impl Agent for EchoAgent {
//!     fn id(&self) -> &str {
//!         "echo-1"
//!     }
//!
//!     fn name(&self) -> &str {
//!         "echo"
//!     }
//!
//!     async fn run(&self, _ctx: &RunContext, mut state: State) -> Result<State, AgentError> {
//!         if let Some(prompt) = state.get_str("prompt").map(str::to_string) {
//!             state.add_message(Message::assistant(prompt));
//!         }
//!         Ok(state)
//!     }
//! }
//! ```

pub mod fn_agent;
pub mod hierarchy;
pub mod hooks;
pub mod llm_agent;

pub use fn_agent::FnAgent;
pub use hierarchy::{AgentHandle, HierarchyError};
pub use hooks::Hook;
pub use llm_agent::{LlmAgent, LlmAgentBuilder};

use async_trait::async_trait;

use crate::error::AgentError;
use crate::run_context::{AgentInfo, RunContext};
use crate::schema::Schema;
use crate::state::State;

/// What kind of agent an implementation is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AgentType {
    /// Model-driven generate→tool→observe loop.
    Llm,
    /// A workflow combinator node.
    Workflow,
    #[default]
    Custom,
}

/// An entity that transforms a [`State`] via one run.
///
/// Agents are long-lived and reused across runs; `initialize`/`cleanup`
/// bracket their lifetime. `run` must observe the context's cancellation
/// token at its I/O boundaries.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Stable unique id.
    fn id(&self) -> &str;

    /// User-visible name; unique among siblings in a hierarchy.
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn agent_type(&self) -> AgentType {
        AgentType::Custom
    }

    /// One run: state in, state out.
    async fn run(&self, ctx: &RunContext, state: State) -> Result<State, AgentError>;

    /// Shape the agent expects in the incoming state, when declared.
    fn input_schema(&self) -> Option<Schema> {
        None
    }

    /// Shape the agent promises in the outgoing state, when declared.
    fn output_schema(&self) -> Option<Schema> {
        None
    }

    async fn initialize(&self) -> Result<(), AgentError> {
        Ok(())
    }

    async fn cleanup(&self) -> Result<(), AgentError> {
        Ok(())
    }

    /// Identity used to attribute events.
    fn info(&self) -> AgentInfo {
        AgentInfo::new(self.id(), self.name())
    }
}
