//! # Shuttle
//!
//! An LLM-agent runtime core with a **state-in, state-out** design: one
//! [`State`] — values, messages, artifacts, metadata — flows through
//! agents, tools, and workflows, and every transition is published to an
//! asynchronous event bus.
//!
//! ## Design principles
//!
//! - **Single state bag**: agents and tools negotiate weakly typed keys
//!   (`"prompt"` in, `"result"` out); guardrails police the boundary.
//! - **One run per call**: an [`Agent`] receives a state and returns the
//!   updated state. Workflows are agents, so composition nests freely.
//! - **Non-blocking observability**: the [`EventBus`] buffers per
//!   subscription and drops for slow observers rather than stalling a run.
//! - **Providers behind a trait**: the [`Provider`] interface covers
//!   plain, structured, and streaming generation; wire protocols live in
//!   provider crates, not here.
//!
//! ## Main modules
//!
//! - [`state`]: [`State`], [`StateReader`], [`Artifact`] — the run context.
//! - [`message`]: [`Message`], [`ContentPart`], [`ToolCall`], [`ToolResult`].
//! - [`schema`]: [`Schema`] shapes plus validation.
//! - [`agent`]: the [`Agent`] trait, the [`LlmAgent`] loop, hooks, and the
//!   agent hierarchy.
//! - [`tool`]: [`Tool`], [`ToolRegistry`], [`ToolDispatcher`], [`ToolContext`].
//! - [`guardrail`]: pre/post validators and [`GuardedAgent`].
//! - [`workflow`]: [`SequentialWorkflow`], [`ParallelWorkflow`], [`LoopWorkflow`].
//! - [`provider`]: the [`Provider`] trait, options, token streams,
//!   retries, the mock, and the dynamic [`ProviderRegistry`].
//! - [`structured`]: schema-guided prompts and JSON extraction.
//! - [`event`]: [`Event`], [`EventBus`], filters, storage, record/replay.
//!
//! Provider spec strings (`"provider/model[:useCase]"`) parse via the
//! `provider-spec-core` crate, re-exported as [`provider_spec`]; event wire
//! shapes live in `event-wire`.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use shuttle::agent::{Agent, LlmAgent};
//! use shuttle::provider::MockProvider;
//! use shuttle::run_context::RunContext;
//! use shuttle::state::State;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let provider = Arc::new(MockProvider::new().reply_text("four"));
//! let agent = LlmAgent::builder("answerer")
//!     .provider(provider)
//!     .build()
//!     .unwrap();
//!
//! let mut state = State::new();
//! state.set("prompt", json!("What is 2+2?"));
//! let out = agent.run(&RunContext::new(), state).await.unwrap();
//! assert_eq!(out.get_str("result"), Some("four"));
//! # }
//! ```

pub mod agent;
pub mod error;
pub mod event;
pub mod guardrail;
pub mod message;
pub mod provider;
pub mod run_context;
pub mod schema;
pub mod state;
pub mod structured;
pub mod tool;
pub mod workflow;

/// Provider spec-string parsing (`"provider/model[:useCase]"`).
pub use provider_spec_core as provider_spec;

pub use agent::{Agent, AgentHandle, AgentType, FnAgent, Hook, LlmAgent};
pub use error::AgentError;
pub use event::{
    default_bus, Event, EventBus, EventFilter, EventHandler, EventRecorder, EventReplayer,
    FileEventStorage, MemoryEventStorage,
};
pub use guardrail::{Guardrail, GuardrailChain, GuardrailError, GuardrailKind, GuardedAgent};
pub use message::{ContentPart, Message, Role, ToolCall, ToolResult};
pub use provider::{
    MockProvider, Provider, ProviderError, ProviderOptions, ProviderRegistry, ProviderResponse,
    RetryPolicy, Token, TokenStream, Usage,
};
pub use run_context::{AgentInfo, RunContext};
pub use schema::{Schema, SchemaType, ValidationError};
pub use state::{Artifact, ArtifactKind, State, StateReader};
pub use structured::{enhance_prompt, extract_json};
pub use tool::{FnTool, Tool, ToolContext, ToolDescriptor, ToolDispatcher, ToolError, ToolRegistry};
pub use workflow::{
    LoopWorkflow, MergeStrategy, ParallelWorkflow, SequentialWorkflow, WorkflowStep,
};
