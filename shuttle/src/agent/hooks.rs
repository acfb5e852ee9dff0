//! Lifecycle hooks around the LLM agent loop.
//!
//! Hooks run in registration order at each point. A hook returning an
//! error aborts the run — except `on_error`, which is best-effort
//! notification and cannot fail the run further.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AgentError;
use crate::message::Message;
use crate::provider::ProviderResponse;
use crate::run_context::RunContext;
use crate::state::State;
use crate::tool::ToolError;

/// Observer/interceptor for the agent loop's lifecycle points.
///
/// Every method has a no-op default; implement only what you need. Each
/// model call invokes one `before_generate` and one `after_generate`, so a
/// run whose first reply triggers tools sees exactly two of each.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Before the run starts (after `agent.start` is emitted).
    async fn before_run(&self, _ctx: &RunContext, _state: &State) -> Result<(), AgentError> {
        Ok(())
    }

    /// After the run finished successfully, with the outgoing state.
    async fn after_run(&self, _ctx: &RunContext, _state: &State) -> Result<(), AgentError> {
        Ok(())
    }

    /// Before each model call, with the messages about to be sent.
    async fn before_generate(
        &self,
        _ctx: &RunContext,
        _messages: &[Message],
    ) -> Result<(), AgentError> {
        Ok(())
    }

    /// After each model call, with the response.
    async fn after_generate(
        &self,
        _ctx: &RunContext,
        _response: &ProviderResponse,
    ) -> Result<(), AgentError> {
        Ok(())
    }

    /// Before each tool call, with the tool name and its input.
    async fn before_tool_call(
        &self,
        _ctx: &RunContext,
        _name: &str,
        _input: &Value,
    ) -> Result<(), AgentError> {
        Ok(())
    }

    /// After each tool call, with the result or error.
    async fn after_tool_call(
        &self,
        _ctx: &RunContext,
        _name: &str,
        _result: &Result<Value, ToolError>,
    ) -> Result<(), AgentError> {
        Ok(())
    }

    /// When the run fails. Best-effort: runs for every hook regardless of
    /// what the others do.
    async fn on_error(&self, _ctx: &RunContext, _error: &AgentError) {}
}
