//! Agent wrapper applying guardrail chains around `run`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{GuardrailChain, GuardrailKind};
use crate::agent::{Agent, AgentType};
use crate::error::AgentError;
use crate::event::types;
use crate::run_context::RunContext;
use crate::state::State;

/// Wraps an agent with input and output guardrail chains.
///
/// The input chain runs against the incoming state before the inner
/// agent's `run`; the output chain runs against the produced state after.
/// A failure short-circuits with [`AgentError::Guardrail`] and emits a
/// `guardrail.error` event.
pub struct GuardedAgent {
    inner: Arc<dyn Agent>,
    input: GuardrailChain,
    output: GuardrailChain,
}

impl GuardedAgent {
    pub fn new(inner: Arc<dyn Agent>, input: GuardrailChain, output: GuardrailChain) -> Self {
        Self {
            inner,
            input,
            output,
        }
    }

    /// Wraps with the same chain on both sides.
    pub fn symmetric(inner: Arc<dyn Agent>, chain: GuardrailChain) -> Self {
        Self {
            inner,
            input: chain.clone(),
            output: chain,
        }
    }
}

#[async_trait]
impl Agent for GuardedAgent {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn agent_type(&self) -> AgentType {
        self.inner.agent_type()
    }

    async fn run(&self, ctx: &RunContext, state: State) -> Result<State, AgentError> {
        let guard_ctx = ctx.for_agent(self.inner.info());
        if let Err(err) = self.input.run(&guard_ctx, &state, GuardrailKind::Input).await {
            guard_ctx.emit_error(types::GUARDRAIL_ERROR, Value::Null, err.to_string());
            return Err(err.into());
        }
        let state = self.inner.run(ctx, state).await?;
        if let Err(err) = self.output.run(&guard_ctx, &state, GuardrailKind::Output).await {
            guard_ctx.emit_error(types::GUARDRAIL_ERROR, Value::Null, err.to_string());
            return Err(err.into());
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::FnAgent;
    use crate::guardrail::builtin::{Blocklist, RequiredKeys};
    use crate::message::Message;
    use serde_json::json;

    fn echo_agent() -> Arc<dyn Agent> {
        Arc::new(FnAgent::new("inner", |_ctx, mut state: State| async move {
            state.set("ran", json!(true));
            state.add_message(Message::assistant("totally forbidden words"));
            Ok(state)
        }))
    }

    /// **Scenario**: Input guardrail failure prevents the inner agent from running.
    #[tokio::test]
    async fn input_failure_short_circuits() {
        let guarded = GuardedAgent::new(
            echo_agent(),
            GuardrailChain::new().with(Arc::new(RequiredKeys::new(["prompt"]))),
            GuardrailChain::new(),
        );
        let err = guarded.run(&RunContext::new(), State::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::Guardrail(_)));
    }

    /// **Scenario**: Output guardrail inspects the state the inner agent produced.
    #[tokio::test]
    async fn output_failure_after_run() {
        let guarded = GuardedAgent::new(
            echo_agent(),
            GuardrailChain::new(),
            GuardrailChain::new().with(Arc::new(Blocklist::new(["forbidden"]))),
        );
        let err = guarded.run(&RunContext::new(), State::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::Guardrail(_)));
    }

    /// **Scenario**: With passing chains the wrapper is transparent.
    #[tokio::test]
    async fn transparent_when_passing() {
        let mut state = State::new();
        state.set("prompt", json!("hello"));
        let guarded = GuardedAgent::new(
            echo_agent(),
            GuardrailChain::new().with(Arc::new(RequiredKeys::new(["prompt"]))),
            GuardrailChain::new(),
        );
        let out = guarded.run(&RunContext::new(), state).await.unwrap();
        assert_eq!(out.get("ran"), Some(&json!(true)));
        assert_eq!(guarded.name(), "inner");
    }
}
