//! The model-driven agent loop: prompt → model → tools → observe → repeat.
//!
//! One `run` walks Start → Prepare → ModelCall → ParseReply →
//! (ToolDispatch → Observe → ModelCall)* → Finalize. Tool calls within one
//! reply dispatch concurrently and their results re-enter the conversation
//! ordered by the index the model emitted them at. Tool failures become
//! error tool-results the model can react to; provider failures retry when
//! transient and otherwise end the run.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use super::hooks::Hook;
use super::{Agent, AgentType};
use crate::error::AgentError;
use crate::event::types;
use crate::guardrail::{Guardrail, GuardrailChain, GuardrailKind};
use crate::message::{Message, Role, ToolCall, ToolResult};
use crate::provider::{retry_provider_call, Provider, ProviderOptions, RetryPolicy, Usage};
use crate::run_context::RunContext;
use crate::state::State;
use crate::tool::{Tool, ToolContext, ToolDispatcher, ToolError, ToolRegistry};

/// Default cap on model calls per run.
pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

/// Errors from assembling an [`LlmAgent`].
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("agent needs a provider")]
    MissingProvider,
    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Builder for [`LlmAgent`].
pub struct LlmAgentBuilder {
    name: String,
    description: String,
    provider: Option<Arc<dyn Provider>>,
    options: ProviderOptions,
    tools: Vec<Arc<dyn Tool>>,
    hooks: Vec<Arc<dyn Hook>>,
    input_guardrails: GuardrailChain,
    output_guardrails: GuardrailChain,
    system_prompt: Option<String>,
    max_iterations: u32,
    retry: RetryPolicy,
}

impl LlmAgentBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            provider: None,
            options: ProviderOptions::new(),
            tools: Vec::new(),
            hooks: Vec::new(),
            input_guardrails: GuardrailChain::new(),
            output_guardrails: GuardrailChain::new(),
            system_prompt: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            retry: RetryPolicy::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn options(mut self, options: ProviderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn hook(mut self, hook: Arc<dyn Hook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn input_guardrail(mut self, guardrail: Arc<dyn Guardrail>) -> Self {
        self.input_guardrails = self.input_guardrails.with(guardrail);
        self
    }

    pub fn output_guardrail(mut self, guardrail: Arc<dyn Guardrail>) -> Self {
        self.output_guardrails = self.output_guardrails.with(guardrail);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn build(self) -> Result<LlmAgent, BuildError> {
        let provider = self.provider.ok_or(BuildError::MissingProvider)?;
        let registry = Arc::new(ToolRegistry::new());
        for tool in self.tools {
            registry.register(tool)?;
        }
        Ok(LlmAgent {
            id: format!("{}-{}", self.name, uuid::Uuid::new_v4()),
            name: self.name,
            description: self.description,
            provider,
            options: self.options,
            dispatcher: ToolDispatcher::new(Arc::clone(&registry)),
            registry,
            hooks: self.hooks,
            input_guardrails: self.input_guardrails,
            output_guardrails: self.output_guardrails,
            system_prompt: self.system_prompt,
            max_iterations: self.max_iterations,
            retry: self.retry,
        })
    }
}

/// An agent driven by a language model with optional tools.
pub struct LlmAgent {
    id: String,
    name: String,
    description: String,
    provider: Arc<dyn Provider>,
    options: ProviderOptions,
    registry: Arc<ToolRegistry>,
    dispatcher: ToolDispatcher,
    hooks: Vec<Arc<dyn Hook>>,
    input_guardrails: GuardrailChain,
    output_guardrails: GuardrailChain,
    system_prompt: Option<String>,
    max_iterations: u32,
    retry: RetryPolicy,
}

impl LlmAgent {
    pub fn builder(name: impl Into<String>) -> LlmAgentBuilder {
        LlmAgentBuilder::new(name)
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Assembles the message list for the first model call: state messages,
    /// then the `"prompt"` value as a user message unless already present,
    /// with the agent's system prompt first unless one exists.
    fn prepare_messages(&self, state: &State) -> Vec<Message> {
        let mut messages: Vec<Message> = state.messages().to_vec();
        if let Some(prompt) = state.get_str("prompt") {
            let present = messages
                .iter()
                .any(|m| m.role == Role::User && m.content_text() == prompt);
            if !present {
                messages.push(Message::user(prompt));
            }
        }
        if let Some(system) = &self.system_prompt {
            if !messages.iter().any(|m| m.role == Role::System) {
                messages.insert(0, Message::system(system.clone()));
            }
        }
        messages
    }

    async fn run_inner(&self, ctx: &RunContext, mut state: State) -> Result<State, AgentError> {
        for hook in &self.hooks {
            hook.before_run(ctx, &state).await?;
        }
        self.input_guardrails
            .run(ctx, &state, GuardrailKind::Input)
            .await?;

        let mut messages = self.prepare_messages(&state);
        let call_options = self.options.clone().with_tools(self.registry.list());
        let mut total_usage = Usage::default();
        let mut iterations = 0u32;
        let final_text;

        loop {
            if ctx.is_cancelled() {
                return Err(AgentError::Cancelled);
            }
            if iterations >= self.max_iterations {
                warn!(agent = %self.name, limit = self.max_iterations, "iteration budget exceeded");
                return Err(AgentError::BudgetExceeded {
                    limit: self.max_iterations,
                });
            }
            iterations += 1;

            for hook in &self.hooks {
                hook.before_generate(ctx, &messages).await?;
            }
            ctx.emit(
                types::GENERATE_BEFORE,
                json!({"iteration": iterations, "message_count": messages.len()}),
            );

            let response = retry_provider_call(ctx, &self.retry, |_attempt| {
                let provider = Arc::clone(&self.provider);
                let messages = messages.clone();
                let options = call_options.clone();
                let ctx = ctx.clone();
                async move { provider.generate_message(&ctx, &messages, &options).await }
            })
            .await
            .map_err(AgentError::from_provider)?;

            if let Some(usage) = response.usage {
                total_usage.prompt_tokens += usage.prompt_tokens;
                total_usage.completion_tokens += usage.completion_tokens;
                total_usage.total_tokens += usage.total_tokens;
            }
            ctx.emit(
                types::GENERATE_AFTER,
                json!({
                    "iteration": iterations,
                    "usage": response.usage.and_then(|u| serde_json::to_value(u).ok()),
                }),
            );
            for hook in &self.hooks {
                hook.after_generate(ctx, &response).await?;
            }

            let assistant = response.message;
            let tool_calls: Vec<ToolCall> =
                assistant.tool_calls().into_iter().cloned().collect();
            let text = assistant.content_text();
            messages.push(assistant);

            if tool_calls.is_empty() {
                final_text = text;
                break;
            }
            debug!(agent = %self.name, count = tool_calls.len(), "dispatching tool calls");

            for call in &tool_calls {
                for hook in &self.hooks {
                    hook.before_tool_call(ctx, &call.name, &call.arguments).await?;
                }
            }

            // Tools see the conversation as assembled so far.
            let mut snapshot = state.clone();
            snapshot.set_messages(messages.clone());
            let tool_ctx = ToolContext::from_run(ctx, &snapshot);

            let dispatches = tool_calls.iter().map(|call| {
                let dispatcher = self.dispatcher.clone();
                let tool_ctx = tool_ctx.clone();
                let call = call.clone();
                async move {
                    let result = dispatcher
                        .execute(&tool_ctx, &call.name, call.arguments.clone())
                        .await;
                    (call, result)
                }
            });
            let mut outcomes = futures::future::join_all(dispatches).await;
            // Observe in the order the model emitted the calls, not finish order.
            outcomes.sort_by_key(|(call, _)| call.index);

            for (call, result) in &outcomes {
                for hook in &self.hooks {
                    hook.after_tool_call(ctx, &call.name, result).await?;
                }
            }
            for (call, result) in outcomes {
                let message = match result {
                    Ok(output) => Message::tool_result(ToolResult {
                        call_id: call.id,
                        name: call.name,
                        content: output,
                        is_error: false,
                    }),
                    Err(ToolError::Cancelled) => return Err(AgentError::Cancelled),
                    Err(err) => {
                        let mut content = json!({"error": err.to_string()});
                        if let ToolError::Validation { hint: Some(hint), .. } = &err {
                            content["hint"] = json!(hint);
                        }
                        Message::tool_result(ToolResult {
                            call_id: call.id,
                            name: call.name,
                            content,
                            is_error: true,
                        })
                    }
                };
                messages.push(message);
            }
        }

        state.set_messages(messages);
        state.set("result", json!(final_text));
        if total_usage.total_tokens > 0 {
            if let Ok(usage) = serde_json::to_value(total_usage) {
                state.set_metadata("usage", usage);
            }
        }
        self.output_guardrails
            .run(ctx, &state, GuardrailKind::Output)
            .await?;
        ctx.emit(
            types::AGENT_COMPLETE,
            json!({"iterations": iterations, "result": final_text}),
        );
        for hook in &self.hooks {
            hook.after_run(ctx, &state).await?;
        }
        Ok(state)
    }
}

#[async_trait]
impl Agent for LlmAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn agent_type(&self) -> AgentType {
        AgentType::Llm
    }

    async fn run(&self, ctx: &RunContext, state: State) -> Result<State, AgentError> {
        let ctx = ctx.for_agent(self.info());
        ctx.emit(
            types::AGENT_START,
            json!({"message_count": state.messages().len()}),
        );
        match self.run_inner(&ctx, state).await {
            Ok(state) => Ok(state),
            Err(err) => {
                for hook in &self.hooks {
                    hook.on_error(&ctx, &err).await;
                }
                ctx.emit_error(types::AGENT_ERROR, Value::Null, err.to_string());
                Err(err)
            }
        }
    }
}
