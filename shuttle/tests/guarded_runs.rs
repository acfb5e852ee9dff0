//! Guardrails and hierarchy wrapped around real agent runs.

use std::sync::Arc;

use serde_json::json;

use shuttle::agent::{Agent, AgentHandle, FnAgent, LlmAgent};
use shuttle::error::AgentError;
use shuttle::guardrail::{
    Blocklist, GuardedAgent, GuardrailChain, MaxStateSize, RequiredKeys,
};
use shuttle::provider::MockProvider;
use shuttle::run_context::RunContext;
use shuttle::state::State;

/// **Scenario**: An LLM agent behind input/output guardrails runs only when
/// both chains pass.
#[tokio::test]
async fn llm_agent_behind_guardrails() {
    let agent: Arc<dyn Agent> = Arc::new(
        LlmAgent::builder("writer")
            .provider(Arc::new(MockProvider::new().with_fallback("a clean answer")))
            .build()
            .unwrap(),
    );
    let guarded = GuardedAgent::new(
        Arc::clone(&agent),
        GuardrailChain::new().with(Arc::new(RequiredKeys::new(["prompt"]))),
        GuardrailChain::new()
            .with(Arc::new(Blocklist::new(["swearword"])))
            .with(Arc::new(MaxStateSize::new(1 << 20))),
    );

    // Missing prompt: rejected before the provider is touched.
    let err = guarded.run(&RunContext::new(), State::new()).await.unwrap_err();
    assert!(matches!(err, AgentError::Guardrail(_)));

    let mut state = State::new();
    state.set("prompt", json!("write something"));
    let out = guarded.run(&RunContext::new(), state).await.unwrap();
    assert_eq!(out.get_str("result"), Some("a clean answer"));
}

/// **Scenario**: A parent orchestrates an explicitly discovered sub-agent;
/// the hierarchy stays navigable both ways.
#[tokio::test]
async fn parent_runs_discovered_child() {
    let parent = AgentHandle::new(Arc::new(FnAgent::new("coordinator", |_ctx, state| async {
        Ok(state)
    })));
    let child = AgentHandle::new(Arc::new(FnAgent::new(
        "greeter",
        |_ctx, mut state: State| async move {
            state.set("greeting", json!("hello from child"));
            Ok(state)
        },
    )));
    parent.add_sub_agent(&child).unwrap();

    let found = parent.find_agent("greeter").expect("child discoverable");
    assert_eq!(found.parent().unwrap().name(), "coordinator");

    let out = found
        .agent()
        .run(&RunContext::new(), State::new())
        .await
        .unwrap();
    assert_eq!(out.get_str("greeting"), Some("hello from child"));
}
