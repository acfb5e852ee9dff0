//! Closure adapter: build an [`Agent`] from an async function.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use super::Agent;
use crate::error::AgentError;
use crate::run_context::RunContext;
use crate::state::State;

type RunFn = Arc<
    dyn Fn(RunContext, State) -> Pin<Box<dyn Future<Output = Result<State, AgentError>> + Send>>
        + Send
        + Sync,
>;

/// An agent backed by a closure. Handy for workflow steps and tests.
#[derive(Clone)]
pub struct FnAgent {
    id: String,
    name: String,
    run: RunFn,
}

impl FnAgent {
    pub fn new<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(RunContext, State) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<State, AgentError>> + Send + 'static,
    {
        let name = name.into();
        Self {
            id: format!("{name}-{}", uuid::Uuid::new_v4()),
            name,
            run: Arc::new(move |ctx, state| Box::pin(f(ctx, state))),
        }
    }
}

#[async_trait]
impl Agent for FnAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &RunContext, state: State) -> Result<State, AgentError> {
        (self.run)(ctx.clone(), state).await
    }
}

impl std::fmt::Debug for FnAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnAgent").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// **Scenario**: An FnAgent runs its closure against the state.
    #[tokio::test]
    async fn fn_agent_runs() {
        let agent = FnAgent::new("marker", |_ctx, mut state: State| async move {
            state.set("visited", json!(true));
            Ok(state)
        });
        assert_eq!(agent.name(), "marker");
        let out = agent.run(&RunContext::new(), State::new()).await.unwrap();
        assert_eq!(out.get("visited"), Some(&json!(true)));
    }
}
