//! Sequential composition: each step feeds its output state to the next.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;

use super::WorkflowStep;
use crate::agent::{Agent, AgentType};
use crate::error::AgentError;
use crate::event::types;
use crate::run_context::RunContext;
use crate::state::State;

/// Runs steps in declaration order, threading the state through.
///
/// A step failure aborts and propagates unless that step was built with
/// `continue_on_error`, in which case its input state carries forward.
pub struct SequentialWorkflow {
    id: String,
    name: String,
    steps: Vec<WorkflowStep>,
}

impl SequentialWorkflow {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: format!("{name}-{}", uuid::Uuid::new_v4()),
            name,
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: WorkflowStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[async_trait]
impl Agent for SequentialWorkflow {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn agent_type(&self) -> AgentType {
        AgentType::Workflow
    }

    async fn run(&self, ctx: &RunContext, state: State) -> Result<State, AgentError> {
        let ctx = ctx.for_agent(self.info());
        ctx.emit(types::WORKFLOW_START, json!({"steps": self.steps.len()}));

        let mut state = state;
        for (index, step) in self.steps.iter().enumerate() {
            if ctx.is_cancelled() {
                return Err(AgentError::Cancelled);
            }
            ctx.emit(
                types::WORKFLOW_STEP,
                json!({"index": index, "step": step.name()}),
            );
            match step.run(&ctx, state.clone()).await {
                Ok(next) => state = next,
                Err(err) if step.continues_on_error() => {
                    warn!(step = %step.name(), error = %err, "step failed, continuing");
                }
                Err(err) => {
                    ctx.emit_error(
                        types::AGENT_ERROR,
                        json!({"step": step.name()}),
                        err.to_string(),
                    );
                    return Err(err);
                }
            }
        }

        ctx.emit(types::WORKFLOW_COMPLETE, Value::Null);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn append_step(tag: &'static str) -> WorkflowStep {
        WorkflowStep::func(tag, move |mut state: State| {
            let mut seen = state
                .get("order")
                .and_then(|v| v.as_array().cloned())
                .unwrap_or_default();
            seen.push(json!(tag));
            state.set("order", json!(seen));
            Ok(state)
        })
    }

    /// **Scenario**: Steps run in declaration order over the threaded state.
    #[tokio::test]
    async fn declaration_order() {
        let wf = SequentialWorkflow::new("pipeline")
            .step(append_step("a"))
            .step(append_step("b"))
            .step(append_step("c"));
        let out = wf.run(&RunContext::new(), State::new()).await.unwrap();
        assert_eq!(out.get("order"), Some(&json!(["a", "b", "c"])));
    }

    /// **Scenario**: A failing step aborts unless marked continue_on_error.
    #[tokio::test]
    async fn failure_propagation() {
        let failing = WorkflowStep::func("boom", |_state| {
            Err(AgentError::ExecutionFailed("boom".into()))
        });

        let wf = SequentialWorkflow::new("fatal")
            .step(append_step("a"))
            .step(failing.clone())
            .step(append_step("b"));
        assert!(wf.run(&RunContext::new(), State::new()).await.is_err());

        let wf = SequentialWorkflow::new("tolerant")
            .step(append_step("a"))
            .step(failing.continue_on_error())
            .step(append_step("b"));
        let out = wf.run(&RunContext::new(), State::new()).await.unwrap();
        assert_eq!(out.get("order"), Some(&json!(["a", "b"])));
    }
}
