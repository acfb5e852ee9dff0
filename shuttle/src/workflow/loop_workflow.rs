//! Loop composition: repeat a body while a condition holds.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;

use super::WorkflowStep;
use crate::agent::{Agent, AgentType};
use crate::error::AgentError;
use crate::event::types;
use crate::run_context::RunContext;
use crate::state::State;

/// State keys the loop writes its introspection under.
pub mod keys {
    pub const ITERATIONS: &str = "iterations";
    pub const DURATION_MS: &str = "loop_duration_ms";
    pub const ITERATION_RESULTS: &str = "iteration_results";
}

type ConditionFn = Arc<dyn Fn(&State, u32) -> bool + Send + Sync>;

/// Repeats a body step until its condition stops it.
///
/// The condition is checked before each iteration with the current state
/// and the 0-based iteration index; returning `false` stops the loop.
/// Without a condition, the loop runs exactly `max_iterations` times —
/// that is [`LoopWorkflow::count`]. Introspection (iteration count, total
/// duration, collected results) is written into the final state under
/// [`keys`].
pub struct LoopWorkflow {
    id: String,
    name: String,
    body: WorkflowStep,
    condition: Option<ConditionFn>,
    max_iterations: u32,
    delay: Option<Duration>,
    collect_results: bool,
    pass_state_through: bool,
    break_on_error: bool,
}

impl LoopWorkflow {
    pub fn new(name: impl Into<String>, body: WorkflowStep) -> Self {
        let name = name.into();
        Self {
            id: format!("{name}-{}", uuid::Uuid::new_v4()),
            name,
            body,
            condition: None,
            max_iterations: 10,
            delay: None,
            collect_results: false,
            pass_state_through: true,
            break_on_error: true,
        }
    }

    /// A loop running the body exactly `n` times (fewer on cancellation).
    pub fn count(name: impl Into<String>, body: WorkflowStep, n: u32) -> Self {
        Self::new(name, body).with_max_iterations(n)
    }

    /// A loop running while `predicate(state, iteration)` holds, capped by
    /// `max_iterations`.
    pub fn while_loop<F>(name: impl Into<String>, body: WorkflowStep, predicate: F) -> Self
    where
        F: Fn(&State, u32) -> bool + Send + Sync + 'static,
    {
        Self::new(name, body).with_condition(predicate)
    }

    pub fn with_condition<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&State, u32) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(predicate));
        self
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Sleeps between iterations (not before the first).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Collects each iteration's `"result"` value into the final state.
    pub fn collect_results(mut self) -> Self {
        self.collect_results = true;
        self
    }

    /// When false, every iteration runs against a clone of the input state
    /// instead of the previous iteration's output.
    pub fn pass_state_through(mut self, pass: bool) -> Self {
        self.pass_state_through = pass;
        self
    }

    /// When false, a body failure is recorded and the loop continues.
    pub fn break_on_error(mut self, break_on_error: bool) -> Self {
        self.break_on_error = break_on_error;
        self
    }
}

#[async_trait]
impl Agent for LoopWorkflow {
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
        ctx.emit(
            types::WORKFLOW_START,
            json!({"max_iterations": self.max_iterations}),
        );

        let started = Instant::now();
        let input = state;
        let mut current = input.clone();
        let mut iterations = 0u32;
        let mut results: Vec<Value> = Vec::new();

        while iterations < self.max_iterations {
            if ctx.is_cancelled() {
                return Err(AgentError::Cancelled);
            }
            if let Some(condition) = &self.condition {
                if !condition(&current, iterations) {
                    break;
                }
            }
            if iterations > 0 {
                if let Some(delay) = self.delay {
                    tokio::select! {
                        _ = ctx.cancellation().cancelled() => return Err(AgentError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }

            ctx.emit(types::WORKFLOW_STEP, json!({"iteration": iterations}));
            let iteration_input = if self.pass_state_through {
                current.clone()
            } else {
                input.clone()
            };
            match self.body.run(&ctx, iteration_input).await {
                Ok(next) => {
                    if self.collect_results {
                        results.push(next.get("result").cloned().unwrap_or(Value::Null));
                    }
                    if self.pass_state_through {
                        current = next;
                    }
                }
                Err(err) if !self.break_on_error => {
                    warn!(iteration = iterations, error = %err, "loop body failed, continuing");
                    if self.collect_results {
                        results.push(json!({"error": err.to_string()}));
                    }
                }
                Err(err) => {
                    ctx.emit_error(
                        types::AGENT_ERROR,
                        json!({"iteration": iterations}),
                        err.to_string(),
                    );
                    return Err(err);
                }
            }
            iterations += 1;
        }

        let duration = started.elapsed();
        current.set(keys::ITERATIONS, json!(iterations));
        current.set(keys::DURATION_MS, json!(duration.as_millis() as u64));
        if self.collect_results {
            current.set(keys::ITERATION_RESULTS, json!(results));
        }
        ctx.emit(types::WORKFLOW_COMPLETE, json!({"iterations": iterations}));
        Ok(current)
    }
}
