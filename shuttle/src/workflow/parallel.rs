//! Parallel composition: children race over clones of the input state.

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::warn;

use super::WorkflowStep;
use crate::agent::{Agent, AgentType};
use crate::error::AgentError;
use crate::event::types;
use crate::run_context::RunContext;
use crate::state::State;

/// How a parallel workflow combines its children's outcomes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergeStrategy {
    /// All children must succeed; their states merge by key union,
    /// last writer (in declaration order) winning conflicts.
    #[default]
    Merge,
    /// The first child to succeed wins; losers are cancelled.
    FirstSuccess,
    /// The first child to finish wins, success or failure.
    Race,
}

/// Runs every step concurrently against `state.clone()` copies.
///
/// Each child runs in its own task under a child cancellation token.
/// With [`MergeStrategy::Merge`], a child failure (unless that step is
/// `continue_on_error`) aborts the workflow; whether the remaining
/// siblings are cancelled at that point is configurable.
pub struct ParallelWorkflow {
    id: String,
    name: String,
    steps: Vec<WorkflowStep>,
    merge: MergeStrategy,
    cancel_siblings_on_failure: bool,
}

impl ParallelWorkflow {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: format!("{name}-{}", uuid::Uuid::new_v4()),
            name,
            steps: Vec::new(),
            merge: MergeStrategy::Merge,
            cancel_siblings_on_failure: true,
        }
    }

    pub fn step(mut self, step: WorkflowStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn merge_strategy(mut self, merge: MergeStrategy) -> Self {
        self.merge = merge;
        self
    }

    pub fn cancel_siblings_on_failure(mut self, cancel: bool) -> Self {
        self.cancel_siblings_on_failure = cancel;
        self
    }

    /// Key-union merge: later children (by declaration order) overwrite
    /// earlier writes; messages appended beyond the shared base; artifact
    /// and metadata maps union the same way.
    fn merge_states(base: &State, results: Vec<(usize, State)>) -> State {
        let mut merged = base.clone();
        let base_messages = base.messages().len();
        let mut ordered = results;
        ordered.sort_by_key(|(index, _)| *index);
        for (_, child) in ordered {
            for (key, value) in child.values() {
                merged.set(key, value);
            }
            for message in child.messages().iter().skip(base_messages) {
                merged.add_message(message.clone());
            }
            for (_, artifact) in child.artifacts() {
                merged.add_artifact(artifact);
            }
            for (key, value) in child.metadata() {
                merged.set_metadata(key, value);
            }
        }
        merged
    }
}

#[async_trait]
impl Agent for ParallelWorkflow {
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
            json!({"steps": self.steps.len(), "parallel": true}),
        );
        if self.steps.is_empty() {
            ctx.emit(types::WORKFLOW_COMPLETE, serde_json::Value::Null);
            return Ok(state);
        }

        let child_token = ctx.cancellation().child_token();
        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, Result<State, AgentError>)>();

        for (index, step) in self.steps.iter().enumerate() {
            let step = step.clone();
            let child_ctx = ctx.clone().with_cancellation(child_token.clone());
            let child_state = state.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = step.run(&child_ctx, child_state).await;
                let _ = tx.send((index, result));
            });
        }
        drop(tx);

        let outcome = match self.merge {
            MergeStrategy::Race => {
                let (index, result) = rx.recv().await.ok_or(AgentError::Cancelled)?;
                child_token.cancel();
                ctx.emit(types::WORKFLOW_STEP, json!({"index": index, "won_race": true}));
                result
            }
            MergeStrategy::FirstSuccess => {
                let mut last_error = None;
                let mut winner = None;
                while let Some((index, result)) = rx.recv().await {
                    match result {
                        Ok(state) => {
                            child_token.cancel();
                            ctx.emit(
                                types::WORKFLOW_STEP,
                                json!({"index": index, "first_success": true}),
                            );
                            winner = Some(state);
                            break;
                        }
                        Err(err) => {
                            warn!(index, error = %err, "parallel child failed");
                            last_error = Some(err);
                        }
                    }
                }
                match winner {
                    Some(state) => Ok(state),
                    None => Err(last_error.unwrap_or(AgentError::Cancelled)),
                }
            }
            MergeStrategy::Merge => {
                let mut results = Vec::with_capacity(self.steps.len());
                let mut failure: Option<AgentError> = None;
                while let Some((index, result)) = rx.recv().await {
                    match result {
                        Ok(state) => results.push((index, state)),
                        Err(err) if self.steps[index].continues_on_error() => {
                            warn!(index, error = %err, "parallel child failed, continuing");
                        }
                        Err(err) => {
                            if failure.is_none() {
                                if self.cancel_siblings_on_failure {
                                    child_token.cancel();
                                }
                                failure = Some(err);
                            }
                        }
                    }
                }
                match failure {
                    Some(err) => Err(err),
                    None => Ok(Self::merge_states(&state, results)),
                }
            }
        };

        match outcome {
            Ok(state) => {
                ctx.emit(types::WORKFLOW_COMPLETE, serde_json::Value::Null);
                Ok(state)
            }
            Err(err) => {
                ctx.emit_error(types::AGENT_ERROR, serde_json::Value::Null, err.to_string());
                Err(err)
            }
        }
    }
}
