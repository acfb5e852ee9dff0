//! Workflow combinators: sequential, parallel, and loop composition.
//!
//! A [`WorkflowStep`] wraps either an [`Agent`] or a pure `State → State`
//! function. The combinators are agents themselves, so workflows nest:
//! a parallel branch can hold a sequential pipeline whose steps are loops.
//! Workflow events carry the workflow's identity via the run context.

mod loop_workflow;
mod parallel;
mod sequential;

pub use loop_workflow::{keys as loop_keys, LoopWorkflow};
pub use parallel::{MergeStrategy, ParallelWorkflow};
pub use sequential::SequentialWorkflow;

use std::sync::Arc;

use crate::agent::Agent;
use crate::error::AgentError;
use crate::run_context::RunContext;
use crate::state::State;

type StepFn = Arc<dyn Fn(State) -> Result<State, AgentError> + Send + Sync>;

#[derive(Clone)]
enum StepKind {
    Agent(Arc<dyn Agent>),
    Func { name: String, f: StepFn },
}

/// One unit of work inside a workflow.
#[derive(Clone)]
pub struct WorkflowStep {
    kind: StepKind,
    continue_on_error: bool,
}

impl WorkflowStep {
    /// A step running an agent.
    pub fn agent(agent: Arc<dyn Agent>) -> Self {
        Self {
            kind: StepKind::Agent(agent),
            continue_on_error: false,
        }
    }

    /// A step running a pure function of the state.
    pub fn func<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(State) -> Result<State, AgentError> + Send + Sync + 'static,
    {
        Self {
            kind: StepKind::Func {
                name: name.into(),
                f: Arc::new(f),
            },
            continue_on_error: false,
        }
    }

    /// Lets the surrounding workflow carry on past this step's failure.
    pub fn continue_on_error(mut self) -> Self {
        self.continue_on_error = true;
        self
    }

    pub fn name(&self) -> &str {
        match &self.kind {
            StepKind::Agent(agent) => agent.name(),
            StepKind::Func { name, .. } => name,
        }
    }

    pub(crate) fn continues_on_error(&self) -> bool {
        self.continue_on_error
    }

    pub(crate) async fn run(&self, ctx: &RunContext, state: State) -> Result<State, AgentError> {
        match &self.kind {
            StepKind::Agent(agent) => agent.run(ctx, state).await,
            StepKind::Func { f, .. } => f(state),
        }
    }
}

impl std::fmt::Debug for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowStep")
            .field("name", &self.name())
            .field("continue_on_error", &self.continue_on_error)
            .finish()
    }
}
