//! Top-level agent execution error.

use thiserror::Error;

use crate::guardrail::GuardrailError;
use crate::provider::ProviderError;
use crate::tool::ToolError;

/// Error returned by `Agent::run`.
///
/// Per-subsystem failures fold in transparently; the loop-level kinds
/// (cancellation, budget) are its own. Tool failures normally re-enter the
/// conversation as error results instead of surfacing here — a
/// `Tool` variant means the run itself had to stop.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The run's context was cancelled.
    #[error("run cancelled")]
    Cancelled,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Guardrail(#[from] GuardrailError),

    /// The model kept calling tools past the iteration budget.
    #[error("iteration budget exceeded ({limit} model calls)")]
    BudgetExceeded { limit: u32 },

    /// A step failed with a plain message (hooks, workflow functions).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

impl AgentError {
    /// Folds provider-level cancellation into the loop-level kind so
    /// callers match one variant.
    pub(crate) fn from_provider(err: ProviderError) -> Self {
        match err {
            ProviderError::Cancelled => AgentError::Cancelled,
            other => AgentError::Provider(other),
        }
    }
}
