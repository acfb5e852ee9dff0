//! Guardrails: pre/post validators around an agent's run.
//!
//! A [`Guardrail`] inspects the [`State`] before an agent runs (input
//! kind), after it finishes (output kind), or both. Chains compose
//! guardrails with short-circuit semantics — the first failure aborts —
//! unless built with `continue_on_error`. [`GuardedAgent`] wraps any agent
//! with an input and an output chain.

pub mod builtin;
mod guarded;

pub use builtin::{
    Blocklist, MaxStateSize, PiiDetector, RateLimit, RegexFilter, RequiredKeys, TopicRestriction,
};
pub use guarded::GuardedAgent;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::run_context::RunContext;
use crate::state::State;

/// When a guardrail applies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GuardrailKind {
    Input,
    Output,
    #[default]
    Both,
}

impl GuardrailKind {
    /// Whether a guardrail of this kind runs at the given position.
    pub fn applies_to(&self, position: GuardrailKind) -> bool {
        matches!(self, GuardrailKind::Both) || *self == position
    }
}

/// A guardrail failure (or timeout, which counts as one).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuardrailError {
    #[error("guardrail {guardrail} rejected the state: {message}")]
    Rejected { guardrail: String, message: String },
    #[error("guardrail {guardrail} timed out after {timeout:?}")]
    Timeout {
        guardrail: String,
        timeout: Duration,
    },
}

impl GuardrailError {
    pub fn rejected(guardrail: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            guardrail: guardrail.into(),
            message: message.into(),
        }
    }
}

/// A validator applied around agent execution.
#[async_trait]
pub trait Guardrail: Send + Sync {
    fn name(&self) -> &str;

    /// Where this guardrail applies; defaults to both sides.
    fn kind(&self) -> GuardrailKind {
        GuardrailKind::Both
    }

    /// Checks `state`; `Ok(())` lets the run proceed.
    async fn validate(&self, ctx: &RunContext, state: &State) -> Result<(), GuardrailError>;

    /// Validation with a deadline; timeout counts as failure.
    async fn validate_async(
        &self,
        ctx: &RunContext,
        state: &State,
        timeout: Duration,
    ) -> Result<(), GuardrailError> {
        match tokio::time::timeout(timeout, self.validate(ctx, state)).await {
            Ok(result) => result,
            Err(_) => Err(GuardrailError::Timeout {
                guardrail: self.name().to_string(),
                timeout,
            }),
        }
    }
}

/// An ordered chain of guardrails.
///
/// Runs each guardrail whose kind applies, in order. By default the first
/// failure aborts the chain; with `continue_on_error` every guardrail
/// runs and the first failure is reported at the end.
#[derive(Clone, Default)]
pub struct GuardrailChain {
    guardrails: Vec<Arc<dyn Guardrail>>,
    continue_on_error: bool,
}

impl GuardrailChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// A chain that runs every guardrail even after a failure.
    pub fn continue_on_error() -> Self {
        Self {
            guardrails: Vec::new(),
            continue_on_error: true,
        }
    }

    pub fn with(mut self, guardrail: Arc<dyn Guardrail>) -> Self {
        self.guardrails.push(guardrail);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.guardrails.is_empty()
    }

    /// Runs the chain at `position` (input or output).
    pub async fn run(
        &self,
        ctx: &RunContext,
        state: &State,
        position: GuardrailKind,
    ) -> Result<(), GuardrailError> {
        let mut first_failure: Option<GuardrailError> = None;
        for guardrail in &self.guardrails {
            if !guardrail.kind().applies_to(position) {
                continue;
            }
            if let Err(err) = guardrail.validate(ctx, state).await {
                warn!(guardrail = %guardrail.name(), error = %err, "guardrail failed");
                if !self.continue_on_error {
                    return Err(err);
                }
                first_failure.get_or_insert(err);
            }
        }
        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
