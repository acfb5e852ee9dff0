//! Typed provider failures and their retry classification.

use std::time::Duration;

use thiserror::Error;

/// Failure surfaced by a provider call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    /// The backend throttled the request; retry after the hinted delay.
    #[error("rate limited{}", retry_after.map(|d| format!(" (retry after {:?})", d)).unwrap_or_default())]
    RateLimit { retry_after: Option<Duration> },

    /// The credentials were rejected. Never retried.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Transport failure, including timeouts.
    #[error("network error{}: {message}", if *timeout { " (timeout)" } else { "" })]
    Network { message: String, timeout: bool },

    /// The backend answered, but the answer could not be used
    /// (malformed wire shape, unextractable structured output).
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Backend-reported failure that fits no other kind.
    #[error("provider error: {0}")]
    Provider(String),

    /// The caller's context was cancelled.
    #[error("provider call cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Whether a retry with backoff may succeed.
    ///
    /// Only throttling and transport failures are transient;
    /// authentication and malformed responses are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimit { .. } | Self::Network { .. })
    }

    /// The backend's retry-after hint, when it gave one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimit { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Shorthand for a timeout-flavored network error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            timeout: true,
        }
    }
}
