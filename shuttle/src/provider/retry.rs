//! Retry with exponential backoff for transient provider failures.
//!
//! Only failures [`ProviderError::is_retryable`] classifies as transient
//! are retried: rate limits (honoring the backend's retry-after hint) and
//! network errors. Backoff is exponential with jitter, capped, and always
//! interruptible by the run's cancellation token.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use super::error::ProviderError;
use crate::run_context::RunContext;

/// Exponential backoff configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (so 3 = one call + two retries).
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    /// Random jitter as a fraction of the computed delay (0.0 to 1.0).
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(1)
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Backoff before retry number `retry` (0-based), with jitter applied.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let base = self.initial_delay.as_millis() as f64 * self.multiplier.powi(retry as i32);
        let capped = base.min(self.max_delay.as_millis() as f64);
        let jitter_range = capped * self.jitter;
        let jittered = capped - jitter_range / 2.0 + rand::random::<f64>() * jitter_range;
        Duration::from_millis(jittered.max(0.0) as u64)
    }
}

/// Runs `op` until it succeeds, fails terminally, or attempts run out.
///
/// `op` receives the 0-based attempt number. Rate-limit retry-after hints
/// stretch (never shrink) the computed backoff. Cancellation during the
/// call or the backoff sleep returns [`ProviderError::Cancelled`].
pub async fn retry_provider_call<T, F, Fut>(
    ctx: &RunContext,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, ProviderError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0u32;
    loop {
        if ctx.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }
        let result = tokio::select! {
            _ = ctx.cancellation().cancelled() => return Err(ProviderError::Cancelled),
            result = op(attempt) => result,
        };
        match result {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt + 1 < policy.max_attempts => {
                let mut delay = policy.delay_for(attempt);
                if let Some(hint) = err.retry_after() {
                    delay = delay.max(hint);
                }
                debug!(attempt, error = %err, delay_ms = delay.as_millis() as u64, "retrying provider call");
                tokio::select! {
                    _ = ctx.cancellation().cancelled() => return Err(ProviderError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts)
            .with_initial_delay(Duration::from_millis(1))
            .with_jitter(0.0)
    }

    /// **Scenario**: Transient failures are retried up to the attempt budget, then surfaced.
    #[tokio::test]
    async fn retries_transient_until_budget() {
        let ctx = RunContext::new();
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();
        let result: Result<(), _> = retry_provider_call(&ctx, &fast_policy(3), move |_| {
            let calls = calls2.clone();
            async move {
                calls.fetch_add(1, Ordering::Relaxed);
                Err(ProviderError::timeout("still down"))
            }
        })
        .await;
        assert!(matches!(result, Err(ProviderError::Network { .. })));
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }

    /// **Scenario**: A success on a retry attempt short-circuits the loop.
    #[tokio::test]
    async fn succeeds_after_transient() {
        let ctx = RunContext::new();
        let result = retry_provider_call(&ctx, &fast_policy(3), |attempt| async move {
            if attempt < 1 {
                Err(ProviderError::RateLimit { retry_after: None })
            } else {
                Ok(attempt)
            }
        })
        .await
        .unwrap();
        assert_eq!(result, 1);
    }

    /// **Scenario**: Terminal kinds are never retried.
    #[tokio::test]
    async fn terminal_error_not_retried() {
        let ctx = RunContext::new();
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();
        let result: Result<(), _> = retry_provider_call(&ctx, &fast_policy(5), move |_| {
            let calls = calls2.clone();
            async move {
                calls.fetch_add(1, Ordering::Relaxed);
                Err(ProviderError::Authentication("nope".into()))
            }
        })
        .await;
        assert!(matches!(result, Err(ProviderError::Authentication(_))));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    /// **Scenario**: Cancellation mid-backoff surfaces Cancelled promptly.
    #[tokio::test]
    async fn cancellation_interrupts_backoff() {
        let ctx = RunContext::new();
        let policy = RetryPolicy::new(3)
            .with_initial_delay(Duration::from_secs(60))
            .with_jitter(0.0);
        let token = ctx.cancellation().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });
        let result: Result<(), _> = retry_provider_call(&ctx, &policy, |_| async {
            Err(ProviderError::timeout("down"))
        })
        .await;
        assert!(matches!(result, Err(ProviderError::Cancelled)));
    }

    /// **Scenario**: delay_for grows exponentially and caps at max_delay.
    #[test]
    fn delay_growth_and_cap() {
        let policy = RetryPolicy::new(5)
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(350))
            .with_jitter(0.0);
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(350));
        assert_eq!(policy.delay_for(3), Duration::from_millis(350));
    }
}
