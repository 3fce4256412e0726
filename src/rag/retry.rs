//! Backoff retry around flaky upstream calls

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::config::ChatConfig;
use crate::errors::DsaCoachError;
use crate::errors::Result;

/// Attempt budget and first wait for [`retry_with_backoff`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_retries: u32,
    pub initial_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    #[must_use]
    pub const fn from_config(config: &ChatConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.retry_delay_ms),
        )
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

/// Run `op` until it succeeds, fails permanently, or the budget runs out.
///
/// A failure accepted by `is_transient` is retried after waiting
/// `initial_delay`, then twice that, and so on. Any other failure, and the
/// failure of the last attempt, is returned unchanged.
///
/// # Errors
/// - The first non-transient error from `op`
/// - The transient error of the final attempt
/// - `RetryExhausted` when the policy allows no attempts at all
pub async fn retry_with_backoff<T, F, Fut, P>(
    policy: &RetryPolicy,
    is_transient: P,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&DsaCoachError) -> bool,
{
    let mut delay = policy.initial_delay;

    for attempt in 1..=policy.max_retries {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_retries && is_transient(&e) => {
                warn!(
                    "Attempt {} failed ({}). Retrying in {}ms...",
                    attempt,
                    e,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
            }
            Err(e) => return Err(e),
        }
    }

    Err(DsaCoachError::RetryExhausted)
}
