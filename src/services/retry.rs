//! Declarative retry with exponential backoff

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// How an operation is retried.
///
/// Delay before attempt `n + 1` is `base_delay * multiplier^(n - 1)`.
#[derive(Debug, Clone)]
pub struct RetryPolicy<E> {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: u32,
    /// Errors for which retrying is pointless
    pub is_permanent: fn(&E) -> bool,
}

impl<E> RetryPolicy<E> {
    pub fn new(max_attempts: u32, base_delay: Duration, multiplier: u32, is_permanent: fn(&E) -> bool) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            multiplier: multiplier.max(1),
            is_permanent,
        }
    }

    /// Backoff after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

/// Run `operation` until it succeeds, fails permanently, or the policy's
/// attempts are exhausted. The last error is returned unchanged.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy<E>, operation_name: &str, mut operation: F) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(operation = operation_name, attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if (policy.is_permanent)(&err) => {
                tracing::error!(
                    operation = operation_name,
                    attempt,
                    error = %err,
                    "Permanent failure, not retrying"
                );
                return Err(err);
            }
            Err(err) if attempt >= policy.max_attempts => {
                tracing::error!(
                    operation = operation_name,
                    attempt,
                    error = %err,
                    "Operation failed: retries exhausted"
                );
                return Err(err);
            }
            Err(err) => {
                let backoff = policy.delay_after(attempt);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "Transient failure, will retry after backoff"
                );
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
