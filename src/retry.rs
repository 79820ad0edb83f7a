// ABOUTME: Retry helper with linear backoff for transient upload failures
// ABOUTME: Attempt n that fails waits n delay units before attempt n+1

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Wait after the first failure; later waits grow linearly.
    pub delay_unit: Duration,
}

impl RetryPolicy {
    pub fn linear(max_attempts: u32, delay_unit: Duration) -> Self {
        Self {
            max_attempts,
            delay_unit,
        }
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.delay_unit * attempt
    }
}

/// Runs `operation` until it succeeds or `policy.max_attempts` is reached.
///
/// Returns the last error once attempts are exhausted. No wait follows the
/// final attempt.
pub async fn retry_with_linear_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match operation(attempt).await {
            Ok(result) => return Ok(result),
            Err(e) if attempt >= max_attempts => {
                error!(
                    operation = %operation_name,
                    attempt = attempt,
                    error = %e,
                    "Operation failed after max retries"
                );
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_after(attempt);
                warn!(
                    operation = %operation_name,
                    attempt = attempt,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "Operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
