//! Retry logic with linear backoff

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::Error;
use crate::config::RequestConfig;

/// Default delay unit between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(300);

/// Retry policy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub retries: u32,
    /// Delay unit; the wait before attempt `n + 1` is `delay * n`
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 0,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Create from config
    #[must_use]
    pub fn new(config: &RequestConfig) -> Self {
        Self {
            retries: config.retries,
            delay: config.retry_delay,
        }
    }

    /// Total attempts allowed
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Wait after the failed attempt number `attempt` (1-indexed)
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.delay.saturating_mul(attempt)
    }
}

/// Execute a future with retry logic
///
/// At most `policy.retries + 1` attempts are made. A failure is retried only
/// when attempts remain and [`Error::is_retryable`] holds. Cancellation
/// during the backoff sleep aborts with [`Error::Cancelled`].
///
/// # Errors
///
/// Returns the last error from `f` if all retry attempts are exhausted or
/// the error is not retryable.
pub async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    name: &str,
    cancel: Option<&CancellationToken>,
    mut f: F,
) -> Result<T, Error>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let err = match f(attempt).await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if !err.is_retryable() {
            return Err(err);
        }

        if attempt >= max_attempts {
            debug!(operation = name, attempts = attempt, "Max retry attempts reached");
            return Err(err);
        }

        let delay = policy.backoff(attempt);
        warn!(
            operation = name,
            attempt,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "Retrying after backoff"
        );

        match cancel {
            Some(token) => {
                tokio::select! {
                    () = token.cancelled() => return Err(Error::Cancelled),
                    () = sleep(delay) => {}
                }
            }
            None => sleep(delay).await,
        }
    }
}
