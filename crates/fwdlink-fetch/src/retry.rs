//! Retry with exponential backoff for page fetches.
//!
//! Only connection failures are retried. A timed-out request is not
//! retried, so a fetch never exceeds its timeout by more than the
//! backoff delays of the failed connection attempts. Status codes are
//! the caller's concern.

use std::time::Duration;

/// Backoff schedule: `base`, `2 * base`, `4 * base`, ...
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Send a request, retrying on connection errors.
///
/// The closure is called up to `max_retries + 1` times.
pub(crate) async fn retry_send<F, Fut>(
    policy: RetryPolicy,
    f: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    for attempt in 0..policy.max_retries {
        match f().await {
            Ok(resp) => return Ok(resp),
            Err(e) if e.is_connect() => {
                let delay = policy.delay(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    "page fetch failed to connect, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
    f().await
}
