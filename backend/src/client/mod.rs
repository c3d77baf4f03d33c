//! Upstream HTTP clients.
//!
//! - [`DataFetcher`] pulls raw record batches from the records API
//! - [`DataSubmitter`] posts analysis results downstream
//!
//! Both authenticate with a bearer token and retry with exponential backoff.
//! Submissions carry an idempotency key that stays the same across retries.

pub mod fetcher;
pub mod submitter;

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::config::Config;

pub use fetcher::DataFetcher;
pub use submitter::{DataSubmitter, IDEMPOTENCY_HEADER};

/// How many times to try an upstream call and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    /// Delay before the first retry; doubles each time.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.retry_attempts, config.retry_base_delay)
    }

    /// Delay after the given zero-based failed attempt: `base * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Build the shared reqwest client with the configured timeout.
pub(crate) fn http_client(config: &Config) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(config.timeout).build()
}

/// Run `op` until it succeeds, fails with a non-retryable error, or runs out
/// of attempts. On failure returns the attempt count and the last error.
pub(crate) async fn retry<T, E, F, Fut>(
    policy: RetryPolicy,
    what: &str,
    is_retryable: fn(&E) -> bool,
    mut op: F,
) -> Result<T, (u32, E)>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.attempts && is_retryable(&e) => {
                let delay = policy.delay_for(attempt - 1);
                warn!(
                    what,
                    attempt,
                    max_attempts = policy.attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err((attempt, e)),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_exponential_backoff() {
        let policy = RetryPolicy::new(4, Duration::from_millis(1000));
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
        assert!(policy.delay_for(64) >= policy.delay_for(31));
    }

    #[test]
    fn test_policy_has_at_least_one_attempt() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).attempts, 1);
        assert_eq!(RetryPolicy::default().attempts, 3);
    }

    #[tokio::test]
    async fn test_retry_stops_on_success() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(5, Duration::from_millis(1));

        let result: Result<u32, (u32, String)> = retry(policy, "test", |_| true, || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n < 3 {
                    Err(format!("fail {}", n))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(1));

        let result: Result<(), (u32, String)> = retry(policy, "test", |_| true, || {
            calls.set(calls.get() + 1);
            async { Err("down".to_string()) }
        })
        .await;

        assert_eq!(result, Err((3, "down".to_string())));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_fails_immediately() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(1));

        let result: Result<(), (u32, String)> = retry(policy, "test", |_| false, || {
            calls.set(calls.get() + 1);
            async { Err("bad request".to_string()) }
        })
        .await;

        assert_eq!(result, Err((1, "bad request".to_string())));
        assert_eq!(calls.get(), 1);
    }
}
