//! Request policy for OpenAI calls: optional client-side rate limit and
//! optional bounded exponential backoff on transient errors.
//!
//! With `max_retries == 0` every call is a single attempt.

use backoff::ExponentialBackoffBuilder;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::errors::OpenAiError;

/// Rate limit and retry schedule shared by every request of a client.
pub struct RequestPolicy {
    limiter: Option<DefaultDirectRateLimiter>,
    max_retries: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl RequestPolicy {
    /// `None` or zero requests per second disables the rate limit.
    pub fn new(
        requests_per_second: Option<u32>,
        max_retries: u32,
        initial_backoff_ms: u64,
        max_backoff_ms: u64,
    ) -> Self {
        let limiter = requests_per_second
            .and_then(NonZeroU32::new)
            .map(|rps| RateLimiter::direct(Quota::per_second(rps)));

        Self {
            limiter,
            max_retries,
            initial_backoff: Duration::from_millis(initial_backoff_ms.max(1)),
            max_backoff: Duration::from_millis(max_backoff_ms.max(initial_backoff_ms.max(1))),
        }
    }

    /// Single attempt, no rate limit.
    pub fn single_attempt() -> Self {
        Self::new(None, 0, 1, 1)
    }

    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    async fn wait_for_permit(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Run `operation` under this policy.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, OpenAiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, OpenAiError>>,
    {
        if self.max_retries == 0 {
            self.wait_for_permit().await;
            return operation().await;
        }

        let attempts = AtomicU32::new(0);
        let schedule = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_max_interval(self.max_backoff)
            .with_max_elapsed_time(None)
            .build();

        let result = backoff::future::retry_notify(
            schedule,
            || {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                let call = operation();
                async move {
                    self.wait_for_permit().await;
                    match call.await {
                        Ok(value) => Ok(value),
                        Err(err) if err.is_transient() && attempt < self.max_retries => {
                            Err(backoff::Error::transient(err))
                        }
                        Err(err) => Err(backoff::Error::permanent(err)),
                    }
                }
            },
            |err: OpenAiError, wait: Duration| {
                warn!(error = %err, ?wait, "Transient OpenAI error, retrying");
            },
        )
        .await;

        let used = attempts.load(Ordering::SeqCst);
        if used > 1 {
            debug!(attempts = used, ok = result.is_ok(), "OpenAI call finished after retries");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_single_attempt_does_not_retry() {
        let policy = RequestPolicy::single_attempt();
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(OpenAiError::Network("down".to_string())) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried_up_to_limit() {
        let policy = RequestPolicy::new(None, 2, 1, 2);
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(OpenAiError::RateLimited("slow down".to_string())) }
            })
            .await;
        assert!(matches!(result, Err(OpenAiError::RateLimited(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_fail_fast() {
        let policy = RequestPolicy::new(None, 3, 1, 2);
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(OpenAiError::Client {
                        status: 401,
                        body: "bad key".to_string(),
                    })
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let policy = RequestPolicy::new(Some(100), 2, 1, 2);
        let calls = AtomicU32::new(0);
        let result = policy
            .execute(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(OpenAiError::Server {
                            status: 502,
                            body: String::new(),
                        })
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 1);
    }
}
