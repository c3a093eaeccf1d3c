//! Fixed-count, fixed-delay retry for connection establishment.
//!
//! No backoff and no jitter: every failed attempt except the last is followed
//! by the same sleep, and the error of the final attempt is the one surfaced.

use crate::config::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_SECS};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// How many times to attempt an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts (a value of 0 still makes one attempt).
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
        }
    }

    /// A policy that tries once and never sleeps.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Number of attempts this policy allows.
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_RETRIES,
            Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
        )
    }
}

/// Returned when every attempt failed.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Run `attempt` until it succeeds or the policy's attempts are used up.
///
/// The closure receives the 1-based attempt number.
pub async fn retry_fixed<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut attempt: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.attempts();
    let mut current = 1;

    loop {
        match attempt(current).await {
            Ok(value) => {
                if current > 1 {
                    info!(operation, attempt = current, "Succeeded after retrying");
                }
                return Ok(value);
            }
            Err(e) if current < max_attempts => {
                warn!(
                    operation,
                    attempt = current,
                    max_attempts,
                    retry_in_ms = policy.retry_delay.as_millis() as u64,
                    error = %e,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(policy.retry_delay).await;
                current += 1;
            }
            Err(e) => {
                return Err(RetryExhausted {
                    attempts: current,
                    last_error: e,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn counting_attempt(
        calls: &Arc<AtomicU32>,
        succeed_on: Option<u32>,
    ) -> impl FnMut(u32) -> std::pin::Pin<Box<dyn Future<Output = Result<u32, String>> + Send>>
    {
        let calls = Arc::clone(calls);
        move |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                match succeed_on {
                    Some(n) if attempt >= n => Ok(attempt),
                    _ => Err(format!("server down (attempt {})", attempt)),
                }
            })
        }
    }

    #[test]
    fn test_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.retry_delay, Duration::from_secs(2));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_fifth_attempt_after_four_sleeps() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let result = retry_fixed(
            &RetryPolicy::default(),
            "connect",
            counting_attempt(&calls, Some(5)),
        )
        .await;

        assert_eq!(result.unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        // Four 2s sleeps; a fifth would push this to 10s.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(8), "elapsed: {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(10), "elapsed: {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_surfaces_last_error_without_trailing_sleep() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let err = retry_fixed(
            &RetryPolicy::default(),
            "connect",
            counting_attempt(&calls, None),
        )
        .await
        .unwrap_err();

        assert_eq!(err.attempts, 5);
        assert_eq!(err.last_error, "server down (attempt 5)");
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(8), "elapsed: {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(10), "elapsed: {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_does_not_sleep() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let result = retry_fixed(
            &RetryPolicy::default(),
            "connect",
            counting_attempt(&calls, Some(1)),
        )
        .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_still_attempts_once() {
        let calls = Arc::new(AtomicU32::new(0));

        let err = retry_fixed(
            &RetryPolicy::new(0, Duration::from_secs(2)),
            "connect",
            counting_attempt(&calls, None),
        )
        .await
        .unwrap_err();

        assert_eq!(err.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
