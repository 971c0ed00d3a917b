//! Bounded retry with exponential backoff.
//!
//! Shared by the external fetcher and the update publisher.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Retry policy: attempt budget and backoff schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds.
    pub initial_backoff_ms: u64,

    /// Factor applied to the delay after every retry.
    pub backoff_multiplier: f64,

    /// Upper bound for a single delay in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1000,
            backoff_multiplier: 2.0,
            max_backoff_ms: 10_000,
        }
    }
}

/// Why a retried operation gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// A non-retryable error stopped the loop.
    Aborted {
        /// Attempt that failed.
        attempt: u32,
        /// The error.
        error: E,
    },

    /// The attempt budget ran out.
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// Error of the final attempt.
        error: E,
    },
}

impl<E> RetryError<E> {
    /// Returns the number of attempts made.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Aborted { attempt, .. } => *attempt,
            Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    /// Consumes the error, returning the last underlying failure.
    pub fn into_inner(self) -> E {
        match self {
            Self::Aborted { error, .. } | Self::Exhausted { error, .. } => error,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given attempt budget and initial backoff.
    #[must_use]
    pub fn new(max_attempts: u32, initial_backoff_ms: u64) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms,
            ..Default::default()
        }
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Sets the backoff cap.
    #[must_use]
    pub fn with_max_backoff(mut self, ms: u64) -> Self {
        self.max_backoff_ms = ms;
        self
    }

    /// Calculates the delay to wait before retry number `retry` (0-based).
    #[must_use]
    pub fn calculate_backoff(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let backoff = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(exponent);
        let backoff = if backoff.is_finite() {
            (backoff as u64).min(self.max_backoff_ms)
        } else {
            self.max_backoff_ms
        };
        Duration::from_millis(backoff)
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget runs out.
    ///
    /// The operation receives the 1-based attempt number. Delays are applied
    /// only between attempts, never before the first.
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::Aborted`] when `is_retryable` rejects an error and
    /// [`RetryError::Exhausted`] when every attempt failed.
    pub async fn run<T, E, F, Fut, P>(
        &self,
        mut operation: F,
        is_retryable: P,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) if !is_retryable(&error) => {
                    return Err(RetryError::Aborted { attempt, error });
                }
                Err(error) if attempt >= max_attempts => {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        error,
                    });
                }
                Err(error) => {
                    let delay = self.calculate_backoff(attempt - 1);
                    debug!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Attempt failed, retrying: {}",
                        error
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_backoff_ms, 1000);
        assert_eq!(policy.backoff_multiplier, 2.0);
    }

    #[test]
    fn test_calculate_backoff_doubles() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.calculate_backoff(0), Duration::from_secs(1));
        assert_eq!(policy.calculate_backoff(1), Duration::from_secs(2));
        assert_eq!(policy.calculate_backoff(2), Duration::from_secs(4));
    }

    #[test]
    fn test_calculate_backoff_capped() {
        let policy = RetryPolicy::new(5, 1000)
            .with_multiplier(10.0)
            .with_max_backoff(5000);

        assert_eq!(policy.calculate_backoff(2), Duration::from_millis(5000));
        assert_eq!(policy.calculate_backoff(u32::MAX), Duration::from_millis(5000));
    }

    #[tokio::test]
    async fn test_run_succeeds_first_attempt() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, RetryError<String>> = RetryPolicy::default()
            .run(
                |attempt| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move { Ok(attempt) }
                },
                |_| true,
            )
            .await;

        assert_eq!(result, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_exhausts_with_backoff() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let result: Result<(), RetryError<String>> = RetryPolicy::default()
            .run(
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err("timeout".to_string()) }
                },
                |_| true,
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            result,
            Err(RetryError::Exhausted {
                attempts: 3,
                error: "timeout".to_string()
            })
        );
        // 1s before the second attempt, 2s before the third.
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_recovers_after_retry() {
        let result: Result<u32, RetryError<String>> = RetryPolicy::default()
            .run(
                |attempt| async move {
                    if attempt < 2 {
                        Err("reset".to_string())
                    } else {
                        Ok(attempt)
                    }
                },
                |_| true,
            )
            .await;

        assert_eq!(result, Ok(2));
    }

    #[tokio::test]
    async fn test_run_aborts_on_non_retryable() {
        let calls = AtomicU32::new(0);
        let result: Result<(), RetryError<String>> = RetryPolicy::default()
            .run(
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err("malformed".to_string()) }
                },
                |_| false,
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let err = result.expect_err("should abort");
        assert_eq!(err.attempts(), 1);
        assert_eq!(err.into_inner(), "malformed");
    }

    #[tokio::test]
    async fn test_run_zero_attempts_still_tries_once() {
        let policy = RetryPolicy::new(0, 1);
        let result: Result<(), RetryError<String>> = policy
            .run(|_| async { Err("down".to_string()) }, |_| true)
            .await;

        assert_eq!(result.map_err(|e| e.attempts()), Err(1));
    }
}
