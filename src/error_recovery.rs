// src/error_recovery.rs
//! Retry with exponential backoff for calls to external collaborators.

use crate::constants::{
    COMPLETION_MAX_ATTEMPTS, RETRY_INITIAL_DELAY, RETRY_MAX_DELAY, STORE_MAX_ATTEMPTS,
};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// How many times to try an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay,
        }
    }

    /// Budget for one text-completion call.
    pub fn completion() -> Self {
        Self::new(COMPLETION_MAX_ATTEMPTS, RETRY_INITIAL_DELAY, RETRY_MAX_DELAY)
    }

    /// Budget for one document-store write.
    pub fn store() -> Self {
        Self::new(STORE_MAX_ATTEMPTS, RETRY_INITIAL_DELAY, RETRY_MAX_DELAY)
    }

    /// Retries without sleeping. Used by tests and benchmarks.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::completion()
    }
}

/// Retries an async operation with exponential backoff.
///
/// Every error is considered transient. The last error is returned once the
/// attempts run out.
pub async fn retry_with_backoff<F, T, E, Fut>(
    operation: F,
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let policy = RetryPolicy::new(max_attempts, initial_delay, max_delay);
    retry_with_backoff_if(operation, &policy, |_| true).await
}

/// Like [`retry_with_backoff`], but gives up at once on errors for which
/// `is_retryable` returns `false`.
pub async fn retry_with_backoff_if<F, T, E, Fut, P>(
    mut operation: F,
    policy: &RetryPolicy,
    is_retryable: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut delay = policy.initial_delay;
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt >= max_attempts || !is_retryable(&e) {
                    return Err(e);
                }

                log::warn!(
                    "Attempt {}/{} failed: {}; retrying after {:?}",
                    attempt,
                    max_attempts,
                    e,
                    delay
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }

                // Exponential backoff with cap
                delay = std::cmp::min(delay * 2, policy.max_delay);
                attempt += 1;
            }
        }
    }
}
