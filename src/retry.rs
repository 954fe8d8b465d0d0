//! Bounded, fixed-delay retry of a single fallible operation.
//!
//! The executor makes at most `max_attempts` sequential attempts and waits
//! the same `delay` between consecutive attempts. There is no backoff growth,
//! no jitter, and no trailing delay after the final attempt. Every
//! [`BackendError`] is retried the same way regardless of its origin.

use crate::backend::BackendError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// A ceiling of zero is treated as a single attempt.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_DELAY)
    }
}

/// Terminal failure after the retry ceiling was reached.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Failed after {attempts} attempts. Last error: {last_error}")]
pub struct RetryExhausted {
    pub last_error: BackendError,
    pub attempts: u32,
}

/// Runs `operation` under `policy`.
///
/// The closure receives the 1-based attempt number. On the first success the
/// value is returned immediately. When every attempt fails the last error is
/// returned together with the number of attempts made, which always equals
/// `policy.max_attempts()`.
pub async fn execute<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, RetryExhausted>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt < policy.max_attempts => {
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    origin = %e.origin,
                    "Attempt failed, retrying in {:?}: {}",
                    policy.delay,
                    e
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => {
                error!(
                    attempts = attempt,
                    origin = %e.origin,
                    "All attempts failed: {}",
                    e
                );
                return Err(RetryExhausted {
                    last_error: e,
                    attempts: attempt,
                });
            }
        }
    }
}
