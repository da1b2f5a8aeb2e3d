//! Retry policy for fallible crawl operations
//!
//! Each class of operation (navigation, conversion, classification,
//! extraction) carries its own `RetryPolicy`. Retries are bounded, back off
//! exponentially with optional jitter, and stop early when the crawl is
//! cancelled.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Retry policy for one class of operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Delay before the second attempt (milliseconds)
    pub base_delay_ms: u64,

    /// Multiplier applied per attempt
    pub backoff_factor: f64,

    /// Upper bound for a single delay (milliseconds)
    pub max_delay_ms: u64,

    /// Adds up to 10% random extra delay
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay_ms: 1000,
            backoff_factor: 2.0,
            max_delay_ms: 30_000,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Policy for page navigation
    pub fn navigation() -> Self {
        Self {
            max_attempts: 2,
            ..Self::default()
        }
    }

    /// Policy for reader-service conversion
    pub fn conversion() -> Self {
        Self {
            max_attempts: 3,
            backoff_factor: 2.0,
            jitter: true,
            ..Self::default()
        }
    }

    /// Policy for link classification
    pub fn classification() -> Self {
        Self {
            max_attempts: 2,
            backoff_factor: 1.0,
            ..Self::default()
        }
    }

    /// Policy for job extraction
    pub fn extraction() -> Self {
        Self {
            max_attempts: 2,
            ..Self::default()
        }
    }

    /// A policy that tries once and never waits
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            backoff_factor: 1.0,
            max_delay_ms: 0,
            jitter: false,
        }
    }

    /// Calculates the delay before retrying after failed attempt `attempt`
    ///
    /// # Arguments
    ///
    /// * `attempt` - The 1-based number of the attempt that just failed
    ///
    /// # Returns
    ///
    /// `base * factor^(attempt - 1)`, capped at `max_delay_ms`, scaled by
    /// `1 + U[0, 0.1)` when jitter is enabled
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let delay_ms = self.base_delay_ms as f64 * self.backoff_factor.max(0.0).powi(exponent);
        let capped = delay_ms.min(self.max_delay_ms as f64).max(0.0);

        let final_ms = if self.jitter {
            capped * (1.0 + rand::random_range(0.0..0.1))
        } else {
            capped
        };

        Duration::from_secs_f64(final_ms / 1000.0)
    }

    /// Returns true if another attempt is allowed after `attempt` attempts
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts.max(1)
    }

    /// Runs `op` under this policy
    ///
    /// # Arguments
    ///
    /// * `op_name` - Name used in log lines
    /// * `cancel` - Stops retrying (and waiting) once cancelled
    /// * `is_retryable` - Errors for which this returns false are returned at once
    /// * `op` - Called with the 1-based attempt number
    ///
    /// # Returns
    ///
    /// The first successful value, or a `RetryError` describing why it stopped
    pub async fn run<T, E, F, Fut>(
        &self,
        op_name: &str,
        cancel: &CancellationToken,
        is_retryable: impl Fn(&E) -> bool,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        E: std::fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled);
            }
            attempt += 1;

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                result = op(attempt) => result,
            };

            let err = match result {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !is_retryable(&err) {
                tracing::debug!("{} failed with a non-retryable error: {}", op_name, err);
                return Err(RetryError::Rejected(err));
            }

            if attempt >= max_attempts {
                tracing::error!("{} failed after {} attempts: {}", op_name, attempt, err);
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: err,
                });
            }

            let delay = self.calculate_backoff(attempt);
            tracing::warn!(
                "{} attempt {}/{} failed: {} (retrying in {:?})",
                op_name,
                attempt,
                max_attempts,
                err,
                delay
            );

            if !sleep_or_cancel(delay, cancel).await {
                return Err(RetryError::Cancelled);
            }
        }
    }
}

/// Why a retried operation stopped without a value
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed; `last` is the final error
    Exhausted { attempts: u32, last: E },
    /// The error was not retryable
    Rejected(E),
    /// The cancellation token fired
    Cancelled,
}

impl<E> RetryError<E> {
    /// Returns the underlying error, if there is one
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Exhausted { last, .. } => Some(last),
            Self::Rejected(err) => Some(err),
            Self::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Sleeps for `duration` unless `cancel` fires first
///
/// Returns false if the sleep was interrupted by cancellation.
pub async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    if duration.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
