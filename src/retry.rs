//! Retry logic with exponential backoff and cancellation
//!
//! Throttled directory calls are retried per [`QuotaRetryConfig`]. Every wait,
//! and every call in flight, races the caller's [`CancellationToken`] so a
//! cancelled fetch never sits in a backoff sleep.
//!
//! # Example
//!
//! ```no_run
//! use directory_contacts::config::QuotaRetryConfig;
//! use directory_contacts::retry::{IsRetryable, RetryError, with_retry};
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Debug)]
//! struct Throttled;
//!
//! impl std::fmt::Display for Throttled {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "quota exceeded")
//!     }
//! }
//!
//! impl IsRetryable for Throttled {
//!     fn is_retryable(&self) -> bool {
//!         true
//!     }
//! }
//!
//! # async fn example() -> Result<(), RetryError<Throttled>> {
//! let config = QuotaRetryConfig::default();
//! let cancel = CancellationToken::new();
//! let value = with_retry(&config, &cancel, || async { Ok::<_, Throttled>(7) }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::QuotaRetryConfig;
use crate::error::DirectoryError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Trait for errors that can be classified as retryable or not
pub trait IsRetryable {
    /// Returns true if the operation should be attempted again
    fn is_retryable(&self) -> bool;
}

/// Only throttling is worth repeating; everything else the directory reports is final.
impl IsRetryable for DirectoryError {
    fn is_retryable(&self) -> bool {
        self.is_quota()
    }
}

/// Why [`with_retry`] stopped without a value
#[derive(Debug)]
pub enum RetryError<E> {
    /// The operation failed with an error that is not retryable
    Permanent(E),
    /// Retryable errors persisted through every allowed attempt
    Exhausted {
        /// Error returned by the last attempt
        last: E,
        /// Number of calls made
        attempts: u32,
    },
    /// The cancellation token fired
    Cancelled,
}

impl<E: std::fmt::Display> std::fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryError::Permanent(e) => write!(f, "{e}"),
            RetryError::Exhausted { last, attempts } => {
                write!(f, "gave up after {attempts} attempts: {last}")
            }
            RetryError::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl<E: std::fmt::Debug + std::fmt::Display> std::error::Error for RetryError<E> {}

/// Execute an async operation, retrying retryable failures with exponential backoff
///
/// # Arguments
///
/// * `config` - Attempt limit, delays, backoff multiplier and jitter
/// * `cancel` - Aborts the in-flight call or the pending sleep when cancelled
/// * `operation` - Async closure invoked once per attempt
///
/// # Returns
///
/// The first successful value, or a [`RetryError`] describing why retrying stopped.
pub async fn with_retry<F, Fut, T, E>(
    config: &QuotaRetryConfig,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt: u32 = 0;
    let mut delay = config.initial_delay;

    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RetryError::Cancelled),
            result = operation() => result,
        };
        attempt += 1;

        match result {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() => {
                if config.max_attempts.is_some_and(|max| attempt >= max) {
                    tracing::error!(
                        error = %e,
                        attempts = attempt,
                        "Operation failed after all retry attempts exhausted"
                    );
                    return Err(RetryError::Exhausted {
                        last: e,
                        attempts: attempt,
                    });
                }

                let wait = if config.jitter {
                    add_jitter(delay)
                } else {
                    delay
                };

                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = ?config.max_attempts,
                    delay_ms = wait.as_millis(),
                    "Operation throttled, retrying"
                );

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                    _ = tokio::time::sleep(wait) => {}
                }

                delay = next_delay(delay, config);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Operation failed with non-retryable error");
                return Err(RetryError::Permanent(e));
            }
        }
    }
}

/// Grow `delay` by the backoff multiplier, saturating at `max_delay`.
///
/// Products that do not fit in a [`Duration`] (overflow, infinity, NaN) also
/// land on `max_delay`.
fn next_delay(delay: Duration, config: &QuotaRetryConfig) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier)
        .map_or(config.max_delay, |next| next.min(config.max_delay))
}

/// Add random jitter to a delay so throttled batches do not retry in lockstep
///
/// The returned delay lies between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::try_from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor)).unwrap_or(delay)
}
