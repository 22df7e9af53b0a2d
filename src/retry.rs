//! Retry with exponential backoff
//!
//! This module wraps fallible operations so that recoverable failures are
//! retried after a growing delay. Waiting is delegated to a [`Sleeper`], which
//! allows the wait to be interrupted through a cancellation token and lets
//! tests observe the computed delays without actually sleeping.

use std::fmt::Display;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Granularity at which a sleeping thread re-checks its cancellation token
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Parameters of an exponential backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the final unguarded one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Factor the delay is multiplied with after every retry
    pub backoff: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_secs(3),
            backoff: 2,
        }
    }
}

/// Returned by a [`Sleeper`] when the wait was interrupted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Operation cancelled")]
pub struct Cancelled;

/// Outcome of a retried operation that did not succeed
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The operation failed with a non-recoverable error, or the final
    /// attempt after exhausting the budget failed
    #[error("{0}")]
    Failed(E),

    /// The cancellation token fired before or while waiting
    #[error("Operation cancelled")]
    Cancelled,
}

/// Something that can wait for a given duration
///
/// Implementations must return early with [`Cancelled`] once the token is
/// cancelled, so that a retry loop never outlives its caller's interest.
pub trait Sleeper: Send + Sync {
    /// Blocks the calling thread for `delay` unless `cancel` fires first
    fn sleep(&self, delay: Duration, cancel: &CancellationToken) -> Result<(), Cancelled>;
}

/// Sleeper suspending the current thread only
///
/// Other threads, and thus unrelated fetches, are never blocked by it.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration, cancel: &CancellationToken) -> Result<(), Cancelled> {
        let deadline = Instant::now() + delay;
        loop {
            if cancel.is_cancelled() {
                return Err(Cancelled);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            thread::sleep((deadline - now).min(CANCEL_POLL_INTERVAL));
        }
    }
}

/// Runs `operation`, retrying recoverable failures with exponential backoff
///
/// While more than one attempt remains, every failure accepted by
/// `is_retryable` is logged at warn level, followed by a wait of the current
/// delay, after which the delay is multiplied by the backoff factor. Once the
/// budget is down to a single attempt, the operation is called one final time
/// and its result is returned as is. Failures rejected by `is_retryable`
/// propagate immediately.
///
/// # Examples
///
/// ```
/// use maze_indexer::{RetryPolicy, ThreadSleeper, retry_with_backoff};
/// use tokio_util::sync::CancellationToken;
///
/// let result: Result<u32, _> = retry_with_backoff(
///     &RetryPolicy::default(),
///     &ThreadSleeper,
///     &CancellationToken::new(),
///     |_: &String| true,
///     || Ok(42),
/// );
/// assert_eq!(result.unwrap(), 42);
/// ```
pub fn retry_with_backoff<T, E, Op, P>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    cancel: &CancellationToken,
    is_retryable: P,
    mut operation: Op,
) -> Result<T, RetryError<E>>
where
    Op: FnMut() -> Result<T, E>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let mut remaining = policy.max_attempts;
    let mut delay = policy.initial_delay;

    while remaining > 1 {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled);
        }

        match operation() {
            Ok(value) => return Ok(value),
            Err(error) if is_retryable(&error) => {
                warn!(
                    error = %error,
                    delay_secs = delay.as_secs_f64(),
                    "{}, retrying in {:?}",
                    error,
                    delay
                );
                sleeper
                    .sleep(delay, cancel)
                    .map_err(|_| RetryError::Cancelled)?;
                remaining -= 1;
                delay = delay.saturating_mul(policy.backoff);
            }
            Err(error) => return Err(RetryError::Failed(error)),
        }
    }

    if cancel.is_cancelled() {
        return Err(RetryError::Cancelled);
    }

    operation().map_err(RetryError::Failed)
}
