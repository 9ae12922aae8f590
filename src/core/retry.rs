//! Exponential backoff for eventually-consistent remote resources.
//!
//! The invoicing API renders PDFs asynchronously, so a download right after
//! creation may answer "not found" for a few seconds. [`RetryPolicy::execute`]
//! retries such kinds and re-raises everything else untouched.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{BridgeError, RemoteErrorKind};

/// Retry limits and the error kinds considered transient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one. At least 1.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Remote error kinds that trigger another attempt.
    pub retryable: Vec<RemoteErrorKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            retryable: vec![
                RemoteErrorKind::NotFound,
                RemoteErrorKind::TransientConnectionError,
            ],
        }
    }
}

/// Blocking wait between attempts.
pub trait Sleeper {
    fn sleep(&self, delay: Duration);
}

/// [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

impl<F: Fn(Duration)> Sleeper for F {
    fn sleep(&self, delay: Duration) {
        self(delay)
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay,
            ..Self::default()
        }
    }

    /// Replace the set of retryable kinds.
    pub fn retry_on(mut self, kinds: &[RemoteErrorKind]) -> Self {
        self.retryable = kinds.to_vec();
        self
    }

    /// Check `max_attempts >= 1` and `max_delay >= initial_delay`.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.max_attempts == 0 {
            return Err(BridgeError::Config(
                "retry max_attempts must be at least 1".into(),
            ));
        }
        if self.max_delay < self.initial_delay {
            return Err(BridgeError::Config(format!(
                "retry max_delay {:?} is shorter than initial_delay {:?}",
                self.max_delay, self.initial_delay
            )));
        }
        Ok(())
    }

    /// Delay after failed attempt `attempt` (1-indexed):
    /// `min(initial_delay * 2^(attempt-1), max_delay)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    pub fn is_retryable(&self, err: &BridgeError) -> bool {
        err.remote_kind()
            .is_some_and(|kind| self.retryable.contains(&kind))
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or `max_attempts` is reached. Sleeps on the current thread.
    pub fn execute<T, F>(&self, operation: F) -> Result<T, BridgeError>
    where
        F: FnMut() -> Result<T, BridgeError>,
    {
        self.execute_with(&ThreadSleeper, operation)
    }

    /// [`execute`](Self::execute) with an explicit sleeper.
    pub fn execute_with<T, F, S>(&self, sleeper: &S, mut operation: F) -> Result<T, BridgeError>
    where
        F: FnMut() -> Result<T, BridgeError>,
        S: Sleeper + ?Sized,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(err) if attempt < max_attempts && self.is_retryable(&err) => {
                    sleeper.sleep(self.delay_for_attempt(attempt));
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Run `operation` under `policy`. See [`RetryPolicy::execute`].
pub fn execute<T, F>(operation: F, policy: &RetryPolicy) -> Result<T, BridgeError>
where
    F: FnMut() -> Result<T, BridgeError>,
{
    policy.execute(operation)
}
