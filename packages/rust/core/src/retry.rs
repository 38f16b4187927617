//! Retry policy for source fetches.
//!
//! A policy is a value handed to the sync loop; nothing here is hardcoded
//! beyond the defaults.

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use notesync_shared::{BackoffKind, NoteSyncError, Result, RetrySettings};

/// How many times to try, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Wait after the first failed attempt.
    pub delay: Duration,
    pub backoff: BackoffKind,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            delay: Duration::from_millis(settings.delay_ms),
            backoff: settings.backoff,
        }
    }
}

impl RetryPolicy {
    /// Same delay before every retry.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            backoff: BackoffKind::Fixed,
        }
    }

    /// Delay doubles after each failure.
    pub fn exponential(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            backoff: BackoffKind::Exponential,
        }
    }

    /// Effective attempt budget.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            BackoffKind::Fixed => self.delay,
            BackoffKind::Exponential => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                self.delay.saturating_mul(factor)
            }
        }
    }

    /// Run `op` until it succeeds or the budget is spent.
    ///
    /// `op` receives the 1-based attempt number. On exhaustion the last error
    /// is wrapped in [`NoteSyncError::RetryExhausted`].
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.attempts();
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    let wait = self.delay_after(attempt);
                    warn!(
                        attempt,
                        max_attempts = attempts,
                        retry_in_ms = wait.as_millis() as u64,
                        error = %e,
                        "{what} failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(attempts, error = %e, "{what} failed, giving up");
                    return Err(NoteSyncError::RetryExhausted {
                        attempts,
                        last_error: Box::new(e),
                    });
                }
            }
        }
    }
}
