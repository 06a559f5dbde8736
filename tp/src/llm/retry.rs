//! Retry policy for transient transport failures
//!
//! The policy decides how many attempts a call gets and how long to wait
//! between them. Sleeping goes through [`Sleeper`] so tests can record the
//! waits instead of serving them.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::LlmError;

/// Waits between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Linear delay schedule: attempt k waits k * step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub step_ms: u64,
}

impl Backoff {
    pub fn linear(step_ms: u64) -> Self {
        Self { step_ms }
    }

    /// Delay to serve after the given (1-indexed) failed attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.step_ms.saturating_mul(u64::from(attempt)))
    }
}

/// How many times a transient failure is retried, and how long to wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Backoff::linear(3_000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self { max_attempts, backoff }
    }

    /// Run `op` until it succeeds, fails fatally, or attempts run out
    ///
    /// `op` receives the 1-indexed attempt number. Only errors for which
    /// [`LlmError::is_transient`] holds are retried.
    pub async fn run<T, F, Fut>(&self, sleeper: &dyn Sleeper, mut op: F) -> Result<T, LlmError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!(attempt, max_attempts, "RetryPolicy::run: attempt");
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    if attempt >= max_attempts {
                        debug!(attempt, "RetryPolicy::run: attempts exhausted");
                        return Err(LlmError::RetriesExhausted {
                            attempts: max_attempts,
                            message: e.to_string(),
                        });
                    }
                    let delay = self.backoff.delay_for(attempt);
                    warn!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "Transient backend error, retrying");
                    sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    debug!(attempt, error = %e, "RetryPolicy::run: fatal error");
                    return Err(e);
                }
            }
        }
    }
}
