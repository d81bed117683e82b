//! Persistence error classification and retry
//!
//! Each write attempt ends in success, a retryable failure or a terminal
//! failure. Only [`ErrorClass::Transient`] failures are retried, with a
//! linearly growing delay; everything else returns immediately.

use crate::config::RetryConfig;
use crate::core::executor::RecordOutcome;
use crate::domain::{ErrorClass, StoreError, StoreResult};
use std::future::Future;
use std::time::Duration;

/// Bounded linear-backoff retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: usize,
    /// Delay before retry `n` is `n * base_delay`
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(base_delay_ms),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.base_delay_ms)
    }

    /// Delay before the given retry (1-based)
    pub fn delay_for(&self, retry: usize) -> Duration {
        self.base_delay.saturating_mul(retry as u32)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Final state of one guarded write
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome<T> {
    /// The write succeeded
    Written(T),
    /// A uniqueness constraint fired; the next upsert reconciles the row
    AlreadyExists(StoreError),
    /// Not found, invalid input or unclassified; retrying cannot help
    Rejected(StoreError),
    /// Transient failures outlasted the retry budget
    Exhausted(StoreError),
}

impl<T> WriteOutcome<T> {
    /// How the write counts toward the seeder's tally
    pub fn record_outcome(&self) -> RecordOutcome {
        match self {
            WriteOutcome::Written(_) => RecordOutcome::Created,
            WriteOutcome::AlreadyExists(_) => RecordOutcome::Skipped,
            WriteOutcome::Rejected(_) | WriteOutcome::Exhausted(_) => RecordOutcome::Error,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Written(_))
    }
}

/// Runs `op` under the retry policy
///
/// `label` identifies the record in every log line, e.g. `"programs:1042"`.
/// Failures never propagate; they are folded into the returned outcome.
pub async fn execute_write<T, F, Fut>(label: &str, policy: &RetryPolicy, mut op: F) -> WriteOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let mut retries = 0;

    loop {
        let error = match op().await {
            Ok(value) => return WriteOutcome::Written(value),
            Err(e) => e,
        };

        match error.class() {
            ErrorClass::Transient if retries < policy.max_retries => {
                retries += 1;
                let delay = policy.delay_for(retries);
                crate::log_retry_attempt!(
                    label,
                    retries,
                    policy.max_retries,
                    delay.as_millis() as u64,
                    error
                );
                tokio::time::sleep(delay).await;
            }
            ErrorClass::Transient => {
                tracing::error!(
                    context = %label,
                    retries = retries,
                    error = %error,
                    "Write failed after exhausting retries"
                );
                return WriteOutcome::Exhausted(error);
            }
            ErrorClass::Conflict => {
                tracing::warn!(
                    context = %label,
                    error = %error,
                    "Uniqueness violation treated as existing row"
                );
                return WriteOutcome::AlreadyExists(error);
            }
            ErrorClass::NotFound | ErrorClass::Validation | ErrorClass::Other => {
                tracing::error!(
                    context = %label,
                    class = ?error.class(),
                    error = %error,
                    "Write rejected"
                );
                return WriteOutcome::Rejected(error);
            }
        }
    }
}
