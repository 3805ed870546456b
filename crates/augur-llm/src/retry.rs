//! Generic retry executor driven by a [`RetryPolicy`]

use crate::error::ModelError;
use augur_core::RetryPolicy;
use rand::Rng;
use std::time::Duration;

/// Longest single wait between attempts, whether computed or suggested
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(300);

/// Why an attempt failed
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptError {
    /// Retry after the computed backoff
    Transient(String),
    /// Retry after the provider's suggested wait, if any
    RateLimited { retry_after: Option<Duration> },
    /// Give up immediately
    Permanent(String),
}

impl From<ModelError> for AttemptError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::RateLimited { retry_after } => AttemptError::RateLimited { retry_after },
            err if err.is_retryable() => AttemptError::Transient(err.to_string()),
            err => AttemptError::Permanent(err.to_string()),
        }
    }
}

/// Exponential backoff state
#[derive(Debug, Clone)]
pub struct Backoff {
    current_secs: f64,
    factor: f64,
    jitter_secs: f64,
}

impl Backoff {
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            current_secs: policy.base_delay_secs.max(0.0),
            factor: policy.backoff_factor,
            jitter_secs: policy.jitter_secs.max(0.0),
        }
    }

    /// Delay before the next attempt. A provider hint replaces the computed
    /// wait, but the schedule still advances.
    pub fn next_delay(&mut self, hint: Option<Duration>) -> Duration {
        let jitter = if self.jitter_secs > 0.0 {
            rand::rng().random_range(-self.jitter_secs..=self.jitter_secs)
        } else {
            0.0
        };
        self.next_delay_with(hint, jitter)
    }

    fn next_delay_with(&mut self, hint: Option<Duration>, jitter: f64) -> Duration {
        let computed = (self.current_secs + jitter).max(0.0);
        self.current_secs = (self.current_secs * self.factor).min(MAX_RETRY_DELAY.as_secs_f64());
        let delay = hint.unwrap_or_else(|| {
            Duration::try_from_secs_f64(computed).unwrap_or(MAX_RETRY_DELAY)
        });
        delay.min(MAX_RETRY_DELAY)
    }
}

/// Run `op` until it succeeds, fails permanently, or the policy's attempts
/// run out. `op` receives the 1-based attempt number.
pub fn retry<T, F>(policy: &RetryPolicy, label: &str, mut op: F) -> Option<T>
where
    F: FnMut(u32) -> Result<T, AttemptError>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut backoff = Backoff::new(policy);

    for attempt in 1..=max_attempts {
        let hint = match op(attempt) {
            Ok(value) => return Some(value),
            Err(AttemptError::Permanent(reason)) => {
                tracing::warn!(label, attempt, %reason, "permanent failure, not retrying");
                return None;
            }
            Err(AttemptError::RateLimited { retry_after }) => {
                tracing::warn!(label, attempt, ?retry_after, "rate limited");
                retry_after
            }
            Err(AttemptError::Transient(reason)) => {
                tracing::debug!(label, attempt, %reason, "attempt failed");
                None
            }
        };

        if attempt == max_attempts {
            break;
        }
        let delay = backoff.next_delay(hint);
        tracing::debug!(label, attempt, delay_ms = delay.as_millis() as u64, "retrying");
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }

    tracing::warn!(label, attempts = max_attempts, "giving up after retries");
    None
}
