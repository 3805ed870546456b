use std::time::Duration;
use thiserror::Error;

/// Failure of a single backend call
#[derive(Debug, Error)]
pub enum ModelError {
    /// Network failure, timeout or 5xx
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rate limited by provider")]
    RateLimited { retry_after: Option<Duration> },

    /// Non-retryable provider rejection (bad request, bad credentials)
    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("provider response had no text content")]
    EmptyResponse,
}

impl ModelError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ModelError::Api { .. })
    }
}
