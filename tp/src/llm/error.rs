//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during backend calls
///
/// Only [`LlmError::Connection`] is transient; the retry policy turns an
/// exhausted run of those into [`LlmError::RetriesExhausted`]. Everything else
/// is fatal for the planning run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LlmError {
    #[error(
        "Backend timed out after {}s. Generating {max_tokens} tokens can take a while; retry or plan fewer days",
        timeout.as_secs()
    )]
    Timeout { timeout: Duration, max_tokens: u32 },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error(
        "Network error after {attempts} attempts: {message}. Check your connection and retry; if it persists, plan fewer days"
    )]
    RetriesExhausted { attempts: u32, message: String },

    #[error("Rate limit exceeded (429); wait a few seconds and retry")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Authentication failed (401): {message}. Check your API key")]
    Authentication { message: String },

    #[error("HTTP error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// Classify a non-success HTTP status and its body
    pub fn from_status(status: u16, body: &str, retry_after: Option<Duration>) -> Self {
        match status {
            429 => LlmError::RateLimited { retry_after },
            401 => LlmError::Authentication {
                message: body.to_string(),
            },
            _ => LlmError::Api {
                status,
                message: body.to_string(),
            },
        }
    }

    /// Check if this error is worth retrying at the transport level
    pub fn is_transient(&self) -> bool {
        matches!(self, LlmError::Connection(_))
    }
}
