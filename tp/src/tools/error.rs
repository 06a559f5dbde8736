//! Collaborator error types

use thiserror::Error;

/// Errors a lookup collaborator can report
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Lookup returned status {status}")]
    Status { status: u16 },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
