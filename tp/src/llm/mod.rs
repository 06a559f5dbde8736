//! LLM client module for the trip planner
//!
//! Provides the backend transport, its retry policy, and request/response types.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod mistral;
pub mod retry;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use mistral::MistralClient;
pub use retry::{Backoff, RetryPolicy, Sleeper, TokioSleeper};
pub use types::{CompletionRequest, CompletionResponse, DEFAULT_TEMPERATURE, StopReason, TokenUsage};

use crate::config::LlmConfig;

/// Create an LLM client based on the provider specified in config
///
/// Only "mistral" is supported.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "mistral" => {
            debug!("create_client: creating Mistral client");
            Ok(Arc::new(MistralClient::from_config(config)?))
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::Config(format!(
                "Unknown LLM provider: '{}'. Supported: mistral",
                other
            )))
        }
    }
}
