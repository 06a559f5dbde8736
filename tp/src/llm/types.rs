//! LLM request/response types
//!
//! One request is one independent chat completion: an optional system
//! instruction plus a single user prompt. No conversation state is kept.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default sampling temperature when the caller does not choose one
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// A completion request - everything needed for one backend call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// User prompt
    pub prompt: String,

    /// Optional system instruction
    pub system: Option<String>,

    /// Sampling temperature, clamped to [0, 1] when the body is built
    pub temperature: f32,

    /// Ask the backend for a JSON object reply (a hint only)
    pub json_mode: bool,

    /// Max output tokens
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Create a plain-text request with default sampling settings
    pub fn new(prompt: impl Into<String>) -> Self {
        debug!("CompletionRequest::new: called");
        Self {
            prompt: prompt.into(),
            system: None,
            temperature: DEFAULT_TEMPERATURE,
            json_mode: false,
            max_tokens: 2000,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Response from a completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    /// Raw reply text, trimmed
    pub content: String,

    /// Why the model stopped
    pub stop_reason: StopReason,

    /// Token usage for diagnostics
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Build a response that ended normally (used by tests and fakes)
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    Other,
}

impl StopReason {
    /// Parse from a chat-completions `finish_reason` string
    pub fn from_finish_reason(reason: Option<&str>) -> Self {
        debug!(?reason, "StopReason::from_finish_reason: called");
        match reason {
            Some("stop") | None => StopReason::EndTurn,
            Some("length") | Some("model_length") => StopReason::MaxTokens,
            Some(_) => StopReason::Other,
        }
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
