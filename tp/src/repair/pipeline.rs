//! Structured-reply repair pipeline
//!
//! Stages run in order and stop at the first one that parses:
//!
//! 1. strip code fences
//! 2. parse directly
//! 3. parse the first balanced `{...}` object
//! 4. parse first-`{`-to-last-`}` (only when no balanced object exists)
//! 5. ask the model to continue a truncated reply (online only)
//! 6. escape control characters in strings, then drop trailing commas
//!
//! When all of them fail the caller gets a [`ParseFailure`].

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::fixes::{escape_control_chars_in_strings, remove_trailing_commas};
use super::scan::{extract_loose_object, find_first_complete_object, is_likely_truncated, strip_code_fences};
use super::{GenerationError, ParseFailure, Schema};
use crate::llm::{CompletionRequest, LlmClient, StopReason};
use crate::prompts::{ContinuationContext, PromptLoader};

/// Characters of accumulated text shown to the model in a continuation request
pub const CONTINUATION_TAIL_CHARS: usize = 1000;

const CONTINUATION_MIN_TOKENS: u32 = 500;
const CONTINUATION_MAX_TOKENS: u32 = 2000;

/// Result of the stages that need no backend call
#[derive(Debug)]
pub enum FirstPass {
    Parsed(Value),
    Pending(PendingRepair),
}

/// A reply that did not parse in the first pass
#[derive(Debug)]
pub struct PendingRepair {
    raw: String,
    combined: String,
    complete: Option<String>,
    after_continuation: Option<String>,
}

/// Run fence stripping, direct parse, balanced extraction and loose extraction
pub fn first_pass(raw: &str) -> FirstPass {
    let stripped = strip_code_fences(raw);

    if let Ok(value) = serde_json::from_str::<Value>(stripped) {
        debug!("first_pass: direct parse");
        return FirstPass::Parsed(value);
    }

    let complete = find_first_complete_object(stripped);
    match complete {
        Some(object) => {
            if let Ok(value) = serde_json::from_str::<Value>(object) {
                debug!("first_pass: balanced object");
                return FirstPass::Parsed(value);
            }
        }
        None => {
            if let Some(loose) = extract_loose_object(stripped)
                && let Ok(value) = serde_json::from_str::<Value>(loose)
            {
                debug!("first_pass: loose object");
                return FirstPass::Parsed(value);
            }
        }
    }

    debug!(balanced = complete.is_some(), "first_pass: needs repair");
    FirstPass::Pending(PendingRepair {
        raw: raw.to_string(),
        combined: stripped.to_string(),
        complete: complete.map(str::to_string),
        after_continuation: None,
    })
}

impl PendingRepair {
    /// The reply opened an object and never closed it
    pub fn needs_continuation(&self) -> bool {
        self.complete.is_none() && self.after_continuation.is_none() && is_likely_truncated(&self.combined)
    }

    /// Last `max_chars` characters of the accumulated text
    pub fn tail(&self, max_chars: usize) -> &str {
        let count = self.combined.chars().count();
        if count <= max_chars {
            return &self.combined;
        }
        let start = self
            .combined
            .char_indices()
            .nth(count - max_chars)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        &self.combined[start..]
    }

    /// Append a continuation reply and retry balanced extraction
    pub fn absorb_continuation(&mut self, reply: &str) -> Option<Value> {
        self.combined.push_str(strip_code_fences(reply));

        let object = find_first_complete_object(&self.combined)?.to_string();
        let parsed = serde_json::from_str::<Value>(&object);
        debug!(ok = parsed.is_ok(), "absorb_continuation: balanced object after continuation");
        self.after_continuation = Some(object);
        parsed.ok()
    }

    /// Apply the syntax repairs to the best candidate, or fail
    pub fn finish(self) -> Result<Value, ParseFailure> {
        let candidate = self
            .after_continuation
            .as_deref()
            .or(self.complete.as_deref())
            .or_else(|| extract_loose_object(&self.combined))
            .unwrap_or(self.combined.as_str());

        let escaped = escape_control_chars_in_strings(candidate);
        if let Ok(value) = serde_json::from_str::<Value>(&escaped) {
            debug!("finish: parsed after escaping control characters");
            return Ok(value);
        }

        let repaired = remove_trailing_commas(&escaped);
        match serde_json::from_str::<Value>(&repaired) {
            Ok(value) => {
                debug!("finish: parsed after removing trailing commas");
                Ok(value)
            }
            Err(e) => {
                debug!(error = %e, "finish: all repairs failed");
                Err(ParseFailure::new(self.raw, repaired, &e))
            }
        }
    }
}

/// Repair a saved reply without talking to the backend
pub fn repair_reply(raw: &str) -> Result<Value, ParseFailure> {
    match first_pass(raw) {
        FirstPass::Parsed(value) => Ok(value),
        FirstPass::Pending(pending) => pending.finish(),
    }
}

/// Requests structured replies and runs them through the pipeline
pub struct StructuredGenerator {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
}

impl StructuredGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>) -> Self {
        Self { llm, prompts }
    }

    /// Send `request` in JSON mode and repair the reply into a value
    ///
    /// A truncated reply gets up to `continuations` follow-up requests.
    pub async fn generate_value(&self, request: CompletionRequest, continuations: u32) -> Result<Value, GenerationError> {
        debug!(max_tokens = request.max_tokens, continuations, "generate_value: called");
        let system = request.system.clone();
        let max_tokens = request.max_tokens;

        let response = self.llm.complete(request.with_json_mode(true)).await?;
        if response.stop_reason == StopReason::MaxTokens {
            warn!(max_tokens, "Reply hit the token limit, it may be truncated");
        }

        let mut pending = match first_pass(&response.content) {
            FirstPass::Parsed(value) => return Ok(value),
            FirstPass::Pending(pending) => pending,
        };

        if continuations > 0 && pending.needs_continuation() {
            for round in 1..=continuations {
                info!(round, continuations, "Reply looks truncated, requesting continuation");
                let context = ContinuationContext {
                    tail: pending.tail(CONTINUATION_TAIL_CHARS).to_string(),
                };
                let prompt = self
                    .prompts
                    .render("continuation", &context)
                    .map_err(|e| GenerationError::Prompt(e.to_string()))?;

                let mut continuation = CompletionRequest::new(prompt)
                    .with_temperature(0.0)
                    .with_json_mode(false)
                    .with_max_tokens(max_tokens.clamp(CONTINUATION_MIN_TOKENS, CONTINUATION_MAX_TOKENS));
                if let Some(system) = &system {
                    continuation = continuation.with_system(system.clone());
                }

                let reply = self.llm.complete(continuation).await?;
                if let Some(value) = pending.absorb_continuation(&reply.content) {
                    return Ok(value);
                }
                if !pending.needs_continuation() {
                    debug!(round, "generate_value: balanced after continuation but unparseable");
                    break;
                }
            }
        }

        Ok(pending.finish()?)
    }

    /// Like [`generate_value`](Self::generate_value), then check the shape
    pub async fn generate<T: Schema>(&self, request: CompletionRequest, continuations: u32) -> Result<T, GenerationError> {
        let value = self.generate_value(request, continuations).await?;
        Ok(T::from_value(value)?)
    }
}
