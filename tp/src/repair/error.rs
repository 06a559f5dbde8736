//! Repair pipeline error types

use thiserror::Error;

use crate::llm::LlmError;

/// Default excerpt size for diagnostics
pub const EXCERPT_CHARS: usize = 2000;

/// Line/column of a syntax error in the repaired candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

/// Every repair stage failed
#[derive(Debug, Clone, Error)]
#[error("Could not parse structured reply{}: {reason}", location_suffix(.location))]
pub struct ParseFailure {
    /// Reply exactly as the backend sent it
    pub raw: String,
    /// Last candidate the pipeline tried to parse
    pub candidate: String,
    /// Position of the final syntax error, when the parser reported one
    pub location: Option<Location>,
    /// Parser message for the final attempt
    pub reason: String,
}

impl ParseFailure {
    pub fn new(raw: impl Into<String>, candidate: impl Into<String>, err: &serde_json::Error) -> Self {
        let location = (err.line() > 0).then(|| Location {
            line: err.line(),
            column: err.column(),
        });
        Self {
            raw: raw.into(),
            candidate: candidate.into(),
            location,
            reason: err.to_string(),
        }
    }

    /// Bounded view of the failing text: head, "...", tail
    pub fn excerpt(&self, max_chars: usize) -> String {
        let source = if self.candidate.trim().is_empty() {
            &self.raw
        } else {
            &self.candidate
        };
        let text = source.trim();
        let count = text.chars().count();
        if count <= max_chars {
            return text.to_string();
        }

        let half = max_chars / 2;
        let head: String = text.chars().take(half).collect();
        let tail: String = text.chars().skip(count - half).collect();
        format!("{}\n...\n{}", head, tail)
    }

    /// " (line L, column C)" or empty
    pub fn location(&self) -> String {
        location_suffix(&self.location)
    }
}

fn location_suffix(location: &Option<Location>) -> String {
    match location {
        Some(loc) => format!(" (line {}, column {})", loc.line, loc.column),
        None => String::new(),
    }
}

/// Parsed, but not the shape the caller asked for
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// Missing field or wrong type
    #[error("Schema mismatch: {0}")]
    Shape(String),

    /// Field present but its value is not allowed
    #[error("Invalid {field}: {message}")]
    Invalid { field: String, message: String },
}

impl SchemaError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        SchemaError::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure of one structured-generation request
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Parse(#[from] ParseFailure),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Prompt error: {0}")]
    Prompt(String),
}

impl GenerationError {
    /// Parse and schema failures may succeed on a fresh request
    pub fn is_retryable_locally(&self) -> bool {
        matches!(self, GenerationError::Parse(_) | GenerationError::Schema(_))
    }
}
