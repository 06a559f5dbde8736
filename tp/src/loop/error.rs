//! Planning run errors

use thiserror::Error;

use crate::repair::GenerationError;

/// Why a planning run stopped without an itinerary
#[derive(Debug, Clone, Error)]
pub enum RunError {
    #[error("Could not decide the next action: {0}")]
    Decision(GenerationError),

    #[error("Itinerary generation failed: {0}")]
    Generation(GenerationError),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Max iterations ({max}) reached without an itinerary")]
    MaxIterations { max: u32 },
}

impl RunError {
    pub fn prompt(err: impl std::fmt::Display) -> Self {
        RunError::Prompt(err.to_string())
    }
}
