//! Render contexts for the prompt templates

use serde::Serialize;

/// Context for `decide.pmt`
#[derive(Debug, Clone, Serialize)]
pub struct DecideContext {
    /// Human-readable trip request
    pub user_request: String,
    /// Facts gathered so far, as pretty JSON
    pub collected_info: String,
    /// One line per past action, oldest first
    pub action_history: Vec<String>,
}

/// Context for `itinerary.pmt`
#[derive(Debug, Clone, Serialize)]
pub struct ItineraryContext {
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    pub profile: String,
    pub budget: String,
    pub interests: String,
    pub pace: String,
    pub constraints: String,
    /// False in degraded mode
    pub weather_available: bool,
    pub weather_lines: Vec<String>,
}

/// Context for `critic.pmt`
#[derive(Debug, Clone, Serialize)]
pub struct CriticContext {
    pub itinerary: String,
    pub weather_available: bool,
    pub weather_lines: Vec<String>,
    pub budget: String,
    pub pace: String,
}

/// Context for `corrector.pmt`
#[derive(Debug, Clone, Serialize)]
pub struct CorrectorContext {
    pub original_itinerary: String,
    pub issues: String,
    pub suggestions: String,
}

/// Context for `continuation.pmt`
#[derive(Debug, Clone, Serialize)]
pub struct ContinuationContext {
    /// End of the text received so far
    pub tail: String,
}
