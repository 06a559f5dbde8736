//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Agent persona, sent as the system instruction of every decision
pub const SYSTEM: &str = include_str!("../../prompts/system.pmt");

/// Next-action decision
pub const DECIDE: &str = include_str!("../../prompts/decide.pmt");

/// Itinerary generation
pub const ITINERARY: &str = include_str!("../../prompts/itinerary.pmt");

/// Itinerary critique
pub const CRITIC: &str = include_str!("../../prompts/critic.pmt");

/// Itinerary correction
pub const CORRECTOR: &str = include_str!("../../prompts/corrector.pmt");

/// Follow-up for a truncated reply
pub const CONTINUATION: &str = include_str!("../../prompts/continuation.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "system" => Some(SYSTEM),
        "decide" => Some(DECIDE),
        "itinerary" => Some(ITINERARY),
        "critic" => Some(CRITIC),
        "corrector" => Some(CORRECTOR),
        "continuation" => Some(CONTINUATION),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
