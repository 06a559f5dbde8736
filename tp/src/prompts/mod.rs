//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for every backend request.
//!
//! Template loading chain:
//! 1. `.tripplanner/prompts/{name}.pmt` (user override)
//! 2. `prompts/{name}.pmt` (repo default)
//! 3. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

mod context;
pub mod embedded;
mod loader;

pub use context::{ContinuationContext, CorrectorContext, CriticContext, DecideContext, ItineraryContext};
pub use loader::PromptLoader;
