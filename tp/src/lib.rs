//! TripPlanner - LLM-driven travel itinerary planner
//!
//! A model picks one action per iteration (geocode the destination, fetch the
//! forecast, write the itinerary, finish); the engine keeps it on track with
//! override rules, repairs its JSON replies into typed values, and runs one
//! critique/correction pass over the result.
//!
//! # Modules
//!
//! - [`repair`] - JSON extraction and repair for model replies
//! - [`llm`] - Backend transport and retry policy
//! - [`r#loop`] - Planning engine, override rules, self-correction
//! - [`tools`] - Geocoding and forecast collaborators
//! - [`domain`] - Trip request, session state, itinerary schema
//! - [`prompts`] - Prompt templates
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod llm;
pub mod prompts;
pub mod repair;
pub mod tools;

// Note: 'loop' is a reserved keyword, so we use r#loop
#[path = "loop/mod.rs"]
pub mod r#loop;

pub use config::{Config, LlmConfig, OpenMeteoConfig};
pub use domain::{Itinerary, RunResult, SessionContext, TripRequest};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, create_client};
pub use r#loop::{PlannerConfig, PlannerEngine, RunError};
pub use repair::{GenerationError, ParseFailure, SchemaError, StructuredGenerator, repair_reply};
pub use tools::{Geocoder, OpenMeteoForecast, OpenMeteoGeocoder, WeatherProvider};
