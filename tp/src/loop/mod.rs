//! Planning loop
//!
//! The engine asks the backend for one action per iteration, overrides
//! proposals that would repeat work, and on PLAN generates, critiques and
//! corrects the itinerary. Every backend call is awaited in turn; a run never
//! has two requests in flight.

mod config;
mod correction;
mod engine;
mod error;
mod generation;
pub mod overrides;

pub use config::{PlannerConfig, Temperatures};
pub use correction::SelfCorrector;
pub use engine::PlannerEngine;
pub use error::RunError;
pub use generation::ItineraryGenerator;
pub use overrides::{Resolution, resolve};
