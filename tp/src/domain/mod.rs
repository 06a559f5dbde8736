//! Domain types
//!
//! Trip request, per-run session state, the itinerary and critique schemas,
//! planning actions and the run result bundle.

mod action;
mod critique;
mod itinerary;
mod log;
mod result;
mod session;
mod weather;

pub use action::{Action, ActionRecord, Decision, UnknownAction, WeatherQuery};
pub use critique::{CritiqueResult, Issue};
#[cfg(test)]
pub use itinerary::fixtures;
pub use itinerary::{Activity, DayPlan, Itinerary};
pub use log::{LogSink, RunLog};
pub use result::{RunMetrics, RunResult};
pub use session::{SessionContext, TripRequest, WeatherState};
pub use weather::{DailyWeather, GeoLocation};
