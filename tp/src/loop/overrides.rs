//! Override rules
//!
//! Replace a proposed action that would repeat work or loop on a failure.
//! Pure function of the session and the proposal.

use tracing::debug;

use crate::domain::{Action, SessionContext, WeatherQuery, WeatherState};

/// The action to execute, and why it differs from the proposal
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub action: Action,
    /// Set when a rule replaced the proposal
    pub overridden: Option<&'static str>,
}

impl Resolution {
    fn keep(action: Action) -> Self {
        Self {
            action,
            overridden: None,
        }
    }

    fn replace(action: Action, reason: &'static str) -> Self {
        Self {
            action,
            overridden: Some(reason),
        }
    }
}

pub const GEOCODE_DONE: &str = "Geocoding already done, moving on to WEATHER or PLAN";
pub const WEATHER_DONE: &str = "Weather already fetched, going straight to PLAN";
pub const WEATHER_UNAVAILABLE: &str = "Weather already unavailable, going straight to PLAN (degraded mode)";

/// Apply the override rules to a proposed action
pub fn resolve(proposed: Action, ctx: &SessionContext) -> Resolution {
    debug!(action = proposed.name(), "resolve: called");
    match (&proposed, &ctx.geocode, &ctx.weather) {
        (Action::Geocode { .. }, Some(geo), WeatherState::NotFetched) => {
            debug!("resolve: geocode known, weather not fetched");
            let query = WeatherQuery {
                lat: Some(geo.lat),
                lon: Some(geo.lon),
                start_date: Some(ctx.request.start_date.to_string()),
                end_date: Some(ctx.request.end_date.to_string()),
            };
            Resolution::replace(Action::Weather(query), GEOCODE_DONE)
        }
        (Action::Geocode { .. }, Some(_), _) => {
            debug!("resolve: geocode known, weather fetched");
            Resolution::replace(Action::Plan, GEOCODE_DONE)
        }
        (Action::Weather(_), _, WeatherState::Available(_)) => Resolution::replace(Action::Plan, WEATHER_DONE),
        (Action::Weather(_), _, WeatherState::Unavailable) => Resolution::replace(Action::Plan, WEATHER_UNAVAILABLE),
        _ => Resolution::keep(proposed),
    }
}
