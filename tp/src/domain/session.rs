//! Trip request and per-run session state

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use super::{DailyWeather, GeoLocation, Itinerary};

/// What the traveller asked for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// solo, couple, family, friends...
    pub profile: String,
    /// low, medium, high
    pub budget: String,
    pub interests: Vec<String>,
    /// relaxed, normal, intense
    pub pace: String,
    /// Free-form constraints, empty when none
    pub constraints: String,
}

impl TripRequest {
    pub fn new(destination: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            destination: destination.into(),
            start_date,
            end_date,
            profile: "solo".to_string(),
            budget: "medium".to_string(),
            interests: Vec::new(),
            pace: "normal".to_string(),
            constraints: String::new(),
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    pub fn with_budget(mut self, budget: impl Into<String>) -> Self {
        self.budget = budget.into();
        self
    }

    pub fn with_interests(mut self, interests: Vec<String>) -> Self {
        self.interests = interests;
        self
    }

    pub fn with_pace(mut self, pace: impl Into<String>) -> Self {
        self.pace = pace.into();
        self
    }

    pub fn with_constraints(mut self, constraints: impl Into<String>) -> Self {
        self.constraints = constraints.into();
        self
    }

    /// Number of days covered, inclusive
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Constraints text, or "None"
    pub fn constraints_or_none(&self) -> &str {
        if self.constraints.trim().is_empty() {
            "None"
        } else {
            &self.constraints
        }
    }

    /// Human-readable request shown in the decision prompt
    pub fn summary(&self) -> String {
        format!(
            "Destination: {}\nDates: {} to {}\nProfile: {}\nBudget: {}\nInterests: {}\nPace: {}\nConstraints: {}",
            self.destination,
            self.start_date,
            self.end_date,
            self.profile,
            self.budget,
            self.interests.join(", "),
            self.pace,
            self.constraints_or_none()
        )
    }
}

/// Weather knowledge for the current run
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WeatherState {
    #[default]
    NotFetched,
    Available(Vec<DailyWeather>),
    /// Lookup returned nothing; generation runs in degraded mode
    Unavailable,
}

/// Facts collected during one planning run
///
/// Owned by the run and mutated only by the engine as actions complete.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub request: TripRequest,
    pub geocode: Option<GeoLocation>,
    pub weather: WeatherState,
    pub itinerary: Option<Itinerary>,
}

impl SessionContext {
    pub fn new(request: TripRequest) -> Self {
        debug!(destination = %request.destination, "SessionContext::new: called");
        Self {
            request,
            geocode: None,
            weather: WeatherState::NotFetched,
            itinerary: None,
        }
    }

    pub fn weather_unavailable(&self) -> bool {
        matches!(self.weather, WeatherState::Unavailable)
    }

    /// Forecast days, empty unless weather is available
    pub fn weather_series(&self) -> &[DailyWeather] {
        match &self.weather {
            WeatherState::Available(days) => days,
            _ => &[],
        }
    }

    /// Record a forecast; an empty series marks weather unavailable
    pub fn record_weather(&mut self, days: Vec<DailyWeather>) {
        self.weather = if days.is_empty() {
            WeatherState::Unavailable
        } else {
            WeatherState::Available(days)
        };
    }

    /// Everything known so far, as shown to the decision request
    pub fn collected_info(&self) -> Value {
        let request = &self.request;
        let mut info = json!({
            "destination": request.destination,
            "start_date": request.start_date.to_string(),
            "end_date": request.end_date.to_string(),
            "profile": request.profile,
            "budget": request.budget,
            "interests": request.interests,
            "pace": request.pace,
            "constraints": request.constraints,
        });

        if let Some(geocode) = &self.geocode {
            info["geocode"] = json!(geocode);
        }
        match &self.weather {
            WeatherState::NotFetched => {}
            WeatherState::Available(days) => info["weather"] = json!(days),
            WeatherState::Unavailable => {
                info["weather"] = json!([]);
                info["weather_unavailable"] = json!(true);
            }
        }
        if let Some(itinerary) = &self.itinerary {
            info["itinerary"] = json!(itinerary);
        }
        info
    }
}
