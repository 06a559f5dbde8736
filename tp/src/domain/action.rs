//! Planning decisions and the closed action set

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::repair::{Schema, SchemaError};

/// Reply to a decision request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(default)]
    pub thought: String,
    pub action: String,
    #[serde(default)]
    pub action_input: Value,
}

impl Schema for Decision {
    fn validate(&self) -> Result<(), SchemaError> {
        if self.action.trim().is_empty() {
            return Err(SchemaError::invalid("action", "must not be empty"));
        }
        Ok(())
    }
}

/// Parameters of a WEATHER action; any may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl WeatherQuery {
    /// All four parameters, when present
    pub fn complete(&self) -> Option<(f64, f64, &str, &str)> {
        match (self.lat, self.lon, self.start_date.as_deref(), self.end_date.as_deref()) {
            (Some(lat), Some(lon), Some(start), Some(end)) if !start.is_empty() && !end.is_empty() => {
                Some((lat, lon, start, end))
            }
            _ => None,
        }
    }
}

/// The action the engine will execute
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Geocode { city: Option<String> },
    Weather(WeatherQuery),
    Plan,
    Finish,
}

/// Action name the engine does not know
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Unknown action '{0}'")]
pub struct UnknownAction(pub String);

impl Action {
    /// Decode a decision into an action
    ///
    /// Names are matched case-insensitively. Inputs that are not objects are
    /// treated as empty.
    pub fn from_decision(decision: &Decision) -> Result<Self, UnknownAction> {
        debug!(action = %decision.action, "Action::from_decision: called");
        let input = &decision.action_input;
        match decision.action.trim().to_ascii_uppercase().as_str() {
            "GEOCODE" => Ok(Action::Geocode {
                city: input
                    .get("city")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string),
            }),
            "WEATHER" => Ok(Action::Weather(WeatherQuery {
                lat: input.get("lat").and_then(number),
                lon: input.get("lon").and_then(number),
                start_date: input.get("start_date").and_then(Value::as_str).map(str::to_string),
                end_date: input.get("end_date").and_then(Value::as_str).map(str::to_string),
            })),
            "PLAN" => Ok(Action::Plan),
            "FINISH" => Ok(Action::Finish),
            _ => Err(UnknownAction(decision.action.clone())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Geocode { .. } => "GEOCODE",
            Action::Weather(_) => "WEATHER",
            Action::Plan => "PLAN",
            Action::Finish => "FINISH",
        }
    }

    /// Input as shown in logs and history
    pub fn input(&self) -> Value {
        match self {
            Action::Geocode { city } => {
                let mut map = Map::new();
                if let Some(city) = city {
                    map.insert("city".to_string(), Value::String(city.clone()));
                }
                Value::Object(map)
            }
            Action::Weather(query) => serde_json::to_value(query).unwrap_or_default(),
            Action::Plan | Action::Finish => Value::Object(Map::new()),
        }
    }
}

// Models sometimes send coordinates as strings
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.input())
    }
}

/// One entry of the action history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    /// 1-indexed
    pub iteration: u32,
    pub action: String,
    pub input: Value,
    /// Truncated to `SUMMARY_LEN` chars
    pub summary: String,
}

impl ActionRecord {
    pub const SUMMARY_LEN: usize = 200;

    pub fn new(iteration: u32, action: impl Into<String>, input: Value, summary: &str) -> Self {
        let action = action.into();
        debug!(iteration, %action, "ActionRecord::new: called");
        Self {
            iteration,
            action,
            input,
            summary: summary.chars().take(Self::SUMMARY_LEN).collect(),
        }
    }
}

impl fmt::Display for ActionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.action, self.input, self.summary)
    }
}
