//! Itinerary schema
//!
//! Wire form of the plan the model produces. Unknown fields are ignored;
//! `alternatives`, `justifications` and `checklist` default to empty.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::repair::{Schema, SchemaError};

/// Scalars as models tend to write them: numbers or booleans, sometimes quoted
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseScalar {
    Bool(bool),
    Int(u64),
    Float(f64),
    Text(String),
}

/// Accept `1`, `1.0` and `"1"` for a whole number
fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = match LooseScalar::deserialize(deserializer)? {
        LooseScalar::Int(n) => Some(n),
        LooseScalar::Float(f) => whole(f),
        LooseScalar::Text(s) => {
            let s = s.trim();
            s.parse::<u64>().ok().or_else(|| s.parse::<f64>().ok().and_then(whole))
        }
        LooseScalar::Bool(_) => None,
    };
    value
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| D::Error::custom("expected a non-negative whole number"))
}

fn whole(f: f64) -> Option<u64> {
    (f.fract() == 0.0 && (0.0..=u64::MAX as f64).contains(&f)).then_some(f as u64)
}

/// Accept `true`, `"true"`, `"yes"`, `1` and their negatives
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = match LooseScalar::deserialize(deserializer)? {
        LooseScalar::Bool(b) => Some(b),
        LooseScalar::Int(0) => Some(false),
        LooseScalar::Int(1) => Some(true),
        LooseScalar::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "on" | "1" => Some(true),
            "false" | "no" | "n" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    };
    value.ok_or_else(|| D::Error::custom("expected a boolean"))
}

/// One activity in a day slot or in the alternatives list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    pub location: String,
    /// e.g. "2h", "3h30"
    pub duration: String,
    /// e.g. "15-20 EUR", "Free"
    pub cost_estimate: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub indoor: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Activity {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        for (field, value) in [
            ("name", &self.name),
            ("location", &self.location),
            ("duration", &self.duration),
            ("cost_estimate", &self.cost_estimate),
        ] {
            if value.trim().is_empty() {
                return Err(SchemaError::invalid(format!("{}.{}", path, field), "must not be empty"));
            }
        }
        Ok(())
    }
}

/// Plan for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    #[serde(deserialize_with = "lenient_u32")]
    pub day_number: u32,
    pub date: String,
    pub morning: Activity,
    pub afternoon: Activity,
    pub evening: Activity,
    /// Bad-weather (or good-weather) swaps
    #[serde(default)]
    pub alternatives: Vec<Activity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DayPlan {
    /// The three mandatory slots, in order
    pub fn slots(&self) -> [(&'static str, &Activity); 3] {
        [
            ("morning", &self.morning),
            ("afternoon", &self.afternoon),
            ("evening", &self.evening),
        ]
    }
}

/// A complete itinerary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub daily_plans: Vec<DayPlan>,
    #[serde(default)]
    pub justifications: Vec<String>,
    #[serde(default)]
    pub checklist: Vec<String>,
}

impl Itinerary {
    pub fn day_count(&self) -> usize {
        self.daily_plans.len()
    }
}

impl Schema for Itinerary {
    fn validate(&self) -> Result<(), SchemaError> {
        debug!(days = self.daily_plans.len(), "Itinerary::validate: called");
        for (i, day) in self.daily_plans.iter().enumerate() {
            if day.date.trim().is_empty() {
                return Err(SchemaError::invalid(format!("daily_plans[{}].date", i), "must not be empty"));
            }
            for (slot, activity) in day.slots() {
                activity.validate(&format!("daily_plans[{}].{}", i, slot))?;
            }
            for (j, alternative) in day.alternatives.iter().enumerate() {
                alternative.validate(&format!("daily_plans[{}].alternatives[{}]", i, j))?;
            }
        }
        Ok(())
    }
}
