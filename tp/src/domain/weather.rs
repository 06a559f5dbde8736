//! Geocoding and forecast data

use serde::{Deserialize, Serialize};

/// A resolved place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub name: String,
    #[serde(default)]
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    /// Region or state
    #[serde(default, alias = "admin1")]
    pub admin_region: Option<String>,
}

/// Forecast for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyWeather {
    /// YYYY-MM-DD
    pub date: String,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    /// Percent, 0 when the provider omitted it
    pub precipitation_probability: f64,
    /// km/h, 0 when the provider omitted it
    pub wind_speed: f64,
    pub description: String,
}

impl DailyWeather {
    /// Line shown to the planner, e.g. "2026-06-01: 12°C-21°C, rain 30%, Temperate - Dry"
    pub fn plan_line(&self) -> String {
        format!(
            "{}: {}°C-{}°C, rain {}%, {}",
            self.date,
            fmt_temp(self.temp_min),
            fmt_temp(self.temp_max),
            self.precipitation_probability,
            self.description
        )
    }

    /// Line shown to the critic, e.g. "2026-06-01: Temperate - Dry, rain 30%"
    pub fn critic_line(&self) -> String {
        format!(
            "{}: {}, rain {}%",
            self.date, self.description, self.precipitation_probability
        )
    }
}

fn fmt_temp(value: Option<f64>) -> String {
    value.map(|t| t.to_string()).unwrap_or_else(|| "?".to_string())
}
