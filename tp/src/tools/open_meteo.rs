//! Open-Meteo geocoding and forecast clients
//!
//! Both endpoints are keyless. The forecast client never fails: any HTTP or
//! decoding problem yields an empty series, which the engine treats as
//! degraded mode.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{Geocoder, ToolError, WeatherProvider};
use crate::config::OpenMeteoConfig;
use crate::domain::{DailyWeather, GeoLocation};

const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,precipitation_probability_max,wind_speed_10m_max";

fn http_client(timeout: Duration) -> Result<Client, ToolError> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent("tripplanner/0.1")
        .build()?)
}

/// Geocoding API client
pub struct OpenMeteoGeocoder {
    url: String,
    language: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    #[serde(default)]
    country: Option<String>,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    admin1: Option<String>,
}

impl From<GeocodingResult> for GeoLocation {
    fn from(r: GeocodingResult) -> Self {
        GeoLocation {
            name: r.name,
            country: r.country.unwrap_or_default(),
            lat: r.latitude,
            lon: r.longitude,
            admin_region: r.admin1,
        }
    }
}

impl OpenMeteoGeocoder {
    pub fn from_config(config: &OpenMeteoConfig) -> Result<Self, ToolError> {
        debug!(url = %config.geocoding_url, "OpenMeteoGeocoder::from_config: called");
        Ok(Self {
            url: config.geocoding_url.clone(),
            language: config.language.clone(),
            http: http_client(Duration::from_millis(config.timeout_ms))?,
        })
    }
}

#[async_trait]
impl Geocoder for OpenMeteoGeocoder {
    async fn geocode(&self, city: &str) -> Result<Option<GeoLocation>, ToolError> {
        debug!(%city, "OpenMeteoGeocoder::geocode: called");
        if city.trim().is_empty() {
            return Err(ToolError::InvalidArgument("city is empty".to_string()));
        }

        let response = self
            .http
            .get(&self.url)
            .query(&[
                ("name", city),
                ("count", "1"),
                ("language", self.language.as_str()),
                ("format", "json"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "OpenMeteoGeocoder::geocode: error status");
            return Err(ToolError::Status {
                status: status.as_u16(),
            });
        }

        let body: GeocodingResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Malformed(e.to_string()))?;
        let found = body.results.into_iter().next().map(GeoLocation::from);
        debug!(found = found.is_some(), "OpenMeteoGeocoder::geocode: done");
        Ok(found)
    }
}

/// Daily forecast API client
pub struct OpenMeteoForecast {
    url: String,
    http: Client,
}

impl OpenMeteoForecast {
    pub fn from_config(config: &OpenMeteoConfig) -> Result<Self, ToolError> {
        debug!(url = %config.forecast_url, "OpenMeteoForecast::from_config: called");
        Ok(Self {
            url: config.forecast_url.clone(),
            http: http_client(Duration::from_millis(config.timeout_ms))?,
        })
    }

    async fn fetch(&self, lat: f64, lon: f64, start_date: &str, end_date: &str) -> Result<Value, ToolError> {
        let (lat, lon) = (lat.to_string(), lon.to_string());
        let response = self
            .http
            .get(&self.url)
            .query(&[
                ("latitude", lat.as_str()),
                ("longitude", lon.as_str()),
                ("daily", DAILY_FIELDS),
                ("start_date", start_date),
                ("end_date", end_date),
                ("timezone", "auto"),
            ])
            .send()
            .await?;

        // 400 is what Open-Meteo answers for dates outside the forecast horizon
        let status = response.status();
        if status.as_u16() != 200 {
            return Err(ToolError::Status {
                status: status.as_u16(),
            });
        }

        response.json().await.map_err(|e| ToolError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoForecast {
    async fn forecast(&self, lat: f64, lon: f64, start_date: &str, end_date: &str) -> Vec<DailyWeather> {
        debug!(lat, lon, %start_date, %end_date, "OpenMeteoForecast::forecast: called");
        match self.fetch(lat, lon, start_date, end_date).await {
            Ok(body) => parse_forecast(&body),
            Err(e) => {
                warn!(error = %e, "Forecast lookup failed");
                Vec::new()
            }
        }
    }
}

/// Turn a forecast response body into daily entries
///
/// Days come from `daily.time`. Missing temperatures stay unknown; missing
/// precipitation or wind count as 0.
pub fn parse_forecast(body: &Value) -> Vec<DailyWeather> {
    let daily = &body["daily"];
    let Some(dates) = daily["time"].as_array() else {
        debug!("parse_forecast: no daily.time");
        return Vec::new();
    };

    let at = |field: &str, i: usize| daily[field].get(i).and_then(Value::as_f64);

    dates
        .iter()
        .enumerate()
        .filter_map(|(i, date)| {
            let date = date.as_str()?;
            let temp_max = at("temperature_2m_max", i);
            let temp_min = at("temperature_2m_min", i);
            let precipitation_probability = at("precipitation_probability_max", i).unwrap_or(0.0);
            let wind_speed = at("wind_speed_10m_max", i).unwrap_or(0.0);
            Some(DailyWeather {
                date: date.to_string(),
                temp_min,
                temp_max,
                precipitation_probability,
                wind_speed,
                description: describe_weather(temp_max, precipitation_probability, wind_speed),
            })
        })
        .collect()
}

/// Short text summary, e.g. "Hot - Risk of rain - Windy"
pub fn describe_weather(temp_max: Option<f64>, precipitation_probability: f64, wind_speed: f64) -> String {
    let mut parts = Vec::with_capacity(3);

    parts.push(match temp_max {
        Some(t) if t > 25.0 => "Hot",
        Some(t) if t < 10.0 => "Cold",
        _ => "Temperate",
    });

    parts.push(if precipitation_probability > 70.0 {
        "Rain likely"
    } else if precipitation_probability > 40.0 {
        "Risk of rain"
    } else {
        "Dry"
    });

    if wind_speed > 30.0 {
        parts.push("Windy");
    }

    parts.join(" - ")
}
