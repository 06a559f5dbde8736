//! Lookup collaborators
//!
//! The engine resolves cities and fetches forecasts through these traits.
//! Open-Meteo implementations live in [`open_meteo`].

mod error;
pub mod open_meteo;

use async_trait::async_trait;

pub use error::ToolError;
pub use open_meteo::{OpenMeteoForecast, OpenMeteoGeocoder, describe_weather, parse_forecast};

use crate::domain::{DailyWeather, GeoLocation};

/// City name to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the place is unknown
    async fn geocode(&self, city: &str) -> Result<Option<GeoLocation>, ToolError>;
}

/// Daily forecast for a place and date range
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Date-ordered days, empty on any failure
    async fn forecast(&self, lat: f64, lon: f64, start_date: &str, end_date: &str) -> Vec<DailyWeather>;
}

#[cfg(test)]
pub mod fake {
    //! In-memory collaborators for engine tests

    use std::sync::Mutex;

    use super::*;

    /// Geocoder that answers from a fixed result
    pub struct FakeGeocoder {
        result: Option<GeoLocation>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeGeocoder {
        pub fn found(name: &str, country: &str, lat: f64, lon: f64) -> Self {
            Self {
                result: Some(GeoLocation {
                    name: name.to_string(),
                    country: country.to_string(),
                    lat,
                    lon,
                    admin_region: None,
                }),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn not_found() -> Self {
            Self {
                result: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn geocode(&self, city: &str) -> Result<Option<GeoLocation>, ToolError> {
            self.calls.lock().unwrap().push(city.to_string());
            Ok(self.result.clone())
        }
    }

    /// Weather provider returning a fixed series
    pub struct FakeWeather {
        days: Vec<DailyWeather>,
        calls: Mutex<u32>,
    }

    impl FakeWeather {
        pub fn with_days(days: Vec<DailyWeather>) -> Self {
            Self {
                days,
                calls: Mutex::new(0),
            }
        }

        /// Always empty, like an out-of-horizon request
        pub fn unavailable() -> Self {
            Self::with_days(Vec::new())
        }

        pub fn call_count(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeWeather {
        async fn forecast(&self, _lat: f64, _lon: f64, _start: &str, _end: &str) -> Vec<DailyWeather> {
            *self.calls.lock().unwrap() += 1;
            self.days.clone()
        }
    }

    /// A dry, temperate day
    pub fn sunny_day(date: &str) -> DailyWeather {
        DailyWeather {
            date: date.to_string(),
            temp_min: Some(14.0),
            temp_max: Some(22.0),
            precipitation_probability: 10.0,
            wind_speed: 8.0,
            description: "Temperate - Dry".to_string(),
        }
    }
}
