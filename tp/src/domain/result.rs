//! What a planning run hands back

use serde::Serialize;

use super::{DailyWeather, Itinerary};

/// Timing and counters for a successful PLAN run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetrics {
    /// Seconds, wall clock
    pub execution_time: f64,
    pub iterations: u32,
    pub actions_count: usize,
}

/// Result bundle of `PlannerEngine::plan_trip`
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub itinerary: Option<Itinerary>,
    pub logs: Vec<String>,
    pub weather: Vec<DailyWeather>,
    pub weather_unavailable: bool,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<RunMetrics>,
}

impl RunResult {
    /// Finished with PLAN or FINISH
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Pretty JSON of the whole bundle
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
