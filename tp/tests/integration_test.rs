//! Integration tests for TripPlanner
//!
//! End-to-end behaviour through the public API: reply repair, continuation,
//! override rules and full planning runs against scripted collaborators.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Value, json};

use tripplanner::domain::{Action, DailyWeather, GeoLocation, SessionContext, TripRequest, WeatherQuery};
use tripplanner::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
use tripplanner::prompts::PromptLoader;
use tripplanner::r#loop::{PlannerConfig, PlannerEngine, resolve};
use tripplanner::repair::{StructuredGenerator, repair_reply};
use tripplanner::tools::{Geocoder, ToolError, WeatherProvider};

// =============================================================================
// Scripted collaborators
// =============================================================================

struct ScriptedClient {
    replies: Mutex<VecDeque<String>>,
    seen: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    fn new(replies: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<CompletionRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.seen.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .map(CompletionResponse::text)
            .ok_or_else(|| LlmError::InvalidResponse("script exhausted".to_string()))
    }
}

struct Paris;

#[async_trait]
impl Geocoder for Paris {
    async fn geocode(&self, _city: &str) -> Result<Option<GeoLocation>, ToolError> {
        Ok(Some(GeoLocation {
            name: "Paris".to_string(),
            country: "France".to_string(),
            lat: 48.85,
            lon: 2.35,
            admin_region: Some("Île-de-France".to_string()),
        }))
    }
}

struct NoForecast;

#[async_trait]
impl WeatherProvider for NoForecast {
    async fn forecast(&self, _lat: f64, _lon: f64, _start: &str, _end: &str) -> Vec<DailyWeather> {
        Vec::new()
    }
}

fn trip() -> TripRequest {
    TripRequest::new(
        "Paris",
        NaiveDate::from_ymd_opt(2026, 12, 20).unwrap(),
        NaiveDate::from_ymd_opt(2026, 12, 21).unwrap(),
    )
    .with_profile("couple")
    .with_interests(vec!["museums".to_string(), "food".to_string()])
    .with_pace("relaxed")
}

fn activity(name: &str, indoor: bool) -> Value {
    json!({"name": name, "location": "Centre", "duration": "2h", "cost_estimate": "Free", "indoor": indoor})
}

fn itinerary_reply() -> String {
    json!({
        "daily_plans": [
            {"day_number": 1, "date": "2026-12-20", "morning": activity("Louvre", true),
             "afternoon": activity("Seine walk", false), "evening": activity("Bistro", true),
             "alternatives": [activity("Orsay", true)]},
            {"day_number": 2, "date": "2026-12-21", "morning": activity("Marais", false),
             "afternoon": activity("Pompidou", true), "evening": activity("Jazz club", true)}
        ],
        "justifications": ["Day 1: museums first"],
        "checklist": ["Book Louvre tickets"]
    })
    .to_string()
}

fn decision(action: &str, input: Value) -> String {
    json!({"thought": "step", "action": action, "action_input": input}).to_string()
}

// =============================================================================
// Repair scenarios
// =============================================================================

#[test]
fn test_trailing_comma_after_prose() {
    let value = repair_reply("Sure! {\"a\":1,}").unwrap();
    assert_eq!(value, json!({"a": 1}));
}

#[test]
fn test_fenced_reply() {
    let value = repair_reply("```json\n{\"cities\":[\"Paris\",\"Lyon\",\"Nice\"]}\n```").unwrap();
    assert_eq!(value, json!({"cities": ["Paris", "Lyon", "Nice"]}));
}

#[test]
fn test_raw_newline_inside_string() {
    let value = repair_reply("{\"a\": \"line1\nline2\"}").unwrap();
    assert_eq!(value["a"], "line1\nline2");
}

#[test]
fn test_unrepairable_reply_reports_location() {
    let failure = repair_reply("{\"a\": tru}").unwrap_err();
    assert!(failure.location.is_some());
    assert_eq!(failure.raw, "{\"a\": tru}");
}

#[tokio::test]
async fn test_truncated_reply_completed_by_continuation() {
    let client = ScriptedClient::new(vec![
        "{\"daily_plans\":[{\"day_number\":1,".to_string(),
        "\"date\":\"2025-01-01\"}]}".to_string(),
    ]);
    let generator = StructuredGenerator::new(client.clone(), Arc::new(PromptLoader::embedded_only()));

    let value = generator
        .generate_value(CompletionRequest::new("plan").with_max_tokens(8000), 1)
        .await
        .unwrap();

    assert_eq!(value, json!({"daily_plans": [{"day_number": 1, "date": "2025-01-01"}]}));
    let seen = client.seen();
    assert_eq!(seen.len(), 2);
    assert!(seen[1].prompt.contains("{\"daily_plans\":[{\"day_number\":1,"));
    assert_eq!(seen[1].temperature, 0.0);
    assert_eq!(seen[1].max_tokens, 2000);
    assert!(!seen[1].json_mode);
}

// =============================================================================
// Override scenarios
// =============================================================================

#[test]
fn test_geocode_with_stored_result_becomes_weather() {
    let mut ctx = SessionContext::new(trip());
    ctx.geocode = Some(GeoLocation {
        name: "Paris".to_string(),
        country: "France".to_string(),
        lat: 48.85,
        lon: 2.35,
        admin_region: None,
    });

    let resolution = resolve(
        Action::Geocode {
            city: Some("Paris".to_string()),
        },
        &ctx,
    );

    let Action::Weather(query) = resolution.action else {
        panic!("expected WEATHER, got {:?}", resolution.action);
    };
    assert_eq!(query.lat, Some(48.85));
    assert_eq!(query.lon, Some(2.35));
    assert_eq!(query.start_date.as_deref(), Some("2026-12-20"));
}

#[test]
fn test_weather_after_empty_forecast_becomes_plan() {
    let mut ctx = SessionContext::new(trip());
    ctx.record_weather(Vec::new());
    assert!(ctx.weather_unavailable());

    let resolution = resolve(Action::Weather(WeatherQuery::default()), &ctx);
    assert_eq!(resolution.action, Action::Plan);
    assert!(resolution.overridden.is_some());
}

// =============================================================================
// Full runs
// =============================================================================

#[tokio::test]
async fn test_degraded_run_end_to_end() {
    let client = ScriptedClient::new(vec![
        decision("GEOCODE", json!({"city": "Paris"})),
        decision(
            "WEATHER",
            json!({"lat": 48.85, "lon": 2.35, "start_date": "2026-12-20", "end_date": "2026-12-21"}),
        ),
        decision(
            "WEATHER",
            json!({"lat": 48.85, "lon": 2.35, "start_date": "2026-12-20", "end_date": "2026-12-21"}),
        ),
        format!("```json\n{}\n```", itinerary_reply()),
        r#"{"is_valid": true, "issues": [], "suggestions": []}"#.to_string(),
    ]);
    let engine = PlannerEngine::new(
        client.clone(),
        Arc::new(Paris),
        Arc::new(NoForecast),
        PlannerConfig::default(),
    );

    let result = engine.plan_trip(trip()).await;

    assert!(result.success, "logs: {:#?}", result.logs);
    assert!(result.weather_unavailable);
    let itinerary = result.itinerary.as_ref().unwrap();
    assert_eq!(itinerary.day_count(), 2);
    assert_eq!(itinerary.daily_plans[0].alternatives[0].name, "Orsay");
    assert_eq!(client.seen().len(), 5);

    let bundle: Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
    assert_eq!(bundle["success"], true);
    assert_eq!(bundle["weather_unavailable"], true);
    assert_eq!(bundle["metrics"]["iterations"], 3);
    assert_eq!(bundle["itinerary"]["daily_plans"][1]["afternoon"]["name"], "Pompidou");
}

#[tokio::test]
async fn test_exhausted_script_fails_the_run() {
    let client = ScriptedClient::new(vec![decision("GEOCODE", json!({"city": "Paris"}))]);
    let engine = PlannerEngine::new(client, Arc::new(Paris), Arc::new(NoForecast), PlannerConfig::default());

    let result = engine.plan_trip(trip()).await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("script exhausted"));
    assert!(result.logs.iter().any(|l| l.starts_with("OBSERVATION: Paris")));
}
