//! Itinerary generation with bounded local retries

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{PlannerConfig, RunError};
use crate::domain::{Itinerary, RunLog, SessionContext};
use crate::llm::CompletionRequest;
use crate::prompts::{ItineraryContext, PromptLoader};
use crate::repair::{EXCERPT_CHARS, GenerationError, StructuredGenerator};

/// Weather is missing or unusable for this run
pub(crate) fn degraded(ctx: &SessionContext) -> bool {
    ctx.weather_unavailable() || ctx.weather_series().is_empty()
}

fn itinerary_context(ctx: &SessionContext) -> ItineraryContext {
    let request = &ctx.request;
    ItineraryContext {
        destination: request.destination.clone(),
        start_date: request.start_date.to_string(),
        end_date: request.end_date.to_string(),
        profile: request.profile.clone(),
        budget: request.budget.clone(),
        interests: request.interests.join(", "),
        pace: request.pace.clone(),
        constraints: request.constraints_or_none().to_string(),
        weather_available: !degraded(ctx),
        weather_lines: ctx.weather_series().iter().map(|d| d.plan_line()).collect(),
    }
}

/// Produces a schema-valid itinerary for the session
pub struct ItineraryGenerator {
    structured: Arc<StructuredGenerator>,
    prompts: Arc<PromptLoader>,
    config: PlannerConfig,
}

impl ItineraryGenerator {
    pub fn new(structured: Arc<StructuredGenerator>, prompts: Arc<PromptLoader>, config: PlannerConfig) -> Self {
        Self {
            structured,
            prompts,
            config,
        }
    }

    /// Generate an itinerary, retrying parse and schema failures
    ///
    /// Transport errors are returned at once.
    pub async fn generate(&self, ctx: &SessionContext, log: &mut RunLog) -> Result<Itinerary, RunError> {
        debug!(destination = %ctx.request.destination, "ItineraryGenerator::generate: called");
        log.push("ACTION: Generating the itinerary...");
        if degraded(ctx) {
            log.push("Degraded mode: generating without weather data");
        }

        let prompt = self
            .prompts
            .render("itinerary", &itinerary_context(ctx))
            .map_err(RunError::prompt)?;

        let attempts = self.config.generation_attempts.max(1);
        let mut attempt = 1;
        loop {
            let request = CompletionRequest::new(prompt.clone())
                .with_temperature(self.config.temperatures.plan)
                .with_max_tokens(self.config.plan_max_tokens);

            let e = match self
                .structured
                .generate::<Itinerary>(request, self.config.plan_continuations)
                .await
            {
                Ok(itinerary) => {
                    info!(days = itinerary.day_count(), attempt, "Itinerary generated");
                    log.push(format!(
                        "OBSERVATION: Itinerary generated with {} days",
                        itinerary.day_count()
                    ));
                    return Ok(itinerary);
                }
                Err(e) if e.is_retryable_locally() => e,
                Err(e) => {
                    debug!(error = %e, "ItineraryGenerator::generate: fatal error");
                    return Err(RunError::Generation(e));
                }
            };

            match &e {
                GenerationError::Parse(failure) => log.push(format!(
                    "WARNING: Model reply is not valid JSON{} (attempt {}/{}). Excerpt:\n{}",
                    failure.location(),
                    attempt,
                    attempts,
                    failure.excerpt(EXCERPT_CHARS)
                )),
                _ => log.push(format!(
                    "WARNING: Invalid itinerary (attempt {}/{}): {}",
                    attempt, attempts, e
                )),
            }
            if attempt >= attempts {
                return Err(RunError::Generation(e));
            }
            warn!(attempt, attempts, error = %e, "Itinerary reply rejected, retrying");
            log.push("Retrying itinerary generation...");
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TripRequest, fixtures};
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::{CompletionResponse, LlmError};
    use crate::tools::fake::sunny_day;
    use chrono::NaiveDate;

    fn ctx() -> SessionContext {
        let start = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 6, 2).unwrap();
        SessionContext::new(TripRequest::new("Lisbon", start, end))
    }

    fn generator(llm: Arc<MockLlmClient>) -> ItineraryGenerator {
        let prompts = Arc::new(PromptLoader::embedded_only());
        let structured = Arc::new(StructuredGenerator::new(llm, prompts.clone()));
        ItineraryGenerator::new(structured, prompts, PlannerConfig::default())
    }

    #[tokio::test]
    async fn test_generate_first_try() {
        let llm = Arc::new(MockLlmClient::from_texts(&[fixtures::itinerary_json(2).to_string()]));
        let mut ctx = ctx();
        ctx.record_weather(vec![sunny_day("2026-06-01"), sunny_day("2026-06-02")]);
        let mut log = RunLog::default();

        let itinerary = generator(llm.clone()).generate(&ctx, &mut log).await.unwrap();

        assert_eq!(itinerary.day_count(), 2);
        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, 0.5);
        assert_eq!(requests[0].max_tokens, 8000);
        assert!(requests[0].json_mode);
        assert!(requests[0].prompt.contains("2026-06-01: 14°C-22°C, rain 10%"));
        assert!(log.lines().iter().any(|l| l == "OBSERVATION: Itinerary generated with 2 days"));
        assert!(!log.lines().iter().any(|l| l.contains("Degraded mode")));
    }

    #[tokio::test]
    async fn test_generate_degraded_prompt() {
        let llm = Arc::new(MockLlmClient::from_texts(&[fixtures::itinerary_json(1).to_string()]));
        let mut ctx = ctx();
        ctx.record_weather(vec![]);
        let mut log = RunLog::default();

        generator(llm.clone()).generate(&ctx, &mut log).await.unwrap();

        assert!(llm.requests()[0].prompt.contains("WEATHER UNAVAILABLE"));
        assert!(log.lines().iter().any(|l| l.contains("Degraded mode")));
    }

    #[tokio::test]
    async fn test_generate_retries_parse_failure() {
        let llm = Arc::new(MockLlmClient::from_texts(&[
            "Sorry, here is your trip: day one, museums.".to_string(),
            fixtures::itinerary_json(2).to_string(),
        ]));
        let mut log = RunLog::default();

        let itinerary = generator(llm.clone()).generate(&ctx(), &mut log).await.unwrap();

        assert_eq!(itinerary.day_count(), 2);
        assert_eq!(llm.call_count(), 2);
        assert!(log.lines().iter().any(|l| l.contains("not valid JSON") && l.contains("attempt 1/2")));
        assert!(log.lines().iter().any(|l| l.contains("Excerpt:\nSorry, here is your trip")));
    }

    #[tokio::test]
    async fn test_generate_gives_up_after_attempts() {
        let llm = Arc::new(MockLlmClient::from_texts(&[
            r#"{"daily_plans": "three days"}"#,
            r#"{"daily_plans": "still not a list"}"#,
        ]));
        let mut log = RunLog::default();

        let err = generator(llm.clone()).generate(&ctx(), &mut log).await.unwrap_err();

        assert!(matches!(err, RunError::Generation(GenerationError::Schema(_))));
        assert_eq!(llm.call_count(), 2);
        assert!(log.lines().iter().any(|l| l.contains("Invalid itinerary (attempt 2/2)")));
    }

    #[tokio::test]
    async fn test_generate_transport_error_not_retried() {
        let llm = Arc::new(MockLlmClient::scripted(vec![
            Err(LlmError::RateLimited { retry_after: None }),
            Ok(CompletionResponse::text(fixtures::itinerary_json(1).to_string())),
        ]));
        let mut log = RunLog::default();

        let err = generator(llm.clone()).generate(&ctx(), &mut log).await.unwrap_err();

        assert!(matches!(err, RunError::Generation(GenerationError::Llm(LlmError::RateLimited { .. }))));
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once_and_reports_the_real_error() {
        let llm = Arc::new(MockLlmClient::from_texts(&["not json", "never asked"]));
        let prompts = Arc::new(PromptLoader::embedded_only());
        let structured = Arc::new(StructuredGenerator::new(llm.clone(), prompts.clone()));
        let config = PlannerConfig {
            generation_attempts: 0,
            ..PlannerConfig::default()
        };
        let mut log = RunLog::default();

        let err = ItineraryGenerator::new(structured, prompts, config)
            .generate(&ctx(), &mut log)
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::Generation(GenerationError::Parse(_))));
        assert_eq!(llm.call_count(), 1);
        assert!(log.lines().iter().any(|l| l.contains("(attempt 1/1)")));
        assert!(!log.lines().iter().any(|l| l.contains("Retrying")));
    }
}
