//! Planning engine
//!
//! Runs the decide/act loop: ask the backend for the next action, apply the
//! override rules, execute the action against the collaborators, and stop on
//! PLAN, FINISH, an error, or the iteration bound.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::correction::SelfCorrector;
use super::generation::ItineraryGenerator;
use super::overrides::{Resolution, resolve};
use super::{PlannerConfig, RunError};
use crate::domain::{
    Action, ActionRecord, Decision, Itinerary, LogSink, RunLog, RunMetrics, RunResult, SessionContext, TripRequest,
    WeatherQuery,
};
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::{DecideContext, PromptLoader};
use crate::repair::StructuredGenerator;
use crate::tools::{Geocoder, WeatherProvider};

/// How one iteration ended
#[derive(Debug)]
enum Step {
    Continue,
    Planned(Itinerary),
    Finished,
}

/// Mutable state of one run
struct Run {
    id: String,
    ctx: SessionContext,
    history: Vec<ActionRecord>,
    log: RunLog,
    started: Instant,
}

impl Run {
    fn result(self, itinerary: Option<Itinerary>, error: Option<RunError>, iterations: u32) -> RunResult {
        let success = error.is_none();
        let metrics = success.then(|| RunMetrics {
            execution_time: self.started.elapsed().as_secs_f64(),
            iterations,
            actions_count: self.history.len(),
        });
        RunResult {
            itinerary,
            weather: self.ctx.weather_series().to_vec(),
            weather_unavailable: self.ctx.weather_unavailable(),
            logs: self.log.into_lines(),
            success,
            error: error.map(|e| e.to_string()),
            metrics,
        }
    }
}

/// Drives planning runs
///
/// Holds only immutable, shareable parts; every `plan_trip` call gets its own
/// session.
pub struct PlannerEngine {
    config: PlannerConfig,
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    structured: Arc<StructuredGenerator>,
    generator: ItineraryGenerator,
    corrector: SelfCorrector,
    geocoder: Arc<dyn Geocoder>,
    weather: Arc<dyn WeatherProvider>,
    sink: Option<LogSink>,
}

impl PlannerEngine {
    /// Create an engine using the embedded prompts
    pub fn new(
        llm: Arc<dyn LlmClient>,
        geocoder: Arc<dyn Geocoder>,
        weather: Arc<dyn WeatherProvider>,
        config: PlannerConfig,
    ) -> Self {
        debug!(max_iterations = config.max_iterations, self_correction = config.self_correction, "PlannerEngine::new: called");
        let prompts = Arc::new(PromptLoader::embedded_only());
        let structured = Arc::new(StructuredGenerator::new(llm.clone(), prompts.clone()));
        Self {
            generator: ItineraryGenerator::new(structured.clone(), prompts.clone(), config.clone()),
            corrector: SelfCorrector::new(structured.clone(), prompts.clone(), config.clone()),
            config,
            llm,
            prompts,
            structured,
            geocoder,
            weather,
            sink: None,
        }
    }

    /// Use a different prompt loader (e.g. one that honours on-disk overrides)
    pub fn with_prompts(mut self, prompts: Arc<PromptLoader>) -> Self {
        debug!("PlannerEngine::with_prompts: called");
        self.structured = Arc::new(StructuredGenerator::new(self.llm.clone(), prompts.clone()));
        self.generator = ItineraryGenerator::new(self.structured.clone(), prompts.clone(), self.config.clone());
        self.corrector = SelfCorrector::new(self.structured.clone(), prompts.clone(), self.config.clone());
        self.prompts = prompts;
        self
    }

    /// Forward every run-log line to `sink` as it is written
    pub fn with_log_sink(mut self, sink: LogSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Plan a trip
    ///
    /// Never fails: errors end the run and are reported in the result.
    pub async fn plan_trip(&self, request: TripRequest) -> RunResult {
        let mut run = Run {
            id: Uuid::now_v7().to_string(),
            ctx: SessionContext::new(request),
            history: Vec::new(),
            log: RunLog::new(self.sink.clone()),
            started: Instant::now(),
        };
        info!(
            run_id = %run.id,
            destination = %run.ctx.request.destination,
            max_iterations = self.config.max_iterations,
            "Starting planning run"
        );

        for iteration in 1..=self.config.max_iterations {
            debug!(run_id = %run.id, iteration, "plan_trip: iteration start");
            run.log.push(format!("--- Iteration {} ---", iteration));

            match self.iteration(&mut run, iteration).await {
                Ok(Step::Continue) => {}
                Ok(Step::Planned(itinerary)) => {
                    info!(run_id = %run.id, iteration, "Planning run complete");
                    return run.result(Some(itinerary), None, iteration);
                }
                Ok(Step::Finished) => {
                    info!(run_id = %run.id, iteration, "Planning run finished by the model");
                    let itinerary = run.ctx.itinerary.clone();
                    return run.result(itinerary, None, iteration);
                }
                Err(e) => {
                    warn!(run_id = %run.id, iteration, error = %e, "Planning run aborted");
                    run.log.push(format!("ERROR: {}", e));
                    let itinerary = run.ctx.itinerary.clone();
                    return run.result(itinerary, Some(e), iteration);
                }
            }
        }

        let max = self.config.max_iterations;
        warn!(run_id = %run.id, max, "Max iterations reached");
        run.log.push("WARNING: Max iterations reached");
        let itinerary = run.ctx.itinerary.clone();
        run.result(itinerary, Some(RunError::MaxIterations { max }), max)
    }

    /// Decide, resolve and execute one action; records exactly one history entry
    async fn iteration(&self, run: &mut Run, iteration: u32) -> Result<Step, RunError> {
        let decision = match self.decide(run).await {
            Ok(decision) => decision,
            Err(e) => {
                run.history
                    .push(ActionRecord::new(iteration, "DECIDE", json!({}), &e.to_string()));
                return Err(e);
            }
        };
        run.log.push(format!("THOUGHT: {}", decision.thought));

        let proposed = match Action::from_decision(&decision) {
            Ok(action) => action,
            Err(unknown) => {
                debug!(action = %decision.action, "iteration: unknown action");
                run.log
                    .push(format!("ACTION: {} {}", decision.action, decision.action_input));
                run.log.push(format!("ERROR: {}", unknown));
                run.history.push(ActionRecord::new(
                    iteration,
                    decision.action.clone(),
                    decision.action_input.clone(),
                    "None",
                ));
                return Ok(Step::Continue);
            }
        };

        let Resolution { action, overridden } = resolve(proposed.clone(), &run.ctx);
        match overridden {
            Some(reason) => {
                info!(run_id = %run.id, from = proposed.name(), to = action.name(), "Action overridden");
                run.log.push(format!("ACTION: {}", proposed));
                run.log.push(format!("OVERRIDE: {}", reason));
                run.log.push(format!("-> NEW ACTION: {}", action));
            }
            None => run.log.push(format!("ACTION: {}", action)),
        }

        let outcome = self.execute(&action, run).await;
        let summary = match &outcome {
            Ok((_, summary)) => summary.clone(),
            Err(e) => format!("ERROR: {}", e),
        };
        run.history
            .push(ActionRecord::new(iteration, action.name(), action.input(), &summary));
        outcome.map(|(step, _)| step)
    }

    /// Ask the backend for the next action
    async fn decide(&self, run: &Run) -> Result<Decision, RunError> {
        debug!(run_id = %run.id, history = run.history.len(), "decide: called");
        let collected_info = serde_json::to_string_pretty(&run.ctx.collected_info()).map_err(RunError::prompt)?;
        let context = DecideContext {
            user_request: run.ctx.request.summary(),
            collected_info,
            action_history: run.history.iter().map(|r| r.to_string()).collect(),
        };
        let prompt = self.prompts.render("decide", &context).map_err(RunError::prompt)?;
        let system = self.prompts.load_template("system").map_err(RunError::prompt)?;

        let request = CompletionRequest::new(prompt)
            .with_system(system)
            .with_temperature(self.config.temperatures.decision)
            .with_max_tokens(self.config.decision_max_tokens);
        self.structured
            .generate::<Decision>(request, self.config.continuations)
            .await
            .map_err(RunError::Decision)
    }

    /// Run an action; returns the step and a history summary
    async fn execute(&self, action: &Action, run: &mut Run) -> Result<(Step, String), RunError> {
        debug!(run_id = %run.id, action = action.name(), "execute: called");
        match action {
            Action::Geocode { city } => Ok((Step::Continue, self.execute_geocode(city.as_deref(), run).await)),
            Action::Weather(query) => Ok((Step::Continue, self.execute_weather(query, run).await)),
            Action::Plan => {
                let itinerary = self.generator.generate(&run.ctx, &mut run.log).await?;
                let itinerary = if self.config.self_correction {
                    self.corrector.correct(itinerary, &run.ctx, &mut run.log).await
                } else {
                    debug!("execute: self-correction disabled");
                    itinerary
                };
                run.ctx.itinerary = Some(itinerary.clone());
                let summary = format!("Itinerary with {} days", itinerary.day_count());
                Ok((Step::Planned(itinerary), summary))
            }
            Action::Finish => {
                run.log.push("FINISH: Agent finished");
                Ok((Step::Finished, "Finished".to_string()))
            }
        }
    }

    async fn execute_geocode(&self, city: Option<&str>, run: &mut Run) -> String {
        let Some(city) = city else {
            run.log.push("ERROR: No city given for GEOCODE");
            return "None".to_string();
        };

        match self.geocoder.geocode(city).await {
            Ok(Some(location)) => {
                run.log.push(format!(
                    "OBSERVATION: {} -> lat={}, lon={}, country={}",
                    city, location.lat, location.lon, location.country
                ));
                let summary = json!(location).to_string();
                run.ctx.geocode = Some(location);
                summary
            }
            Ok(None) => {
                run.log.push(format!("ERROR: City '{}' not found", city));
                "None".to_string()
            }
            Err(e) => {
                warn!(%city, error = %e, "Geocoding failed");
                run.log.push(format!("ERROR: City '{}' not found ({})", city, e));
                "None".to_string()
            }
        }
    }

    async fn execute_weather(&self, query: &WeatherQuery, run: &mut Run) -> String {
        let Some((lat, lon, start, end)) = query.complete() else {
            run.log.push("ERROR: Missing parameters for WEATHER");
            return "None".to_string();
        };

        let days = self.weather.forecast(lat, lon, start, end).await;
        run.ctx.record_weather(days);

        let days = run.ctx.weather_series();
        if days.is_empty() {
            info!(run_id = %run.id, "Weather unavailable, switching to degraded mode");
            run.log
                .push("WARNING: Could not retrieve the weather (API unavailable or dates out of range)");
            run.log.push("-> The itinerary will be generated without weather adaptation");
            return "[]".to_string();
        }

        let preview: Vec<String> = days
            .iter()
            .take(3)
            .map(|d| format!("  {}: {}", d.date, d.description))
            .collect();
        let summary = json!(days).to_string();
        run.log
            .push(format!("OBSERVATION: Weather retrieved:\n{}", preview.join("\n")));
        summary
    }
}
