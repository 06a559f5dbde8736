//! Self-correction: one critique, at most one correction
//!
//! Never fails the run. Any error falls back to the itinerary it was given.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::PlannerConfig;
use super::generation::degraded;
use crate::domain::{CritiqueResult, Itinerary, RunLog, SessionContext};
use crate::llm::CompletionRequest;
use crate::prompts::{CorrectorContext, CriticContext, PromptLoader};
use crate::repair::{GenerationError, StructuredGenerator};

fn pretty<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, GenerationError> {
    serde_json::to_string_pretty(value).map_err(|e| GenerationError::Prompt(e.to_string()))
}

/// Critique-then-correct pass over a validated itinerary
pub struct SelfCorrector {
    structured: Arc<StructuredGenerator>,
    prompts: Arc<PromptLoader>,
    config: PlannerConfig,
}

impl SelfCorrector {
    pub fn new(structured: Arc<StructuredGenerator>, prompts: Arc<PromptLoader>, config: PlannerConfig) -> Self {
        Self {
            structured,
            prompts,
            config,
        }
    }

    /// Return the corrected itinerary, or `itinerary` unchanged
    pub async fn correct(&self, itinerary: Itinerary, ctx: &SessionContext, log: &mut RunLog) -> Itinerary {
        debug!(days = itinerary.day_count(), "SelfCorrector::correct: called");
        log.push("--- SELF-CORRECTION ---");
        if degraded(ctx) {
            log.push("Critique in degraded mode (no weather)");
        }

        match self.try_correct(&itinerary, ctx, log).await {
            Ok(Some(corrected)) => corrected,
            Ok(None) => itinerary,
            Err(e) => {
                warn!(error = %e, "Self-correction failed, keeping the original itinerary");
                log.push(format!("ERROR during self-correction: {}", e));
                log.push("Returning the original itinerary");
                itinerary
            }
        }
    }

    async fn try_correct(
        &self,
        itinerary: &Itinerary,
        ctx: &SessionContext,
        log: &mut RunLog,
    ) -> Result<Option<Itinerary>, GenerationError> {
        let itinerary_json = pretty(itinerary)?;

        log.push("Critiquing the itinerary...");
        let critic = CriticContext {
            itinerary: itinerary_json.clone(),
            weather_available: !degraded(ctx),
            weather_lines: ctx.weather_series().iter().map(|d| d.critic_line()).collect(),
            budget: ctx.request.budget.clone(),
            pace: ctx.request.pace.clone(),
        };
        let prompt = self
            .prompts
            .render("critic", &critic)
            .map_err(|e| GenerationError::Prompt(e.to_string()))?;
        let request = CompletionRequest::new(prompt)
            .with_temperature(self.config.temperatures.critic)
            .with_max_tokens(self.config.critic_max_tokens);
        let critique: CritiqueResult = self.structured.generate(request, self.config.continuations).await?;

        if critique.accepts() {
            info!("Critique accepted the itinerary");
            log.push("VALIDATION: Itinerary OK, no correction needed");
            return Ok(None);
        }

        log.push(format!("ISSUES FOUND: {}", critique.issues.len()));
        for issue in &critique.issues {
            log.push(format!("  - {}", issue.log_line()));
        }

        log.push("Correcting the itinerary...");
        let corrector = CorrectorContext {
            original_itinerary: itinerary_json,
            issues: pretty(&critique.issues)?,
            suggestions: pretty(&critique.suggestions)?,
        };
        let prompt = self
            .prompts
            .render("corrector", &corrector)
            .map_err(|e| GenerationError::Prompt(e.to_string()))?;
        let request = CompletionRequest::new(prompt)
            .with_temperature(self.config.temperatures.corrector)
            .with_max_tokens(self.config.corrector_max_tokens);
        let corrected: Itinerary = self.structured.generate(request, self.config.continuations).await?;

        info!(days = corrected.day_count(), "Itinerary corrected");
        log.push("CORRECTION: Itinerary corrected");
        Ok(Some(corrected))
    }
}
