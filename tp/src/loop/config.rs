//! Planner configuration types

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sampling temperatures per request kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Temperatures {
    pub decision: f32,
    pub plan: f32,
    pub critic: f32,
    pub corrector: f32,
}

impl Default for Temperatures {
    fn default() -> Self {
        Self {
            decision: 0.3,
            plan: 0.5,
            critic: 0.2,
            corrector: 0.4,
        }
    }
}

/// Configuration for one planning run (from YAML `planner:` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlannerConfig {
    /// Maximum decide/act iterations before giving up
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Run the critique/correct pass after PLAN
    #[serde(default = "default_self_correction")]
    pub self_correction: bool,

    /// Token budget for the next-action decision
    #[serde(default = "default_decision_max_tokens")]
    pub decision_max_tokens: u32,

    /// Token budget for itinerary generation
    #[serde(default = "default_plan_max_tokens")]
    pub plan_max_tokens: u32,

    #[serde(default = "default_critic_max_tokens")]
    pub critic_max_tokens: u32,

    #[serde(default = "default_corrector_max_tokens")]
    pub corrector_max_tokens: u32,

    /// Local attempts for itinerary generation (parse and schema failures only)
    #[serde(default = "default_generation_attempts")]
    pub generation_attempts: u32,

    /// Continuation rounds for a truncated itinerary reply
    #[serde(default = "default_plan_continuations")]
    pub plan_continuations: u32,

    /// Continuation rounds for every other structured reply
    #[serde(default = "default_continuations")]
    pub continuations: u32,

    #[serde(default)]
    pub temperatures: Temperatures,
}

fn default_max_iterations() -> u32 {
    debug!("default_max_iterations: called");
    5
}

fn default_self_correction() -> bool {
    true
}

fn default_decision_max_tokens() -> u32 {
    8000
}

fn default_plan_max_tokens() -> u32 {
    8000
}

fn default_critic_max_tokens() -> u32 {
    2000
}

fn default_corrector_max_tokens() -> u32 {
    8000
}

fn default_generation_attempts() -> u32 {
    debug!("default_generation_attempts: called");
    2
}

fn default_plan_continuations() -> u32 {
    3
}

fn default_continuations() -> u32 {
    1
}

impl Default for PlannerConfig {
    fn default() -> Self {
        debug!("PlannerConfig::default: called");
        Self {
            max_iterations: default_max_iterations(),
            self_correction: default_self_correction(),
            decision_max_tokens: default_decision_max_tokens(),
            plan_max_tokens: default_plan_max_tokens(),
            critic_max_tokens: default_critic_max_tokens(),
            corrector_max_tokens: default_corrector_max_tokens(),
            generation_attempts: default_generation_attempts(),
            plan_continuations: default_plan_continuations(),
            continuations: default_continuations(),
            temperatures: Temperatures::default(),
        }
    }
}
