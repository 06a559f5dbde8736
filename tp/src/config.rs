//! Trip planner configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llm::{Backoff, LlmError, RetryPolicy};
use crate::r#loop::PlannerConfig;

/// Env var that overrides the backend timeout, in seconds
pub const TIMEOUT_ENV: &str = "MISTRAL_TIMEOUT_S";

/// Main trip planner configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Planning loop settings
    pub planner: PlannerConfig,

    /// Geocoding and forecast endpoints
    pub open_meteo: OpenMeteoConfig,

    /// Log level for the log file (overridden by --log-level)
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that the API key environment variable is set. Call this before
    /// any command that talks to the backend.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.llm.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file_chain(config_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_file_chain(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .tripplanner.yml
        let local_config = PathBuf::from(".tripplanner.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/tripplanner/tripplanner.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tripplanner").join("tripplanner.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Apply environment overrides on top of the loaded file
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var(TIMEOUT_ENV) {
            match value.trim().parse::<u64>() {
                Ok(secs) => {
                    tracing::debug!(secs, "apply_env_overrides: backend timeout from env");
                    self.llm.timeout_ms = secs.saturating_mul(1000);
                }
                Err(e) => {
                    tracing::warn!("Ignoring {}={:?}: {}", TIMEOUT_ENV, value, e);
                }
            }
        }
    }

    /// Render the effective configuration as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config")
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (only "mistral" is supported)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Retry policy for transient network errors
    pub retry: RetryConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "mistral".to_string(),
            model: "mistral-large-latest".to_string(),
            api_key_env: "MISTRAL_API_KEY".to_string(),
            base_url: "https://api.mistral.ai".to_string(),
            timeout_ms: 300_000,
            retry: RetryConfig::default(),
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String, LlmError> {
        std::env::var(&self.api_key_env)
            .map_err(|_| LlmError::Config(format!("Set the {} environment variable", self.api_key_env)))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Retry settings for the backend transport
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Attempt k waits k * step before the next one
    #[serde(rename = "backoff-step-ms")]
    pub backoff_step_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_step_ms: 3_000,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Backoff::linear(self.backoff_step_ms))
    }
}

/// Open-Meteo endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenMeteoConfig {
    #[serde(rename = "geocoding-url")]
    pub geocoding_url: String,

    #[serde(rename = "forecast-url")]
    pub forecast_url: String,

    /// Language for place names
    pub language: String,

    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for OpenMeteoConfig {
    fn default() -> Self {
        Self {
            geocoding_url: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            language: "en".to_string(),
            timeout_ms: 10_000,
        }
    }
}
