//! CLI command definitions

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use crate::domain::TripRequest;

/// TripPlanner - LLM-driven travel itinerary planner
#[derive(Parser)]
#[command(
    name = "tp",
    about = "Plan a trip with a ReAct agent, repair its JSON, and self-correct the itinerary",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plan a trip
    Plan {
        #[command(flatten)]
        trip: TripArgs,

        /// Override planner.max-iterations
        #[arg(long)]
        max_iterations: Option<u32>,

        /// Skip the critique/correction pass
        #[arg(long)]
        no_self_correction: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Repair a saved model reply into JSON (no backend calls)
    Repair {
        /// File holding the reply, or "-" for stdin
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Print the effective configuration as YAML
    Config,
}

/// What the traveller wants
#[derive(Debug, Clone, Args)]
pub struct TripArgs {
    /// Destination city
    #[arg(short, long)]
    pub destination: String,

    /// First day, YYYY-MM-DD
    #[arg(long)]
    pub start_date: NaiveDate,

    /// Last day, YYYY-MM-DD
    #[arg(long)]
    pub end_date: NaiveDate,

    /// Who is travelling (solo, couple, family, friends)
    #[arg(long, default_value = "solo")]
    pub profile: String,

    /// Budget level (low, medium, high)
    #[arg(long, default_value = "medium")]
    pub budget: String,

    /// Interest, repeatable (e.g. --interest museums --interest food)
    #[arg(long = "interest", value_name = "INTEREST")]
    pub interests: Vec<String>,

    /// Pace (relaxed, normal, intense)
    #[arg(long, default_value = "normal")]
    pub pace: String,

    /// Free-form constraints
    #[arg(long, default_value = "")]
    pub constraints: String,
}

impl TripArgs {
    /// Build the trip request; the end date must not precede the start date
    pub fn to_request(&self) -> Result<TripRequest, String> {
        debug!(destination = %self.destination, "TripArgs::to_request: called");
        if self.destination.trim().is_empty() {
            return Err("destination must not be empty".to_string());
        }
        if self.end_date < self.start_date {
            return Err(format!(
                "end date {} is before start date {}",
                self.end_date, self.start_date
            ));
        }
        Ok(TripRequest::new(self.destination.trim(), self.start_date, self.end_date)
            .with_profile(&self.profile)
            .with_budget(&self.budget)
            .with_interests(self.interests.clone())
            .with_pace(&self.pace)
            .with_constraints(&self.constraints))
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tripplanner")
        .join("logs")
        .join("tripplanner.log")
}

/// Output format for `plan`
#[derive(Clone, Debug, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: text or json", s))
            }
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
