//! TripPlanner - LLM-driven travel itinerary planner
//!
//! CLI entry point.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use tripplanner::cli::{Cli, Command, OutputFormat, TripArgs, get_log_path};
use tripplanner::config::Config;
use tripplanner::domain::{Activity, Itinerary, RunResult};
use tripplanner::llm::create_client;
use tripplanner::prompts::PromptLoader;
use tripplanner::r#loop::PlannerEngine;
use tripplanner::repair::{EXCERPT_CHARS, repair_reply};
use tripplanner::tools::{OpenMeteoForecast, OpenMeteoGeocoder};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    if let Err(e) = setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()) {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Plan {
            trip,
            max_iterations,
            no_self_correction,
            format,
        }) => {
            debug!(?max_iterations, no_self_correction, %format, "main: matched Plan command");
            cmd_plan(config, &trip, max_iterations, no_self_correction, format).await
        }
        Some(Command::Repair { file }) => {
            debug!(?file, "main: matched Repair command");
            cmd_repair(file.as_deref())
        }
        Some(Command::Config) => {
            debug!("main: matched Config command");
            print!("{}", config.to_yaml()?);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            debug!("main: no command specified, printing help");
            Cli::command().print_help()?;
            println!();
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Run one planning session
async fn cmd_plan(
    mut config: Config,
    trip: &TripArgs,
    max_iterations: Option<u32>,
    no_self_correction: bool,
    format: OutputFormat,
) -> Result<ExitCode> {
    debug!(destination = %trip.destination, "cmd_plan: called");
    let request = trip.to_request().map_err(|e| eyre!(e))?;

    if let Some(max) = max_iterations {
        config.planner.max_iterations = max;
    }
    if no_self_correction {
        config.planner.self_correction = false;
    }
    config.validate()?;

    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let geocoder = Arc::new(OpenMeteoGeocoder::from_config(&config.open_meteo).context("Failed to create geocoder")?);
    let weather =
        Arc::new(OpenMeteoForecast::from_config(&config.open_meteo).context("Failed to create forecast client")?);
    let cwd = std::env::current_dir().context("Failed to get current directory")?;

    let mut engine = PlannerEngine::new(llm, geocoder, weather, config.planner.clone())
        .with_prompts(Arc::new(PromptLoader::new(&cwd)));

    if format == OutputFormat::Text {
        println!(
            "{} Planning {} from {} to {}",
            "==>".cyan().bold(),
            request.destination.bold(),
            request.start_date,
            request.end_date
        );
        engine = engine.with_log_sink(Arc::new(|line: &str| println!("{}", line)));
    }

    let result = engine.plan_trip(request).await;

    match format {
        OutputFormat::Json => println!("{}", result.to_json()?),
        OutputFormat::Text => print_result(&result),
    }

    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_result(result: &RunResult) {
    println!();
    if let Some(itinerary) = &result.itinerary {
        print_itinerary(itinerary);
    }
    if result.weather_unavailable {
        println!("{}", "Weather was unavailable; the plan mixes indoor and outdoor activities.".yellow());
    }
    if let Some(metrics) = &result.metrics {
        println!(
            "{} {:.1}s, {} iterations, {} actions",
            "Done:".green().bold(),
            metrics.execution_time,
            metrics.iterations,
            metrics.actions_count
        );
    }
    if let Some(error) = &result.error {
        eprintln!("{} {}", "Planning failed:".red().bold(), error);
    }
}

fn print_itinerary(itinerary: &Itinerary) {
    for day in &itinerary.daily_plans {
        println!("{}", format!("Day {} - {}", day.day_number, day.date).bold());
        for (slot, activity) in day.slots() {
            println!("  {:<10} {}", format!("{}:", slot), describe(activity));
        }
        for alternative in &day.alternatives {
            println!("  {:<10} {}", "alt:", describe(alternative));
        }
        if let Some(notes) = &day.notes {
            println!("  {}", notes.dimmed());
        }
        println!();
    }

    if !itinerary.justifications.is_empty() {
        println!("{}", "Why".bold());
        for line in &itinerary.justifications {
            println!("  - {}", line);
        }
        println!();
    }
    if !itinerary.checklist.is_empty() {
        println!("{}", "Checklist".bold());
        for item in &itinerary.checklist {
            println!("  [ ] {}", item);
        }
        println!();
    }
}

fn describe(activity: &Activity) -> String {
    let place = if activity.indoor { "indoor" } else { "outdoor" };
    format!(
        "{} @ {} ({}, {}, {})",
        activity.name, activity.location, activity.duration, activity.cost_estimate, place
    )
}

/// Repair a saved reply offline
fn cmd_repair(file: Option<&Path>) -> Result<ExitCode> {
    debug!(?file, "cmd_repair: called");
    let raw = match file {
        Some(path) if path != Path::new("-") => {
            fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?
        }
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    match repair_reply(&raw) {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            eprintln!("{} {}", "Repair failed:".red().bold(), failure);
            eprintln!("{}", failure.excerpt(EXCERPT_CHARS));
            Ok(ExitCode::FAILURE)
        }
    }
}
