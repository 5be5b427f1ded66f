//! Performer command line entry point
//!
//! Runs the intake → dispatch → result validation pipeline for a single task,
//! or one of its stages in isolation. The serving layer that feeds tasks to a
//! long-running worker lives outside this binary.

use clap::{Args, Parser, Subcommand};
use llm_performer::config::{ComputationEnv, PerformerConfig};
use llm_performer::error::PerformerError;
use llm_performer::observability::{init_default_logging, logging::level_for_verbosity};
use llm_performer::pipeline::{intake_from_config, Pipeline};
use llm_performer::task::{Task, ValidationOutcome};
use llm_performer::verification::ResultValidator;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info};

/// Task performer: validate, dispatch and verify LLM tasks
#[derive(Parser)]
#[command(name = "performer")]
#[command(about = "Validate tasks, dispatch them to an LLM endpoint and verify the results")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "PERFORMER_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run intake validation only
    Validate(TaskInput),
    /// Run the full pipeline for one task
    Run(TaskInput),
    /// Validate a stored computation result
    CheckResult {
        /// File containing the raw result bytes
        file: PathBuf,
    },
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(Args)]
struct TaskInput {
    /// Task identifier
    #[arg(long)]
    id: String,

    #[command(flatten)]
    payload: PayloadSource,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct PayloadSource {
    /// Payload given inline
    #[arg(long)]
    payload: Option<String>,

    /// Payload read from a file, bytes taken as-is
    #[arg(long, value_name = "FILE")]
    payload_file: Option<PathBuf>,
}

impl TaskInput {
    fn into_task(self) -> std::io::Result<Task> {
        let payload = match (self.payload.payload, self.payload.payload_file) {
            (Some(text), _) => text.into_bytes(),
            (None, Some(path)) => std::fs::read(path)?,
            (None, None) => Vec::new(),
        };
        Ok(Task::new(self.id, payload))
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging(level_for_verbosity(cli.verbose));

    info!("Starting performer v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Validate(input) => handle_validate(&config, input),
        Commands::Run(input) => handle_run(&config, input).await,
        Commands::CheckResult { file } => handle_check_result(&config, &file),
        Commands::Config { show } => handle_config_command(&config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn load_configuration(
    config_path: Option<&Path>,
) -> Result<PerformerConfig, Box<dyn std::error::Error>> {
    if let Some(path) = config_path {
        info!("Loading configuration from: {}", path.display());
        return Ok(PerformerConfig::load_from_file(path)?);
    }

    // Try default locations
    for path_str in ["performer.toml", "config/performer.toml"] {
        let path = Path::new(path_str);
        if path.exists() {
            info!("Loading configuration from: {}", path.display());
            return Ok(PerformerConfig::load_from_file(path)?);
        }
    }

    info!("No configuration file found, using defaults");
    Ok(PerformerConfig::default())
}

/// Print a sanitized error report to stdout and return its message
///
/// Only the sanitized message travels on, so the final log line carries the
/// same redaction as the report.
fn report_failure(error: PerformerError) -> Box<dyn std::error::Error> {
    let report = error.to_error_report();
    match serde_json::to_string(&report) {
        Ok(line) => println!("{line}"),
        Err(e) => error!("Failed to serialize error report: {}", e),
    }
    report.message.into()
}

fn handle_validate(
    config: &PerformerConfig,
    input: TaskInput,
) -> Result<(), Box<dyn std::error::Error>> {
    let task = input.into_task()?;
    let intake = intake_from_config(config, ComputationEnv::from_env(&config.computation));

    match intake.validate(&task) {
        ValidationOutcome::Accepted(accepted) => {
            println!(
                "{}",
                json!({
                    "task_id": task.id_lossy(),
                    "accepted": true,
                    "prompt_len": accepted.prompt().len(),
                })
            );
            Ok(())
        }
        ValidationOutcome::Rejected(rejection) => Err(report_failure(rejection.into())),
    }
}

async fn handle_run(
    config: &PerformerConfig,
    input: TaskInput,
) -> Result<(), Box<dyn std::error::Error>> {
    let task = input.into_task()?;
    let env = ComputationEnv::from_env(&config.computation);

    let pipeline = Pipeline::from_config(config, env).map_err(report_failure)?;
    let response = pipeline.handle(&task).await.map_err(report_failure)?;

    let result: serde_json::Value = serde_json::from_slice(&response.result)?;
    println!(
        "{}",
        json!({
            "task_id": response.task_id_lossy(),
            "result": result,
        })
    );
    Ok(())
}

fn handle_check_result(
    config: &PerformerConfig,
    file: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read(file)?;
    let validator = ResultValidator::new(config.limits.max_result_bytes);

    match validator.validate(&raw) {
        ValidationOutcome::Accepted(result) => {
            println!("{}", serde_json::to_string(&result)?);
            Ok(())
        }
        ValidationOutcome::Rejected(rejection) => Err(report_failure(rejection.into())),
    }
}

fn handle_config_command(
    config: &PerformerConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    if show {
        println!("Current configuration:");
        println!("{}", toml::to_string_pretty(config)?);
    }

    match ComputationEnv::from_env(&config.computation).verify() {
        Ok(()) => info!("Computation credential and endpoint are set"),
        Err(e) => error!("Computation environment incomplete: {}", e),
    }

    info!("Configuration validation complete");
    Ok(())
}
