use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::process::ExitCode;
use std::time::Duration;
use thiserror::Error;

use pass_stepper::abort::AbortSignal;
use pass_stepper::config::{Config, ConfigError};
use pass_stepper::predict::{next_pass, sample_pass, Pass, PredictError, Satellite, TleCatalog};
use pass_stepper::steps::{build_plan, pack_plan, Axis, StepError, StepPlan};
use pass_stepper::transfer::{self, StorageOutcome, SystemClock, Transfer, TransferError};

#[derive(Parser)]
#[command(name = "pass-stepper")]
#[command(about = "Plans satellite passes for a stepper-motor antenna pointer and uploads them")]
struct Cli {
    /// Station configuration file
    #[arg(short, long, default_value = "station.yaml")]
    config: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the next pass of a satellite
    NextPass {
        /// Satellite name or NORAD id
        #[arg(short, long)]
        satellite: String,
    },
    /// Build the step plan for the next pass
    Plan {
        #[arg(short, long)]
        satellite: String,
        /// Print the whole plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build the step plan and upload it over the serial link
    Send {
        #[arg(short, long)]
        satellite: String,
        /// Overrides serial.port from the configuration
        #[arg(long)]
        port: Option<String>,
        /// Cancel the upload if it has not finished after this long (e.g. "2m")
        #[arg(long, value_parser = humantime::parse_duration)]
        give_up_after: Option<Duration>,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("predict: {0}")]
    Predict(#[from] PredictError),
    #[error("plan: {0}")]
    Steps(#[from] StepError),
    #[error("transfer: {0}")]
    Transfer(#[from] TransferError),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct PlanOutput<'a> {
    pass: &'a Pass,
    plan: &'a StepPlan,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = Config::from_file(&cli.config)
        .map_err(CliError::from)
        .and_then(|config| match cli.command {
            Commands::NextPass { satellite } => show_next_pass(&config, &satellite),
            Commands::Plan { satellite, json } => show_plan(&config, &satellite, json),
            Commands::Send {
                satellite,
                port,
                give_up_after,
            } => send(config, &satellite, port, give_up_after),
        });

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn locate_pass<'a>(
    config: &Config,
    catalog: &'a TleCatalog,
    query: &str,
) -> Result<(&'a Satellite, Pass), CliError> {
    let satellite = catalog.find(query)?;
    let pass = next_pass(
        &config.observer()?,
        satellite,
        Utc::now(),
        config.predict.search_window,
        config.predict.min_elevation_deg,
    )?;
    Ok((satellite, pass))
}

fn prepare(config: &Config, query: &str) -> Result<(Pass, StepPlan), CliError> {
    let catalog = TleCatalog::from_file(&config.predict.tle_file)?;
    let (satellite, pass) = locate_pass(config, &catalog, query)?;
    let samples = sample_pass(
        &config.observer()?,
        satellite,
        &pass,
        config.predict.sample_interval,
    )?;
    let plan = build_plan(&samples, config.resolution())?;
    Ok((pass, plan))
}

fn show_next_pass(config: &Config, query: &str) -> Result<ExitCode, CliError> {
    let catalog = TleCatalog::from_file(&config.predict.tle_file)?;
    let (_, pass) = locate_pass(config, &catalog, query)?;
    print_pass(&pass);
    Ok(ExitCode::SUCCESS)
}

fn show_plan(config: &Config, satellite: &str, json: bool) -> Result<ExitCode, CliError> {
    let (pass, plan) = prepare(config, satellite)?;
    if json {
        let output = PlanOutput {
            pass: &pass,
            plan: &plan,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_pass(&pass);
        print_plan(&plan);
    }
    Ok(ExitCode::SUCCESS)
}

fn send(
    mut config: Config,
    satellite: &str,
    port: Option<String>,
    give_up_after: Option<Duration>,
) -> Result<ExitCode, CliError> {
    if let Some(port) = port {
        config.serial.port = port;
    }

    let (pass, plan) = prepare(&config, satellite)?;
    print_pass(&pass);
    print_plan(&plan);
    let points = pack_plan(&plan)?;

    let abort = AbortSignal::new();
    if let Some(limit) = give_up_after {
        abort.abort_after(
            limit,
            format!("gave up after {}", humantime::format_duration(limit)),
        );
    }

    let port = transfer::serial::open(&config.serial)?;
    let report = Transfer::new(port, SystemClock, config.transfer_settings(), abort)
        .run(&plan.start, &points)?;

    println!(
        "Sent {} points ({} bytes, {} handshakes)",
        report.points_sent, report.bytes_sent, report.ready_waits
    );
    match report.outcome {
        StorageOutcome::Stored => {
            println!("Device stored the plan");
            Ok(ExitCode::SUCCESS)
        }
        StorageOutcome::StorageFailed => {
            eprintln!("Device received the plan but could not store it (persistent memory missing or corrupt)");
            Ok(ExitCode::from(2))
        }
    }
}

fn print_pass(pass: &Pass) {
    println!("{} (NORAD {})", pass.satellite, pass.norad_id);
    println!(
        "  rise {} at az {:.1}",
        pass.rise.format("%Y-%m-%d %H:%M:%S UTC"),
        pass.rise_azimuth_deg
    );
    println!(
        "  culmination {} at el {:.1}",
        pass.culmination.format("%H:%M:%S"),
        pass.max_elevation_deg
    );
    println!(
        "  set {} at az {:.1} ({} s)",
        pass.set.format("%H:%M:%S"),
        pass.set_azimuth_deg,
        pass.duration_seconds
    );
}

fn print_plan(plan: &StepPlan) {
    let start = &plan.start;
    println!("Step plan: {} points over {} ms", start.point_count, plan.duration_ms());
    println!(
        "  start az {} steps, el {} steps, az direction {}",
        start.start_az_steps,
        start.start_elev_steps,
        if start.az_dir > 0 { "cw" } else { "ccw" }
    );
    println!("  elevation reverses at {} ms", start.elev_dir_change_ms);
    println!(
        "  total steps: az {}, el {}",
        plan.total_steps(Axis::Azimuth),
        plan.total_steps(Axis::Elevation)
    );
}
