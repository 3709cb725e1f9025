//! Headaim CLI — replay, simulation, and configuration for the aim core.
//!
//! Usage:
//!   headaim replay <FILE>              Run a recording through the pipeline
//!   headaim simulate <SCENARIO>        Run a built-in synthetic scenario
//!   headaim config show|reset|path     Inspect or reset configuration
//!   headaim arbitrate [FLAGS]          Show which input mode would be used

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use headaim_model::session::SessionMode;

mod commands;
mod driver;

#[derive(Parser)]
#[command(
    name = "headaim",
    about = "Head-motion aiming and dwell clicking for phone-in-viewer VR",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the standard location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSONL input recording and print the resulting events
    Replay {
        /// Path to the recording
        path: PathBuf,

        /// Session mode: sensor, controller or touch
        #[arg(long, default_value = "sensor")]
        mode: SessionMode,

        /// Also print snapshots at the configured render rate
        #[arg(long)]
        snapshots: bool,
    },

    /// Run a built-in synthetic scenario
    Simulate {
        /// Scenario to run
        #[arg(value_enum)]
        scenario: commands::simulate::Scenario,

        /// Scenario length in seconds (defaults per scenario)
        #[arg(long)]
        secs: Option<f64>,

        /// Synthetic sensor rate (Hz)
        #[arg(long, default_value = "50")]
        rate_hz: u32,

        /// Write the generated inputs to a JSONL recording
        #[arg(long)]
        record: Option<PathBuf>,

        /// Feed the inputs through a live session in real time
        #[arg(long)]
        live: bool,
    },

    /// Inspect or reset the configuration
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },

    /// Show which input mode a session would use
    Arbitrate {
        /// Onboard gyroscope present
        #[arg(long)]
        sensors: bool,

        /// A calibration is saved or will run at start
        #[arg(long)]
        calibrated: bool,

        /// External controller paired
        #[arg(long)]
        controller_paired: bool,

        /// External controller requested
        #[arg(long)]
        controller_requested: bool,

        /// Touch surface available
        #[arg(long)]
        touch: bool,

        /// Take the requested/calibrated flags from the config file
        #[arg(long)]
        from_config: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = commands::config::load(cli.config.as_deref())?;

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    headaim_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Replay {
            path,
            mode,
            snapshots,
        } => commands::replay::run(&config, path, mode, snapshots),
        Commands::Simulate {
            scenario,
            secs,
            rate_hz,
            record,
            live,
        } => commands::simulate::run(scenario, secs, rate_hz, record, live).await,
        Commands::Config { action } => commands::config::run(action, cli.config, &config),
        Commands::Arbitrate {
            sensors,
            calibrated,
            controller_paired,
            controller_requested,
            touch,
            from_config,
        } => commands::arbitrate::run(
            &config,
            sensors,
            calibrated,
            controller_paired,
            controller_requested,
            touch,
            from_config,
        ),
    }
}
