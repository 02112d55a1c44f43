//! Flange generator command line
//!
//! # Commands
//!
//! - `flange single` - One flange from command-line parameters
//! - `flange batch <FILE>` - Every record of a JSON or RON file
//! - `flange random` - A dataset of random variations
//! - `flange systematic` - The default flange over a sweep of hole counts

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use flange_core::OutputFormat;

/// Parametric flange generator
#[derive(Parser, Debug)]
#[command(name = "flange")]
#[command(about = "Generate parametric flange models as STEP or STL files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct GlobalArgs {
    /// Output directory
    #[arg(long, short, global = true, default_value = "output")]
    output: PathBuf,

    /// Output format for every model (step or stl)
    #[arg(long, short, global = true)]
    format: Option<OutputFormat>,

    /// Replace existing files
    #[arg(long, global = true)]
    overwrite: bool,

    /// Do not write metadata.json
    #[arg(long, global = true)]
    no_manifest: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a single flange
    Single(SingleArgs),

    /// Generate every record of a JSON or RON file
    Batch {
        /// Batch file (.json or .ron)
        #[arg(name = "FILE")]
        file: PathBuf,
    },

    /// Generate random variations
    Random {
        /// Number of models
        #[arg(long, short = 'n', default_value_t = 10)]
        count: usize,

        /// Seed for a reproducible dataset
        #[arg(long)]
        seed: Option<u64>,

        /// Sampling ranges file (.json or .ron)
        #[arg(long)]
        ranges: Option<PathBuf>,

        /// Write into a new dataset_<timestamp> subdirectory
        #[arg(long)]
        timestamped: bool,
    },

    /// Generate the default flange with 3, 4, 6, 8 and 12 holes
    Systematic,
}

/// Parameters of `flange single`; anything left out takes its default
#[derive(Args, Debug, Clone, Default)]
struct SingleArgs {
    /// Outer diameter (mm)
    #[arg(long)]
    flange_diameter: Option<f64>,

    /// Thickness (mm)
    #[arg(long)]
    flange_thickness: Option<f64>,

    /// Number of bolt holes
    #[arg(long, allow_negative_numbers = true)]
    hole_count: Option<i64>,

    /// Bolt hole diameter (mm)
    #[arg(long)]
    hole_diameter: Option<f64>,

    /// Center bore diameter (mm), 0 for none
    #[arg(long)]
    center_hole_diameter: Option<f64>,

    /// Bolt circle diameter (mm)
    #[arg(long, conflicts_with = "bolt_circle_ratio")]
    bolt_circle_diameter: Option<f64>,

    /// Bolt circle diameter as a fraction of the outer diameter
    #[arg(long)]
    bolt_circle_ratio: Option<f64>,

    /// Output file name without extension
    #[arg(long)]
    name: Option<String>,
}

fn init_logging(debug: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = if debug { "debug" } else { "info" };
    let default_filter = format!("flange_cli={level},flange_core={level},flange_cad={level}");
    let filter = if debug {
        tracing_subscriber::EnvFilter::new(default_filter)
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| default_filter.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.global.debug);

    let all_succeeded = commands::run(cli.command, &cli.global)?;
    Ok(if all_succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
