//! Command-line interface for the headless scenario runner

use clap::Parser;
use std::path::PathBuf;

/// Creature behavior and hazard resolution simulator
#[derive(Parser, Debug)]
#[command(name = "isocombat")]
#[command(about = "Runs isometric combat scenarios headless")]
#[command(version)]
pub struct Args {
    /// JSON scenario file to run
    #[arg(long, value_name = "SCENARIO_FILE")]
    pub scenario: PathBuf,

    /// Output path for the combat log
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Override the scenario's tick limit
    #[arg(long)]
    pub max_ticks: Option<u64>,

    /// Override the scenario's power definitions file
    #[arg(long, value_name = "POWERS_FILE")]
    pub powers: Option<PathBuf>,
}

pub fn parse_args() -> Args {
    Args::parse()
}
