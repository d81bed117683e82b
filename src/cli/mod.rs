//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for the seeder using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// NOC Seeder - resumable loader for classification, outlook and program data
#[derive(Parser, Debug)]
#[command(name = "noc-seeder")]
#[command(version, about, long_about = None)]
#[command(author = "NOC Seeder Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "seed.toml", env = "SEED_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SEED_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Seed the store from the configured source files
    Seed(commands::seed::SeedArgs),

    /// Show stored row counts, checkpoints and the next run's skip offsets
    Status(commands::status::StatusArgs),

    /// Probe store health
    Health(commands::health::HealthArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

impl Commands {
    /// Whether this command runs the pipeline and should log to files
    pub fn uses_file_logging(&self) -> bool {
        matches!(self, Commands::Seed(_))
    }
}
