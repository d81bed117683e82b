// NOC Seeder - Resumable loader for occupational classification data
// Copyright (c) 2025 NOC Seeder Contributors
// Licensed under the MIT License

use clap::Parser;
use noc_seeder::cli::{Cli, Commands};
use noc_seeder::config::{load_config, LoggingConfig};
use noc_seeder::logging::{init_logging, LoggingGuard};
use std::process;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let guard = match setup_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "NOC Seeder - occupational classification loader"
    );

    let exit_code = match execute_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5
        }
    };

    // Flush file appenders before exiting
    drop(guard);
    process::exit(exit_code);
}

/// Initialize logging for the selected command
///
/// The seed command logs to files as configured. Every other command, and a
/// seed command whose configuration cannot be loaded, logs to the console
/// only; the command itself reports the configuration error.
fn setup_logging(cli: &Cli) -> noc_seeder::domain::Result<LoggingGuard> {
    if cli.command.uses_file_logging() {
        if let Ok(config) = load_config(&cli.config) {
            let level = cli
                .log_level
                .clone()
                .unwrap_or(config.application.log_level);
            return init_logging(&level, &config.logging);
        }
    }

    let level = cli.log_level.as_deref().unwrap_or("info");
    init_logging(level, &LoggingConfig::console_only())
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Seed(args) => args.execute(&cli.config).await,
        Commands::Status(args) => args.execute(&cli.config).await,
        Commands::Health(args) => args.execute(&cli.config).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
