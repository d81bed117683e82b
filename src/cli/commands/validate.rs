//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the seeder configuration file.

use super::EXIT_CONFIG;
use crate::config::schema::{DatabaseTarget, SeederConfig};
use crate::config::load_config;
use crate::domain::EntityKind;
use clap::Args;
use std::path::Path;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Also check that every source file exists
    #[arg(long)]
    pub check_sources: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates before returning
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        print_summary(&config);

        if self.check_sources {
            let missing = missing_sources(&config);
            println!();
            if missing.is_empty() {
                println!("✅ All source files found");
            } else {
                for path in &missing {
                    println!("❌ Source file not found: {path}");
                }
                return Ok(EXIT_CONFIG);
            }
        }

        Ok(0)
    }
}

fn print_summary(config: &SeederConfig) {
    println!();
    println!("Configuration Summary:");
    println!("  Log Level: {}", config.application.log_level);
    println!("  Dry Run: {}", config.application.dry_run);

    match config.database_target {
        DatabaseTarget::PostgreSQL => {
            if let Some(ref pg_config) = config.postgresql {
                use secrecy::ExposeSecret;
                let raw: &str = pg_config.connection_string.expose_secret().as_ref();
                println!("  Database Target: PostgreSQL");
                println!(
                    "  PostgreSQL Connection: {}",
                    raw.split('@').next_back().unwrap_or("***")
                );
                println!("  Max Connections: {}", pg_config.max_connections);
                println!("  SSL Mode: {}", pg_config.ssl_mode);
            }
        }
        DatabaseTarget::Memory => println!("  Database Target: in-memory"),
    }

    println!("  Programs: {}", config.sources.programs_path);
    println!("  Unit Groups: {}", config.sources.unit_groups_path);
    println!("  Outlooks: {}", config.sources.outlooks_path);
    println!("  Batch Size: {}", config.seed.batch_size);
    println!("  Parallel Groups: {}", config.seed.parallel_groups);
    println!("  Inter-batch Delay: {} ms", config.seed.inter_batch_delay_ms);
    println!(
        "  Retries: {} (base delay {} ms)",
        config.retry.max_retries, config.retry.base_delay_ms
    );

    let enabled: Vec<&str> = EntityKind::SEEDED
        .into_iter()
        .filter(|kind| config.seed.entities.is_enabled(*kind))
        .map(|kind| kind.as_str())
        .collect();
    println!("  Entities: {}", enabled.join(", "));
    println!("  Checkpointing: {}", config.state.enable_checkpointing);
}

fn missing_sources(config: &SeederConfig) -> Vec<String> {
    [
        &config.sources.programs_path,
        &config.sources.unit_groups_path,
        &config.sources.outlooks_path,
    ]
    .into_iter()
    .filter(|path| !Path::new(path.as_str()).exists())
    .cloned()
    .collect()
}
