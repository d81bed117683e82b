//! Health command implementation

use super::{exit_code_for, EXIT_CONFIG, EXIT_CONNECTION};
use crate::adapters::database::create_store;
use crate::config::load_config;
use clap::Args;

/// Arguments for the health command
#[derive(Args, Debug)]
pub struct HealthArgs {
    /// Apply the schema before probing
    #[arg(long)]
    pub ensure_schema: bool,
}

impl HealthArgs {
    /// Execute the health command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        println!("🩺 Checking store health");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let store = match create_store(&config, false) {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to create store");
                println!("   Error: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        if self.ensure_schema {
            if let Err(e) = store.ensure_schema().await {
                println!("❌ Failed to apply schema");
                println!("   Error: {e}");
                return Ok(EXIT_CONNECTION);
            }
            println!("✅ Schema applied");
        }

        match store.health_check().await {
            Ok(health) if health.is_healthy() => {
                println!("✅ {} is healthy", store.backend_name());
                println!("   Response time: {} ms", health.response_time_ms);
                Ok(0)
            }
            Ok(health) => {
                println!("❌ {} reported status '{}'", store.backend_name(), health.status);
                println!("   Response time: {} ms", health.response_time_ms);
                Ok(EXIT_CONNECTION)
            }
            Err(e) => {
                tracing::error!(error = %e, "Health check failed");
                println!("❌ {} is unreachable", store.backend_name());
                println!("   Error: {e}");
                Ok(EXIT_CONNECTION)
            }
        }
    }
}
