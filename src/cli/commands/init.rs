//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use super::{EXIT_CONFIG, EXIT_FATAL};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "seed.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing seeder configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        match fs::write(&self.output, Self::generate_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your source file paths", self.output);
                println!("  2. Set SEED_DATABASE_URL in your environment or a .env file");
                println!("  3. Validate configuration: noc-seeder validate-config --check-sources");
                println!("  4. Check the store: noc-seeder health --ensure-schema");
                println!("  5. Run the seeder: noc-seeder seed");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    fn generate_config() -> &'static str {
        r#"# NOC Seeder Configuration File

# Store backend (postgresql or memory)
database_target = "postgresql"

[application]
log_level = "info"
dry_run = false

[postgresql]
connection_string = "${SEED_DATABASE_URL}"
max_connections = 10
connection_timeout_seconds = 30
statement_timeout_seconds = 60
ssl_mode = "prefer"

[sources]
programs_path = "data/programs.json"
unit_groups_path = "data/unit_groups.json"
outlooks_path = "data/outlooks.csv"
outlook_delimiter = ","

[seed]
batch_size = 50
parallel_groups = 4
inter_batch_delay_ms = 100
fanout_concurrency = 8

[seed.entities]
program_areas = true
programs = true
unit_groups = true
outlooks = true
program_links = true

[retry]
max_retries = 3
base_delay_ms = 500

[state]
enable_checkpointing = true
checkpoint_path = ".noc-seeder/checkpoints.json"

[logging]
local_enabled = true
local_path = "./logs"
local_rotation = "daily"
error_log_enabled = true
"#
    }
}
