//! Seed command implementation
//!
//! Runs the full pipeline: pre-flight, resume calculation and every
//! enabled entity seeder.

use super::{exit_code_for, EXIT_CONFIG};
use crate::adapters::database::create_backends;
use crate::adapters::source::FileSourceProvider;
use crate::config::{load_config, EntityToggles, SeederConfig};
use crate::core::coordinator::RunCoordinator;
use crate::core::report::RunReport;
use crate::domain::EntityKind;
use clap::Args;
use std::sync::Arc;

/// Arguments for the seed command
#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Run against an empty in-memory store; nothing is written
    #[arg(long)]
    pub dry_run: bool,

    /// Seed only these entities (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<EntityKind>,

    /// Do not seed these entities (comma-separated)
    #[arg(long = "skip-entity", value_delimiter = ',')]
    pub skip_entity: Vec<EntityKind>,

    /// Override seed.batch_size
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Override seed.parallel_groups
    #[arg(long)]
    pub parallel_groups: Option<usize>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

impl SeedArgs {
    /// Execute the seed command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if let Err(e) = self.apply_overrides(&mut config) {
            println!("❌ Invalid arguments");
            println!("   Error: {e}");
            return Ok(EXIT_CONFIG);
        }

        let dry_run = self.dry_run || config.application.dry_run;
        if dry_run {
            println!("🧪 Dry run: using an empty in-memory store, nothing will be written");
        }

        let backends = match create_backends(&config, dry_run) {
            Ok(b) => b,
            Err(e) => {
                println!("❌ Failed to create store");
                println!("   Error: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let sources = Arc::new(FileSourceProvider::new(&config.sources));
        let coordinator = RunCoordinator::new(&config, backends, sources, dry_run);
        println!("🚀 Seeding run {}", coordinator.run_id());

        match coordinator.run().await {
            Ok(report) => {
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print_report(&report);
                }
                Ok(report.exit_code())
            }
            Err(e) => {
                tracing::error!(error = %e, "Seeding run aborted");
                println!("❌ Seeding run aborted");
                println!("   Error: {e}");
                Ok(exit_code_for(&e))
            }
        }
    }

    /// Apply entity selection and tuning overrides, then re-validate
    fn apply_overrides(&self, config: &mut SeederConfig) -> Result<(), String> {
        if let Some(nested) = self
            .only
            .iter()
            .chain(&self.skip_entity)
            .find(|kind| !kind.is_seeded())
        {
            return Err(format!(
                "{nested} is seeded with its parent entity and cannot be selected on its own"
            ));
        }

        if !self.only.is_empty() {
            config.seed.entities = EntityToggles::only(&self.only);
        }
        for kind in &self.skip_entity {
            config.seed.entities.set(*kind, false);
        }
        if let Some(batch_size) = self.batch_size {
            config.seed.batch_size = batch_size;
        }
        if let Some(parallel_groups) = self.parallel_groups {
            config.seed.parallel_groups = parallel_groups;
        }

        config.validate()
    }
}

fn print_report(report: &RunReport) {
    println!();
    println!(
        "{:<16} {:>10} {:>10} {:>10} {:>10}",
        "Entity", "Skip", "Created", "Skipped", "Errors"
    );
    println!("{}", "-".repeat(60));
    for result in &report.results {
        match &result.failure {
            Some(failure) => println!("{:<16} ❌ {failure}", result.entity.as_str()),
            None => println!(
                "{:<16} {:>10} {:>10} {:>10} {:>10}",
                result.entity.as_str(),
                result.skip,
                result.created,
                result.skipped,
                result.errors
            ),
        }
    }
    println!("{}", "-".repeat(60));
    println!(
        "Total: {} created, {} skipped, {} processed in {:.2}s",
        report.total_created, report.total_skipped, report.total_processed, report.elapsed_seconds
    );
    if report.success {
        println!("✅ Seeding completed");
    } else {
        println!("⚠️  Seeding completed with errors, see the log for details");
    }
}
