//! Status command implementation
//!
//! This module implements the `status` command: stored row counts,
//! checkpoints of earlier runs and the skip offsets the next run would use.

use super::{EXIT_CONFIG, EXIT_CONNECTION};
use crate::adapters::database::create_backends;
use crate::adapters::source::FileSourceProvider;
use crate::config::load_config;
use crate::core::coordinator::RunCoordinator;
use crate::core::resume::SkipPlan;
use crate::core::state::checkpoint::Checkpoint;
use crate::domain::EntityKind;
use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the status as JSON
    #[arg(long)]
    pub json: bool,
}

/// Everything the status command reports
#[derive(Debug, Serialize)]
struct StatusReport {
    counts: BTreeMap<EntityKind, Option<u64>>,
    checkpoints: Vec<Checkpoint>,
    skip_plan: SkipPlan,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking seeding status");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let backends = match create_backends(&config, false) {
            Ok(b) => b,
            Err(e) => {
                println!("❌ Failed to connect to database");
                println!("   Error: {e}");
                return Ok(EXIT_CONNECTION);
            }
        };

        let mut counts = BTreeMap::new();
        for kind in EntityKind::ALL {
            let count = match backends.store.count(kind).await {
                Ok(n) => Some(n),
                Err(e) => {
                    tracing::warn!(entity = %kind, error = %e, "Count failed");
                    None
                }
            };
            counts.insert(kind, count);
        }

        let checkpoints = match &backends.checkpoints {
            Some(storage) => storage.load_all().await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to load checkpoints");
                Vec::new()
            }),
            None => Vec::new(),
        };

        let sources = Arc::new(FileSourceProvider::new(&config.sources));
        let skip_plan = RunCoordinator::new(&config, backends, sources, false)
            .skip_plan()
            .await;

        let report = StatusReport {
            counts,
            checkpoints,
            skip_plan,
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_status(&report);
        }

        if report.counts.values().all(Option::is_none) {
            return Ok(EXIT_CONNECTION);
        }
        Ok(0)
    }
}

fn print_status(report: &StatusReport) {
    println!("📊 Seeding Status");
    println!();
    println!(
        "{:<22} {:>10} {:>10} {:>10} {:>10}",
        "Entity", "Stored", "Source", "Next skip", "Remaining"
    );
    println!("{}", "-".repeat(66));
    for (kind, count) in &report.counts {
        let stored = count.map_or_else(|| "?".to_string(), |n| n.to_string());
        match report.skip_plan.entry(*kind) {
            Some(entry) => println!(
                "{:<22} {:>10} {:>10} {:>10} {:>10}{}",
                kind.as_str(),
                stored,
                entry.source_len,
                entry.skip,
                entry.remaining(),
                if entry.capped { "  (capped)" } else { "" }
            ),
            None => println!("{:<22} {:>10}", kind.as_str(), stored),
        }
    }

    if report.skip_plan.fell_back {
        println!();
        println!("⚠️  Skip calculation failed; the next run would start every entity from zero");
    }

    println!();
    if report.checkpoints.is_empty() {
        println!("No checkpoints found.");
        println!("Run 'noc-seeder seed' to start seeding.");
        return;
    }

    println!("Checkpoints:");
    for checkpoint in &report.checkpoints {
        let status = if checkpoint.is_completed() {
            "✅"
        } else {
            "⏳"
        };
        println!(
            "  {status} {:<20} {}/{} ({:.1}%)  created {}  skipped {}  updated {}",
            checkpoint.operation,
            checkpoint.processed,
            checkpoint.total,
            checkpoint.percent_complete(),
            checkpoint.created_total,
            checkpoint.skipped_total,
            checkpoint.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
}
