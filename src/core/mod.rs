//! Core seeding engine.
//!
//! # Modules
//!
//! - [`coordinator`] - Run coordinator: pre-flight, seeder ordering, report
//! - [`resume`] - Skip offsets from stored row counts
//! - [`executor`] - Bounded-parallel batch executor
//! - [`seeders`] - One seeder per entity family and the shared mapping rules
//! - [`retry`] - Persistence error classification and retry
//! - [`progress`] - Atomic progress counters
//! - [`report`] - Run report and exit status
//! - [`state`] - Checkpoints written after every mega-batch
//!
//! # Example
//!
//! ```rust,no_run
//! use noc_seeder::adapters::database::create_backends;
//! use noc_seeder::adapters::source::FileSourceProvider;
//! use noc_seeder::config::load_config;
//! use noc_seeder::core::coordinator::RunCoordinator;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("seed.toml")?;
//! let backends = create_backends(&config, false)?;
//! let sources = Arc::new(FileSourceProvider::new(&config.sources));
//!
//! let coordinator = RunCoordinator::new(&config, backends, sources, false);
//! let report = coordinator.run().await?;
//!
//! println!("Created: {}", report.total_created);
//! println!("Skipped: {}", report.total_skipped);
//! # Ok(())
//! # }
//! ```

pub mod coordinator;
pub mod executor;
pub mod progress;
pub mod report;
pub mod resume;
pub mod retry;
pub mod seeders;
pub mod state;
