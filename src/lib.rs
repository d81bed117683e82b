// NOC Seeder - Resumable loader for occupational classification data
// Copyright (c) 2025 NOC Seeder Contributors
// Licensed under the MIT License

//! # NOC Seeder
//!
//! Loads occupational classification unit groups, regional employment
//! outlooks and educational programs from source files into a relational
//! store, and links programs to the unit groups they lead to.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Reading** program and unit group JSON and the outlook spreadsheet
//! - **Normalizing** classification codes, ratings, dates and credentials
//! - **Writing** every entity through idempotent upserts with retry
//! - **Resuming** interrupted runs from stored row counts
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Run coordinator, resume calculation, batch executor, seeders
//! - [`adapters`] - Store backends, source readers, checkpoint storage
//! - [`domain`] - Identifiers, records, entities and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use noc_seeder::adapters::database::create_backends;
//! use noc_seeder::adapters::source::FileSourceProvider;
//! use noc_seeder::config::load_config;
//! use noc_seeder::core::coordinator::RunCoordinator;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("seed.toml")?;
//!     let backends = create_backends(&config, false)?;
//!     let sources = Arc::new(FileSourceProvider::new(&config.sources));
//!
//!     let report = RunCoordinator::new(&config, backends, sources, false)
//!         .run()
//!         .await?;
//!
//!     println!("Created {} records", report.total_created);
//!     std::process::exit(report.exit_code());
//! }
//! ```
//!
//! ## Resumption
//!
//! Each entity family is re-read from the start of its source collection
//! and the first `min(stored rows, source length)` records are bypassed.
//! This assumes source order is stable between runs and that earlier runs
//! wrote a prefix of the collection; a checkpoint fingerprint mismatch is
//! logged as a warning.
//!
//! ## Error Handling
//!
//! Fallible operations return [`domain::Result`], backed by
//! [`domain::SeedError`]. Store primitives return [`domain::StoreResult`]
//! so that unique violations, missing rows and transient failures can be
//! told apart by the retry policy.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
