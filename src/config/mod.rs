//! Configuration management for the seeder.
//!
//! # Overview
//!
//! The seeder reads a single TOML file (`seed.toml` by default) with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `SEED_<SECTION>_<KEY>` overrides applied after parsing
//! - Default values for every tuning knob
//! - Validation before anything touches the store
//!
//! # Example Configuration
//!
//! ```toml
//! database_target = "postgresql"
//!
//! [application]
//! log_level = "info"
//!
//! [postgresql]
//! connection_string = "${SEED_DATABASE_URL}"
//! max_connections = 10
//!
//! [sources]
//! programs_path = "data/programs.json"
//! unit_groups_path = "data/unit_groups.json"
//! outlooks_path = "data/outlooks.csv"
//!
//! [seed]
//! batch_size = 50
//! parallel_groups = 4
//! inter_batch_delay_ms = 100
//!
//! [retry]
//! max_retries = 3
//! base_delay_ms = 500
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, DatabaseTarget, EntityToggles, LoggingConfig, PostgreSQLConfig,
    RetryConfig, SeedConfig, SeederConfig, SourcesConfig, StateConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
