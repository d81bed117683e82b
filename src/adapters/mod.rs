//! External system integrations.
//!
//! - [`source`] - Source file providers (JSON collections, outlook spreadsheet)
//! - [`database`] - Store and checkpoint traits with the backend factory
//! - [`postgresql`] - PostgreSQL store
//! - [`memory`] - In-memory store used for dry runs and tests
//! - [`checkpoint`] - JSON file checkpoint store
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies behind traits so the seeding core
//! never sees a driver type:
//!
//! ```rust
//! use noc_seeder::adapters::database::SeedStore;
//! use noc_seeder::adapters::memory::MemoryStore;
//! use noc_seeder::domain::EntityKind;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! assert_eq!(store.count(EntityKind::Program).await?, 0);
//! # Ok(())
//! # }
//! ```

pub mod checkpoint;
pub mod database;
pub mod memory;
pub mod postgresql;
pub mod source;
