//! PostgreSQL database integration
//!
//! Pooled `tokio-postgres` client, the [`SeedStore`](crate::adapters::database::SeedStore)
//! implementation on top of it, and the SQLSTATE classification that turns
//! driver failures into store errors.

pub mod adapter;
pub mod client;
pub mod errors;
pub mod models;

pub use adapter::PostgreSQLStore;
pub use client::PostgreSQLClient;
