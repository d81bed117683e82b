//! Store abstraction layer
//!
//! Trait-based abstraction over the seeded store and the checkpoint side
//! channel, plus the factory that picks backends from configuration.

pub mod factory;
pub mod traits;

pub use factory::{create_backends, create_checkpoint_store, create_store, Backends};
pub use traits::{CheckpointStore, SeedStore};
