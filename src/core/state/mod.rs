// Checkpoint model and best-effort checkpoint persistence

pub mod checkpoint;
pub mod manager;

pub use checkpoint::{Checkpoint, CheckpointBuilder, CheckpointStatus};
pub use manager::CheckpointManager;
