//! Store factory
//!
//! Selects the store and checkpoint backends from configuration.

use crate::adapters::checkpoint::FileCheckpointStore;
use crate::adapters::database::traits::{CheckpointStore, SeedStore};
use crate::adapters::memory::{MemoryCheckpointStore, MemoryStore};
use crate::adapters::postgresql::adapter::PostgreSQLStore;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::config::schema::{DatabaseTarget, SeederConfig};
use crate::domain::{Result, SeedError};
use std::sync::Arc;

/// Store and checkpoint backends for one run
pub struct Backends {
    pub store: Arc<dyn SeedStore + Send + Sync>,
    /// `None` when checkpointing is disabled
    pub checkpoints: Option<Arc<dyn CheckpointStore + Send + Sync>>,
    /// Concurrency ceiling imposed by the store's connection pool
    pub connection_ceiling: Option<usize>,
}

/// Create the store selected by `database_target`
///
/// With `dry_run` set, an empty in-memory store is returned whatever the
/// target, so nothing is written.
///
/// # Errors
///
/// Returns an error if the PostgreSQL section is missing or the client
/// cannot be created.
pub fn create_store(
    config: &SeederConfig,
    dry_run: bool,
) -> Result<Arc<dyn SeedStore + Send + Sync>> {
    if dry_run {
        tracing::info!("DRY RUN: using an empty in-memory store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    match config.database_target {
        DatabaseTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                SeedError::Configuration(
                    "postgresql configuration is required when database_target = 'postgresql'"
                        .to_string(),
                )
            })?;

            tracing::info!("Creating PostgreSQL store");
            let client = PostgreSQLClient::new(pg_config.clone())?;
            tracing::debug!(target_db = %client.connection_string_safe(), "PostgreSQL pool ready");
            Ok(Arc::new(PostgreSQLStore::new(client)))
        }
        DatabaseTarget::Memory => {
            tracing::info!("Creating in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Create the checkpoint store, if checkpointing is enabled
///
/// Only a PostgreSQL run outside dry-run mode writes the checkpoint file;
/// every other combination keeps checkpoints in memory.
pub fn create_checkpoint_store(
    config: &SeederConfig,
    dry_run: bool,
) -> Option<Arc<dyn CheckpointStore + Send + Sync>> {
    if !config.state.enable_checkpointing {
        return None;
    }

    if !dry_run && config.database_target == DatabaseTarget::PostgreSQL {
        tracing::info!(path = %config.state.checkpoint_path, "Using checkpoint file");
        Some(Arc::new(FileCheckpointStore::new(&config.state.checkpoint_path)))
    } else {
        Some(Arc::new(MemoryCheckpointStore::new()))
    }
}

/// Create both backends for a run
///
/// # Errors
///
/// Returns an error if the store cannot be created.
pub fn create_backends(config: &SeederConfig, dry_run: bool) -> Result<Backends> {
    let store = create_store(config, dry_run)?;
    let checkpoints = create_checkpoint_store(config, dry_run);
    let connection_ceiling = if dry_run {
        None
    } else {
        config.connection_ceiling()
    };

    Ok(Backends {
        store,
        checkpoints,
        connection_ceiling,
    })
}
