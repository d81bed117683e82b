//! Checkpoint manager
//!
//! Wraps a [`CheckpointStore`] with the best-effort write policy: a failed
//! checkpoint write is logged and swallowed, never surfaced to the seeder.

use crate::adapters::database::traits::CheckpointStore;
use crate::core::state::checkpoint::{Checkpoint, CheckpointBuilder};
use crate::domain::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Best-effort writer and reader of resumability checkpoints
pub struct CheckpointManager {
    storage: Option<Arc<dyn CheckpointStore + Send + Sync>>,
    run_id: String,
    fingerprints: HashMap<String, String>,
}

impl CheckpointManager {
    /// Create a manager that writes to `storage`
    pub fn new_with_storage(
        storage: Arc<dyn CheckpointStore + Send + Sync>,
        run_id: impl Into<String>,
    ) -> Self {
        Self {
            storage: Some(storage),
            run_id: run_id.into(),
            fingerprints: HashMap::new(),
        }
    }

    /// Create a manager that discards every checkpoint
    pub fn disabled(run_id: impl Into<String>) -> Self {
        Self {
            storage: None,
            run_id: run_id.into(),
            fingerprints: HashMap::new(),
        }
    }

    /// Attach source fingerprints, keyed by operation name, to stamp on checkpoints
    pub fn with_fingerprints(mut self, fingerprints: HashMap<String, String>) -> Self {
        self.fingerprints = fingerprints;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.storage.is_some()
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Persist progress for one operation
    ///
    /// Failures are logged at warn level and otherwise ignored.
    pub async fn record(
        &self,
        operation: &str,
        processed: usize,
        total: usize,
        created_total: usize,
        skipped_total: usize,
    ) {
        let Some(storage) = &self.storage else {
            return;
        };

        let mut builder = CheckpointBuilder::new(operation)
            .run_id(self.run_id.clone())
            .processed(processed)
            .total(total)
            .created_total(created_total)
            .skipped_total(skipped_total);
        if let Some(fingerprint) = self.fingerprints.get(operation) {
            builder = builder.source_fingerprint(fingerprint.clone());
        }
        let checkpoint = builder.build();

        tracing::debug!(
            operation = %operation,
            processed = processed,
            total = total,
            "Writing checkpoint"
        );

        if let Err(e) = storage.write_checkpoint(&checkpoint).await {
            tracing::warn!(
                operation = %operation,
                error = %e,
                "Failed to write checkpoint, continuing"
            );
        }
    }

    /// Load the latest checkpoint for one operation
    ///
    /// # Errors
    ///
    /// Returns an error if the checkpoint store cannot be read.
    pub async fn load(&self, operation: &str) -> Result<Option<Checkpoint>> {
        match &self.storage {
            Some(storage) => storage.load_checkpoint(operation).await,
            None => Ok(None),
        }
    }

    /// Load every stored checkpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the checkpoint store cannot be read.
    pub async fn load_all(&self) -> Result<Vec<Checkpoint>> {
        match &self.storage {
            Some(storage) => storage.load_all().await,
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryCheckpointStore;

    #[tokio::test]
    async fn test_record_stamps_run_and_fingerprint() {
        let store = Arc::new(MemoryCheckpointStore::new());
        let manager = CheckpointManager::new_with_storage(store.clone(), "run-42")
            .with_fingerprints(HashMap::from([(
                "programs".to_string(),
                "deadbeef".to_string(),
            )]));

        manager.record("programs", 10, 20, 9, 1).await;

        let checkpoint = manager.load("programs").await.unwrap().unwrap();
        assert_eq!(checkpoint.run_id.as_deref(), Some("run-42"));
        assert_eq!(checkpoint.source_fingerprint.as_deref(), Some("deadbeef"));
        assert_eq!(checkpoint.processed, 10);
        assert_eq!(checkpoint.created_total, 9);
    }

    #[tokio::test]
    async fn test_failed_write_is_swallowed() {
        let store = Arc::new(MemoryCheckpointStore::new());
        store.fail_writes(true);
        let manager = CheckpointManager::new_with_storage(store.clone(), "run-1");

        manager.record("outlooks", 1, 2, 1, 0).await;

        assert!(manager.load("outlooks").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disabled_manager_is_noop() {
        let manager = CheckpointManager::disabled("run-1");
        assert!(!manager.is_enabled());
        manager.record("programs", 1, 1, 1, 0).await;
        assert!(manager.load_all().await.unwrap().is_empty());
    }
}
