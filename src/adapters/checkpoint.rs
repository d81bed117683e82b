//! JSON file checkpoint store
//!
//! Keeps the latest checkpoint per operation in one JSON document. Writes
//! go to a sibling temporary file that is then renamed over the original.

use crate::adapters::database::traits::CheckpointStore;
use crate::core::state::checkpoint::Checkpoint;
use crate::domain::{Result, SeedError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// [`CheckpointStore`] backed by a JSON file on local disk
pub struct FileCheckpointStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, Checkpoint>> {
        match self.read_contents().await? {
            Some(contents) => self.parse(&contents),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Existing checkpoints to merge a write into
    ///
    /// An unparsable file is replaced rather than blocking every later write.
    async fn read_for_update(&self) -> Result<BTreeMap<String, Checkpoint>> {
        let Some(contents) = self.read_contents().await? else {
            return Ok(BTreeMap::new());
        };
        match self.parse(&contents) {
            Ok(checkpoints) => Ok(checkpoints),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Discarding unreadable checkpoint file"
                );
                Ok(BTreeMap::new())
            }
        }
    }

    async fn read_contents(&self) -> Result<Option<String>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SeedError::State(format!(
                    "Failed to read checkpoint file {}: {e}",
                    self.path.display()
                )))
            }
        };

        if contents.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(contents))
    }

    fn parse(&self, contents: &str) -> Result<BTreeMap<String, Checkpoint>> {
        serde_json::from_str(contents).map_err(|e| {
            SeedError::State(format!(
                "Checkpoint file {} is not valid JSON: {e}",
                self.path.display()
            ))
        })
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn write_checkpoint(&self, checkpoint: &Checkpoint) -> Result<()> {
        let _lock = self.write_lock.lock().await;

        let mut checkpoints = self.read_for_update().await?;
        checkpoints.insert(checkpoint.operation.clone(), checkpoint.clone());
        let body = serde_json::to_string_pretty(&checkpoints)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, body).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    async fn load_checkpoint(&self, operation: &str) -> Result<Option<Checkpoint>> {
        Ok(self.read_all().await?.remove(operation))
    }

    async fn load_all(&self) -> Result<Vec<Checkpoint>> {
        Ok(self.read_all().await?.into_values().collect())
    }
}
