//! Batch executor
//!
//! Applies a per-record processing function to every record after a skip
//! offset. The remaining records are cut into groups of `batch_size`; up to
//! `parallel_groups` groups form a mega-batch and run concurrently, while
//! the records inside a group run one after another. Mega-batches run
//! strictly in sequence, separated by `inter_batch_delay`, and each one
//! ends with a progress line and a checkpoint.

use crate::config::SeedConfig;
use crate::core::progress::{EntityCounters, ProgressTracker};
use crate::core::state::CheckpointManager;
use crate::domain::Result;
use futures::future::join_all;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// What happened to one record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    /// Written to the store
    Created,
    /// Invalid, missing a dependency, or already present
    Skipped,
    /// The write failed after retries
    Error,
}

/// Aggregated outcome counts for one operation
///
/// `errors` is a subset of `skipped`: callers see errors folded into the
/// skipped tally, logs keep them apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub created: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one record
    pub fn add(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Created => self.created += 1,
            RecordOutcome::Skipped => self.skipped += 1,
            RecordOutcome::Error => {
                self.skipped += 1;
                self.errors += 1;
            }
        }
    }

    /// Records presented to the processing function
    pub fn processed(&self) -> usize {
        self.created + self.skipped
    }

    /// Merge another batch result into this one
    pub fn merge(&mut self, other: BatchResult) {
        self.created += other.created;
        self.skipped += other.skipped;
        self.errors += other.errors;
    }
}

/// Tuning parameters of the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorSettings {
    pub batch_size: usize,
    pub parallel_groups: usize,
    pub inter_batch_delay: Duration,
}

impl ExecutorSettings {
    pub fn new(batch_size: usize, parallel_groups: usize, inter_batch_delay: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            parallel_groups: parallel_groups.max(1),
            inter_batch_delay,
        }
    }

    /// Build settings from `[seed]`, capping parallelism at the store's
    /// connection ceiling
    pub fn from_config(config: &SeedConfig, connection_ceiling: Option<usize>) -> Self {
        let requested = config.parallel_groups;
        let parallel_groups = match connection_ceiling {
            Some(ceiling) if requested > ceiling => {
                tracing::warn!(
                    requested = requested,
                    ceiling = ceiling,
                    "parallel_groups exceeds the connection pool size, capping"
                );
                ceiling
            }
            _ => requested,
        };

        Self::new(
            config.batch_size,
            parallel_groups,
            Duration::from_millis(config.inter_batch_delay_ms),
        )
    }
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self::from_config(&SeedConfig::default(), None)
    }
}

/// Generic bounded-parallel bulk applier
///
/// The executor knows nothing about entity types; seeders hand it a slice
/// of records and a closure.
pub struct BatchExecutor {
    settings: ExecutorSettings,
    checkpoints: Arc<CheckpointManager>,
    progress: Arc<ProgressTracker>,
}

impl BatchExecutor {
    pub fn new(
        settings: ExecutorSettings,
        checkpoints: Arc<CheckpointManager>,
        progress: Arc<ProgressTracker>,
    ) -> Self {
        Self {
            settings,
            checkpoints,
            progress,
        }
    }

    /// Apply `process` to every record at index `skip` or later
    ///
    /// Each such record is presented exactly once. A skip offset larger
    /// than the collection is clamped, so nothing is processed.
    pub async fn run<'a, T, F, Fut>(
        &self,
        operation: &str,
        records: &'a [T],
        skip: usize,
        process: F,
    ) -> BatchResult
    where
        T: Sync,
        F: Fn(&'a T) -> Fut,
        Fut: Future<Output = Result<RecordOutcome>>,
    {
        let total = records.len();
        let skip = skip.min(total);
        let remaining = &records[skip..];
        let counters = self.progress.begin(operation, total, skip);

        let groups: Vec<&'a [T]> = remaining.chunks(self.settings.batch_size).collect();
        let mega_batches: Vec<&[&'a [T]]> =
            groups.chunks(self.settings.parallel_groups).collect();

        tracing::info!(
            operation = %operation,
            total = total,
            skip = skip,
            remaining = remaining.len(),
            groups = groups.len(),
            mega_batches = mega_batches.len(),
            "Starting batch execution"
        );

        if mega_batches.is_empty() {
            self.checkpoint(operation, &counters).await;
        }

        let last = mega_batches.len().saturating_sub(1);
        for (index, mega_batch) in mega_batches.iter().enumerate() {
            join_all(
                mega_batch
                    .iter()
                    .map(|group| run_group(operation, *group, &process, &counters)),
            )
            .await;

            let snapshot = counters.snapshot();
            crate::log_batch_progress!(operation, snapshot.position(), total);
            self.checkpoint(operation, &counters).await;

            if index < last && !self.settings.inter_batch_delay.is_zero() {
                tokio::time::sleep(self.settings.inter_batch_delay).await;
            }
        }

        let snapshot = counters.snapshot();
        let result = BatchResult {
            created: snapshot.created,
            skipped: snapshot.skipped,
            errors: snapshot.errors,
        };

        tracing::info!(
            operation = %operation,
            created = result.created,
            skipped = result.skipped,
            errors = result.errors,
            "Batch execution finished"
        );

        result
    }

    async fn checkpoint(&self, operation: &str, counters: &EntityCounters) {
        let snapshot = counters.snapshot();
        self.checkpoints
            .record(
                operation,
                snapshot.position(),
                snapshot.total,
                snapshot.created,
                snapshot.skipped,
            )
            .await;
    }
}

/// Runs one group sequentially
///
/// The first unexpected error switches the group to per-record mode: the
/// failing record is counted as an error and every later record is still
/// attempted on its own.
async fn run_group<'a, T, F, Fut>(
    operation: &str,
    group: &'a [T],
    process: &F,
    counters: &EntityCounters,
) where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = Result<RecordOutcome>>,
{
    let mut records = group.iter().enumerate();

    for (position, record) in records.by_ref() {
        match process(record).await {
            Ok(outcome) => counters.record(outcome),
            Err(e) => {
                tracing::warn!(
                    operation = %operation,
                    position = position,
                    group_size = group.len(),
                    error = %e,
                    "Group failed mid-iteration, falling back to per-record processing"
                );
                counters.record(RecordOutcome::Error);
                break;
            }
        }
    }

    for (position, record) in records {
        match process(record).await {
            Ok(outcome) => counters.record(outcome),
            Err(e) => {
                tracing::error!(
                    operation = %operation,
                    position = position,
                    error = %e,
                    "Record failed during fallback"
                );
                counters.record(RecordOutcome::Error);
            }
        }
    }
}
