//! Checkpoint model for tracking seeding progress
//!
//! A checkpoint is written after every mega-batch of an entity seeder and
//! records how far through the source collection the run got.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress state of one seeding operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointStatus {
    #[default]
    InProgress,
    Completed,
}

/// Resumability checkpoint for one operation (entity family)
///
/// # Examples
///
/// ```
/// use noc_seeder::core::state::checkpoint::{CheckpointBuilder, CheckpointStatus};
///
/// let checkpoint = CheckpointBuilder::new("programs")
///     .processed(40)
///     .total(100)
///     .created_total(38)
///     .skipped_total(2)
///     .build();
///
/// assert_eq!(checkpoint.status, CheckpointStatus::InProgress);
/// assert_eq!(checkpoint.percent_complete(), 40.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Operation name, one per entity family
    pub operation: String,

    /// Run that wrote this checkpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    /// Source records consumed so far, including the skipped prefix
    pub processed: usize,

    /// Size of the source collection
    pub total: usize,

    /// Records created in this run so far
    pub created_total: usize,

    /// Records skipped in this run so far
    pub skipped_total: usize,

    /// SHA-256 of the source file the collection was read from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_fingerprint: Option<String>,

    pub status: CheckpointStatus,

    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn is_completed(&self) -> bool {
        self.status == CheckpointStatus::Completed
    }

    /// Share of the source collection consumed, 0 to 100
    pub fn percent_complete(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.processed.min(self.total) as f64 / self.total as f64) * 100.0
    }
}

/// Builder for creating Checkpoint instances
pub struct CheckpointBuilder {
    operation: String,
    run_id: Option<String>,
    processed: usize,
    total: usize,
    created_total: usize,
    skipped_total: usize,
    source_fingerprint: Option<String>,
}

impl CheckpointBuilder {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            run_id: None,
            processed: 0,
            total: 0,
            created_total: 0,
            skipped_total: 0,
            source_fingerprint: None,
        }
    }

    pub fn run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn processed(mut self, processed: usize) -> Self {
        self.processed = processed;
        self
    }

    pub fn total(mut self, total: usize) -> Self {
        self.total = total;
        self
    }

    pub fn created_total(mut self, created: usize) -> Self {
        self.created_total = created;
        self
    }

    pub fn skipped_total(mut self, skipped: usize) -> Self {
        self.skipped_total = skipped;
        self
    }

    pub fn source_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.source_fingerprint = Some(fingerprint.into());
        self
    }

    /// Builds the checkpoint; it is marked completed once `processed` reaches `total`
    pub fn build(self) -> Checkpoint {
        let status = if self.processed >= self.total {
            CheckpointStatus::Completed
        } else {
            CheckpointStatus::InProgress
        };

        Checkpoint {
            operation: self.operation,
            run_id: self.run_id,
            processed: self.processed,
            total: self.total,
            created_total: self.created_total,
            skipped_total: self.skipped_total,
            source_fingerprint: self.source_fingerprint,
            status,
            updated_at: Utc::now(),
        }
    }
}
