//! Run report
//!
//! Per-entity results and the overall summary printed at the end of a run.

use crate::core::executor::BatchResult;
use crate::core::progress::ProgressTracker;
use crate::domain::EntityKind;
use serde::Serialize;

/// Exit code for a clean run
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for a run that finished with seeder failures or record errors
pub const EXIT_PARTIAL: i32 = 1;

/// Outcome of one entity seeder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityReport {
    pub entity: EntityKind,
    pub created: usize,
    pub skipped: usize,
    /// Subset of `skipped` caused by failed writes
    pub errors: usize,
    /// Skip offset the seeder started from
    pub skip: usize,
    /// Set when the seeder itself failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl EntityReport {
    pub fn processed(&self) -> usize {
        self.created + self.skipped
    }
}

/// Summary of a whole seeding run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub success: bool,
    pub dry_run: bool,
    pub results: Vec<EntityReport>,
    pub elapsed_seconds: f64,
    pub total_created: usize,
    pub total_skipped: usize,
    pub total_processed: usize,
    /// Records handed to any seeder, including seeders that later failed
    pub records_presented: usize,
}

impl RunReport {
    pub fn new(run_id: impl Into<String>, dry_run: bool) -> Self {
        Self {
            run_id: run_id.into(),
            success: true,
            dry_run,
            results: Vec::new(),
            elapsed_seconds: 0.0,
            total_created: 0,
            total_skipped: 0,
            total_processed: 0,
            records_presented: 0,
        }
    }

    /// Record a seeder that ran to completion
    pub fn record(&mut self, entity: EntityKind, skip: usize, result: BatchResult) {
        self.results.push(EntityReport {
            entity,
            created: result.created,
            skipped: result.skipped,
            errors: result.errors,
            skip,
            failure: None,
        });
        self.total_created += result.created;
        self.total_skipped += result.skipped;
        self.total_processed += result.processed();
        if result.errors > 0 {
            self.success = false;
        }
    }

    /// Record a seeder that failed outright
    pub fn record_failure(&mut self, entity: EntityKind, skip: usize, error: impl ToString) {
        self.results.push(EntityReport {
            entity,
            created: 0,
            skipped: 0,
            errors: 0,
            skip,
            failure: Some(error.to_string()),
        });
        self.success = false;
    }

    /// Take the elapsed time and presented-record count from the run's tracker
    pub fn finish(mut self, progress: &ProgressTracker) -> Self {
        self.elapsed_seconds = progress.elapsed().as_secs_f64();
        self.records_presented = progress.totals().presented;
        self
    }

    pub fn result_for(&self, entity: EntityKind) -> Option<&EntityReport> {
        self.results.iter().find(|r| r.entity == entity)
    }

    pub fn total_errors(&self) -> usize {
        self.results.iter().map(|r| r.errors).sum()
    }

    pub fn exit_code(&self) -> i32 {
        if self.success {
            EXIT_SUCCESS
        } else {
            EXIT_PARTIAL
        }
    }

    /// Log the summary
    pub fn log_summary(&self) {
        for result in &self.results {
            match &result.failure {
                Some(failure) => tracing::error!(
                    entity = %result.entity,
                    error = %failure,
                    "Seeder failed"
                ),
                None => tracing::info!(
                    entity = %result.entity,
                    created = result.created,
                    skipped = result.skipped,
                    errors = result.errors,
                    skip = result.skip,
                    "Seeder finished"
                ),
            }
        }

        tracing::info!(
            run_id = %self.run_id,
            success = self.success,
            dry_run = self.dry_run,
            total_created = self.total_created,
            total_skipped = self.total_skipped,
            total_processed = self.total_processed,
            records_presented = self.records_presented,
            elapsed_secs = format!("{:.2}", self.elapsed_seconds),
            "Seeding run completed"
        );

        let errors = self.total_errors();
        if errors > 0 {
            tracing::warn!(errors = errors, "Some records failed to write");
        }
    }
}
