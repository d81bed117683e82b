//! Progress tracking across seeders
//!
//! One [`ProgressTracker`] is owned by the run coordinator and shared with
//! the batch executor. Counters are atomics so concurrently running groups
//! can update them without locks.

use crate::core::executor::RecordOutcome;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Live counters for one operation
#[derive(Debug, Default)]
pub struct EntityCounters {
    created: AtomicUsize,
    skipped: AtomicUsize,
    errors: AtomicUsize,
    presented: AtomicUsize,
    skip: AtomicUsize,
    total: AtomicUsize,
}

impl EntityCounters {
    fn new(total: usize, skip: usize) -> Self {
        let counters = Self::default();
        counters.total.store(total, Ordering::SeqCst);
        counters.skip.store(skip, Ordering::SeqCst);
        counters
    }

    /// Count one record presented to the processing function
    ///
    /// Errors are folded into `skipped` and also counted in `errors`.
    pub fn record(&self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Created => {
                self.created.fetch_add(1, Ordering::SeqCst);
            }
            RecordOutcome::Skipped => {
                self.skipped.fetch_add(1, Ordering::SeqCst);
            }
            RecordOutcome::Error => {
                self.skipped.fetch_add(1, Ordering::SeqCst);
                self.errors.fetch_add(1, Ordering::SeqCst);
            }
        }
        self.presented.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> EntityProgress {
        EntityProgress {
            created: self.created.load(Ordering::SeqCst),
            skipped: self.skipped.load(Ordering::SeqCst),
            errors: self.errors.load(Ordering::SeqCst),
            presented: self.presented.load(Ordering::SeqCst),
            skip: self.skip.load(Ordering::SeqCst),
            total: self.total.load(Ordering::SeqCst),
        }
    }
}

/// Point-in-time copy of one operation's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EntityProgress {
    pub created: usize,
    pub skipped: usize,
    /// Subset of `skipped` that failed in the store
    pub errors: usize,
    /// Records handed to the processing function this run
    pub presented: usize,
    /// Leading records bypassed by the skip offset
    pub skip: usize,
    /// Size of the source collection
    pub total: usize,
}

impl EntityProgress {
    /// Position in the source collection, skip included
    pub fn position(&self) -> usize {
        self.skip + self.presented
    }
}

/// Aggregates counters for every operation in a run
#[derive(Debug)]
pub struct ProgressTracker {
    started: Instant,
    entries: Mutex<BTreeMap<String, Arc<EntityCounters>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Start (or restart) tracking an operation and return its counters
    pub fn begin(&self, operation: &str, total: usize, skip: usize) -> Arc<EntityCounters> {
        let counters = Arc::new(EntityCounters::new(total, skip));
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(operation.to_string(), Arc::clone(&counters));
        counters
    }

    /// Snapshots of every tracked operation, ordered by name
    fn snapshots(&self) -> Vec<(String, EntityProgress)> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(name, counters)| (name.clone(), counters.snapshot()))
            .collect()
    }

    /// Sum over every tracked operation
    pub fn totals(&self) -> EntityProgress {
        self.snapshots()
            .into_iter()
            .fold(EntityProgress::default(), |acc, (_, p)| EntityProgress {
                created: acc.created + p.created,
                skipped: acc.skipped + p.skipped,
                errors: acc.errors + p.errors,
                presented: acc.presented + p.presented,
                skip: acc.skip + p.skip,
                total: acc.total + p.total,
            })
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
