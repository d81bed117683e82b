//! Resume calculator
//!
//! Derives per-entity skip offsets from the row counts already in the
//! store, clamped to the size of each entity's source collection.
//!
//! A skip offset of `N` assumes the first `N` source records are the ones
//! already stored, which only holds while the source files keep their
//! record order between runs. Nothing here can verify that; the source
//! fingerprints stamped on checkpoints are compared instead, and a changed
//! file is reported as a warning. Because every write is an upsert, the
//! safe direction for any doubt is a smaller skip.

use crate::adapters::database::SeedStore;
use crate::adapters::source::SourceSet;
use crate::core::seeders::mapping::{extract_program_areas, flatten_links};
use crate::core::state::CheckpointManager;
use crate::domain::{EntityKind, SeedError};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Skip decision for one entity family
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SkipEntry {
    /// Rows in the store, `None` when the count failed
    pub stored: Option<u64>,
    /// Size of the source collection
    pub source_len: usize,
    /// Leading source records this run bypasses
    pub skip: usize,
    /// The stored count exceeded the source size
    pub capped: bool,
    /// The source file changed since the last checkpoint
    pub fingerprint_changed: bool,
}

impl SkipEntry {
    fn from_count(stored: Option<u64>, source_len: usize) -> Self {
        let candidate = stored.map_or(0, |count| usize::try_from(count).unwrap_or(usize::MAX));
        Self {
            stored,
            source_len,
            skip: candidate.min(source_len),
            capped: candidate > source_len,
            fingerprint_changed: false,
        }
    }

    /// Records the coming run will present to the seeder
    pub fn remaining(&self) -> usize {
        self.source_len - self.skip
    }
}

/// Skip offsets for every seeded entity family
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SkipPlan {
    pub entries: BTreeMap<EntityKind, SkipEntry>,
    /// Counts of the nested families, for diagnostics only
    pub diagnostics: BTreeMap<EntityKind, Option<u64>>,
    /// The calculation failed and every skip fell back to zero
    pub fell_back: bool,
}

impl SkipPlan {
    /// A plan that processes everything from scratch
    pub fn zero() -> Self {
        Self {
            entries: EntityKind::SEEDED
                .into_iter()
                .map(|kind| (kind, SkipEntry::default()))
                .collect(),
            diagnostics: BTreeMap::new(),
            fell_back: true,
        }
    }

    pub fn skip_for(&self, kind: EntityKind) -> usize {
        self.entries.get(&kind).map_or(0, |entry| entry.skip)
    }

    pub fn entry(&self, kind: EntityKind) -> Option<&SkipEntry> {
        self.entries.get(&kind)
    }

    /// Emit the human-readable summary
    pub fn log_summary(&self) {
        if self.fell_back {
            tracing::warn!("Resume calculation failed, processing every entity from the start");
        }

        for (kind, entry) in &self.entries {
            tracing::info!(
                entity = %kind,
                stored = ?entry.stored,
                source = entry.source_len,
                skip = entry.skip,
                remaining = entry.remaining(),
                "Resume offset"
            );
            if entry.capped {
                tracing::warn!(
                    entity = %kind,
                    stored = ?entry.stored,
                    source = entry.source_len,
                    "Stored rows exceed the source size, skip capped"
                );
            }
        }

        for (kind, count) in &self.diagnostics {
            tracing::info!(entity = %kind, stored = ?count, "Nested entity count");
        }
    }
}

/// Size of each seeded entity's source collection
///
/// Program areas and links are derived collections; their sizes are those
/// of the collections the seeders iterate.
pub fn source_sizes(sources: &SourceSet) -> HashMap<EntityKind, usize> {
    HashMap::from([
        (
            EntityKind::ProgramArea,
            extract_program_areas(&sources.programs).len(),
        ),
        (EntityKind::Program, sources.programs.len()),
        (EntityKind::UnitGroup, sources.unit_groups.len()),
        (EntityKind::Outlook, sources.outlooks.len()),
        (EntityKind::ProgramLink, flatten_links(&sources.programs).len()),
    ])
}

/// Computes a [`SkipPlan`] from live store state
///
/// The calculator works on the [`SourceSet`] the seeders will iterate, so
/// skips are clamped against exactly the records the run presents.
pub struct ResumeCalculator {
    store: Arc<dyn SeedStore + Send + Sync>,
    checkpoints: Arc<CheckpointManager>,
}

impl ResumeCalculator {
    pub fn new(
        store: Arc<dyn SeedStore + Send + Sync>,
        checkpoints: Arc<CheckpointManager>,
    ) -> Self {
        Self { store, checkpoints }
    }

    /// Compute the plan, never failing
    ///
    /// A failed count zeroes that entity's skip. An unreadable checkpoint
    /// only disables the source change check.
    pub async fn calculate(
        &self,
        sources: &SourceSet,
        fingerprints: &HashMap<EntityKind, String>,
    ) -> SkipPlan {
        let sizes = source_sizes(sources);

        let mut plan = SkipPlan::default();
        for kind in EntityKind::SEEDED {
            let stored = self.stored_count(kind).await;
            let mut entry =
                SkipEntry::from_count(stored, sizes.get(&kind).copied().unwrap_or_default());

            if entry.skip > 0 {
                entry.fingerprint_changed =
                    self.fingerprint_changed(kind, fingerprints.get(&kind)).await;
            }
            plan.entries.insert(kind, entry);
        }

        for kind in [EntityKind::UnitGroupSection, EntityKind::EconomicRegion] {
            plan.diagnostics.insert(kind, self.stored_count(kind).await);
        }

        plan.log_summary();
        plan
    }

    /// The plan used when the sources could not be read at all
    pub fn fallback(error: &SeedError) -> SkipPlan {
        tracing::error!(error = %error, "Resume calculation failed");
        let plan = SkipPlan::zero();
        plan.log_summary();
        plan
    }

    async fn stored_count(&self, kind: EntityKind) -> Option<u64> {
        match self.store.count(kind).await {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::error!(entity = %kind, error = %e, "Count failed, skip defaults to 0");
                None
            }
        }
    }

    /// Compares the current fingerprint with the last checkpointed one
    async fn fingerprint_changed(&self, kind: EntityKind, current: Option<&String>) -> bool {
        let Some(current) = current else {
            return false;
        };
        let previous = match self.checkpoints.load(kind.as_str()).await {
            Ok(checkpoint) => checkpoint.and_then(|checkpoint| checkpoint.source_fingerprint),
            Err(e) => {
                tracing::warn!(
                    entity = %kind,
                    error = %e,
                    "Could not read checkpoint, source change check skipped"
                );
                return false;
            }
        };

        match previous {
            Some(previous) if &previous != current => {
                tracing::warn!(
                    entity = %kind,
                    previous = %previous,
                    current = %current,
                    "Source file changed since the last run; count-based skip assumes unchanged record order"
                );
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::checkpoint::FileCheckpointStore;
    use crate::adapters::memory::{MemoryCheckpointStore, MemoryStore};
    use crate::domain::{ProgramArea, ProgramRecord};
    use tempfile::TempDir;

    fn sources(programs: usize) -> SourceSet {
        SourceSet {
            programs: (0..programs)
                .map(|i| ProgramRecord {
                    program_id: Some(format!("p{i}")),
                    program_area_id: Some(format!("a{}", i % 2)),
                    known_noc_groups: vec!["21232".to_string(), "311".to_string()],
                    ..ProgramRecord::default()
                })
                .collect(),
            ..SourceSet::default()
        }
    }

    fn calculator(store: Arc<MemoryStore>) -> ResumeCalculator {
        ResumeCalculator::new(store, Arc::new(CheckpointManager::disabled("test")))
    }

    async fn store_with_areas(n: usize) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for i in 0..n {
            store
                .upsert_program_area(&ProgramArea {
                    external_id: format!("x{i}"),
                    title: "Area".to_string(),
                })
                .await
                .unwrap();
        }
        store
    }

    #[test]
    fn test_source_sizes() {
        let sizes = source_sizes(&sources(5));
        assert_eq!(sizes[&EntityKind::ProgramArea], 2);
        assert_eq!(sizes[&EntityKind::Program], 5);
        assert_eq!(sizes[&EntityKind::ProgramLink], 10);
        assert_eq!(sizes[&EntityKind::Outlook], 0);
    }

    #[tokio::test]
    async fn test_empty_store_skips_nothing() {
        let plan = calculator(Arc::new(MemoryStore::new()))
            .calculate(&sources(3), &HashMap::new())
            .await;
        assert!(!plan.fell_back);
        for kind in EntityKind::SEEDED {
            assert_eq!(plan.skip_for(kind), 0);
        }
        assert_eq!(plan.diagnostics[&EntityKind::UnitGroupSection], Some(0));
    }

    #[tokio::test]
    async fn test_skip_capped_at_source_size() {
        let plan = calculator(store_with_areas(5).await)
            .calculate(&sources(3), &HashMap::new())
            .await;
        let entry = plan.entry(EntityKind::ProgramArea).unwrap();
        assert_eq!(entry.stored, Some(5));
        assert_eq!(entry.skip, 2);
        assert!(entry.capped);
        assert_eq!(entry.remaining(), 0);
    }

    #[tokio::test]
    async fn test_failed_count_defaults_to_zero() {
        let store = store_with_areas(1).await;
        store.fail_count(EntityKind::ProgramArea);
        let plan = calculator(store)
            .calculate(&sources(3), &HashMap::new())
            .await;

        let entry = plan.entry(EntityKind::ProgramArea).unwrap();
        assert_eq!(entry.stored, None);
        assert_eq!(entry.skip, 0);
        assert!(!plan.fell_back);
    }

    #[test]
    fn test_fallback_zeroes_every_skip() {
        let plan = ResumeCalculator::fallback(&SeedError::Source("unreadable".to_string()));
        assert!(plan.fell_back);
        for kind in EntityKind::SEEDED {
            assert_eq!(plan.skip_for(kind), 0);
        }
    }

    #[tokio::test]
    async fn test_changed_fingerprint_flagged() {
        let checkpoint_store = Arc::new(MemoryCheckpointStore::new());
        let checkpoints = Arc::new(
            CheckpointManager::new_with_storage(checkpoint_store, "earlier").with_fingerprints(
                HashMap::from([("program_areas".to_string(), "old".to_string())]),
            ),
        );
        checkpoints.record("program_areas", 1, 2, 1, 0).await;

        let calculator = ResumeCalculator::new(store_with_areas(1).await, checkpoints);
        let current = HashMap::from([(EntityKind::ProgramArea, "new".to_string())]);

        let plan = calculator.calculate(&sources(3), &current).await;
        let entry = plan.entry(EntityKind::ProgramArea).unwrap();
        assert_eq!(entry.skip, 1);
        assert!(entry.fingerprint_changed);
    }

    #[tokio::test]
    async fn test_corrupt_checkpoint_file_keeps_count_based_skip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoints.json");
        std::fs::write(&path, "{truncated").unwrap();
        let checkpoints = Arc::new(CheckpointManager::new_with_storage(
            Arc::new(FileCheckpointStore::new(&path)),
            "run",
        ));

        let calculator = ResumeCalculator::new(store_with_areas(2).await, checkpoints);
        let current = HashMap::from([(EntityKind::ProgramArea, "digest".to_string())]);

        let plan = calculator.calculate(&sources(3), &current).await;
        assert!(!plan.fell_back);
        let entry = plan.entry(EntityKind::ProgramArea).unwrap();
        assert_eq!(entry.skip, 2);
        assert!(!entry.fingerprint_changed);
    }
}
