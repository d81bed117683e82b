//! In-memory store backend
//!
//! Process-local implementations of [`SeedStore`] and [`CheckpointStore`].
//! They back dry runs and the test suite, and enforce the same uniqueness
//! and referential rules as the PostgreSQL schema. Failures can be injected
//! per entity key to exercise the retry policy.

use crate::adapters::database::traits::{CheckpointStore, SeedStore};
use crate::core::state::checkpoint::Checkpoint;
use crate::domain::{
    ClassificationCode, EconomicRegion, EntityKind, HealthStatus, Outlook, OutlookKey, Program,
    ProgramArea, ProgramLink, RegionCode, Result, SeedError, StoreError, StoreResult, UnitGroup,
    UnitGroupSection,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

#[derive(Debug, Default)]
struct Tables {
    program_areas: BTreeMap<String, ProgramArea>,
    programs: BTreeMap<String, Program>,
    unit_groups: BTreeMap<ClassificationCode, UnitGroup>,
    sections: BTreeMap<(ClassificationCode, String), UnitGroupSection>,
    regions: BTreeMap<RegionCode, EconomicRegion>,
    outlooks: BTreeMap<OutlookKey, Outlook>,
    links: BTreeMap<(String, ClassificationCode), ProgramLink>,
}

/// Full contents of a [`MemoryStore`], ordered by key
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySnapshot {
    pub program_areas: Vec<ProgramArea>,
    pub programs: Vec<Program>,
    pub unit_groups: Vec<UnitGroup>,
    pub sections: Vec<UnitGroupSection>,
    pub regions: Vec<EconomicRegion>,
    pub outlooks: Vec<Outlook>,
    pub links: Vec<ProgramLink>,
}

#[derive(Debug)]
struct InjectedFailure {
    error: StoreError,
    remaining: usize,
}

/// Decrements the in-flight gauge when a write finishes
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory [`SeedStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failures: Mutex<HashMap<(EntityKind, String), InjectedFailure>>,
    count_failures: Mutex<HashSet<EntityKind>>,
    lookup_failures: Mutex<HashSet<EntityKind>>,
    upsert_calls: Mutex<HashMap<EntityKind, usize>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    unhealthy: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` upserts of `kind` whose key renders as `key`
    ///
    /// Keys are rendered as the entity's natural key; composite keys are
    /// joined with `/`, e.g. `"21232/Main duties"` for a section.
    pub fn inject_failure(&self, kind: EntityKind, key: &str, error: StoreError, times: usize) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(
                (kind, key.to_string()),
                InjectedFailure {
                    error,
                    remaining: times,
                },
            );
        }
    }

    /// Make `count(kind)` fail until cleared
    pub fn fail_count(&self, kind: EntityKind) {
        if let Ok(mut kinds) = self.count_failures.lock() {
            kinds.insert(kind);
        }
    }

    /// Make every `find_*` lookup of `kind` fail until cleared
    pub fn fail_lookups(&self, kind: EntityKind) {
        if let Ok(mut kinds) = self.lookup_failures.lock() {
            kinds.insert(kind);
        }
    }

    fn check_lookup(&self, kind: EntityKind) -> StoreResult<()> {
        let failing = self
            .lookup_failures
            .lock()
            .map(|kinds| kinds.contains(&kind))
            .unwrap_or(false);
        if failing {
            return Err(StoreError::Other(format!("lookup of {kind} unavailable")));
        }
        Ok(())
    }

    /// Report an unhealthy status from `health_check`
    pub fn set_unhealthy(&self, unhealthy: bool) {
        self.unhealthy.store(unhealthy, Ordering::SeqCst);
    }

    /// Number of upsert calls made for `kind`, including failed ones
    pub fn upsert_calls(&self, kind: EntityKind) -> usize {
        self.upsert_calls
            .lock()
            .map(|calls| calls.get(&kind).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Highest number of concurrently running upserts observed
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Copy of every table
    pub fn snapshot(&self) -> StoreResult<MemorySnapshot> {
        let tables = self.tables()?;
        Ok(MemorySnapshot {
            program_areas: tables.program_areas.values().cloned().collect(),
            programs: tables.programs.values().cloned().collect(),
            unit_groups: tables.unit_groups.values().cloned().collect(),
            sections: tables.sections.values().cloned().collect(),
            regions: tables.regions.values().cloned().collect(),
            outlooks: tables.outlooks.values().cloned().collect(),
            links: tables.links.values().cloned().collect(),
        })
    }

    fn tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Other("memory store lock poisoned".to_string()))
    }

    /// Applies injected failures and bookkeeping shared by every upsert
    async fn begin_write(&self, kind: EntityKind, key: &str) -> StoreResult<InFlight<'_>> {
        if let Ok(mut calls) = self.upsert_calls.lock() {
            *calls.entry(kind).or_insert(0) += 1;
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);

        // Suspend like a network round trip so concurrent writers interleave.
        tokio::task::yield_now().await;

        let injected = {
            let mut failures = self
                .failures
                .lock()
                .map_err(|_| StoreError::Other("memory store lock poisoned".to_string()))?;
            let lookup = (kind, key.to_string());
            match failures.get_mut(&lookup) {
                Some(failure) if failure.remaining > 0 => {
                    failure.remaining -= 1;
                    Some(failure.error.clone())
                }
                _ => None,
            }
        };

        match injected {
            Some(error) => Err(error),
            None => Ok(guard),
        }
    }
}

#[async_trait]
impl SeedStore for MemoryStore {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn ensure_schema(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<HealthStatus> {
        let started = Instant::now();
        let _tables = self.tables()?;
        let status = if self.unhealthy.load(Ordering::SeqCst) {
            "unhealthy"
        } else {
            "healthy"
        };
        Ok(HealthStatus {
            status: status.to_string(),
            response_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    async fn count(&self, kind: EntityKind) -> StoreResult<u64> {
        let failing = self
            .count_failures
            .lock()
            .map(|kinds| kinds.contains(&kind))
            .unwrap_or(false);
        if failing {
            return Err(StoreError::Transient(format!("count of {kind} unavailable")));
        }

        let tables = self.tables()?;
        let len = match kind {
            EntityKind::ProgramArea => tables.program_areas.len(),
            EntityKind::Program => tables.programs.len(),
            EntityKind::UnitGroup => tables.unit_groups.len(),
            EntityKind::UnitGroupSection => tables.sections.len(),
            EntityKind::EconomicRegion => tables.regions.len(),
            EntityKind::Outlook => tables.outlooks.len(),
            EntityKind::ProgramLink => tables.links.len(),
        };
        Ok(len as u64)
    }

    async fn find_program_area(&self, external_id: &str) -> StoreResult<Option<ProgramArea>> {
        self.check_lookup(EntityKind::ProgramArea)?;
        Ok(self.tables()?.program_areas.get(external_id).cloned())
    }

    async fn find_program(&self, external_id: &str) -> StoreResult<Option<Program>> {
        self.check_lookup(EntityKind::Program)?;
        Ok(self.tables()?.programs.get(external_id).cloned())
    }

    async fn find_unit_group(&self, code: &ClassificationCode) -> StoreResult<Option<UnitGroup>> {
        self.check_lookup(EntityKind::UnitGroup)?;
        Ok(self.tables()?.unit_groups.get(code).cloned())
    }

    async fn find_sections(
        &self,
        parent: &ClassificationCode,
    ) -> StoreResult<Vec<UnitGroupSection>> {
        Ok(self
            .tables()?
            .sections
            .values()
            .filter(|section| &section.parent_code == parent)
            .cloned()
            .collect())
    }

    async fn upsert_program_area(&self, area: &ProgramArea) -> StoreResult<()> {
        let _guard = self
            .begin_write(EntityKind::ProgramArea, &area.external_id)
            .await?;
        self.tables()?
            .program_areas
            .insert(area.external_id.clone(), area.clone());
        Ok(())
    }

    async fn upsert_program(&self, program: &Program) -> StoreResult<()> {
        let _guard = self
            .begin_write(EntityKind::Program, &program.external_id)
            .await?;
        let mut tables = self.tables()?;
        if !tables.program_areas.contains_key(&program.program_area_id) {
            return Err(StoreError::NotFound(format!(
                "program area {} referenced by program {}",
                program.program_area_id, program.external_id
            )));
        }
        tables
            .programs
            .insert(program.external_id.clone(), program.clone());
        Ok(())
    }

    async fn upsert_unit_group(&self, unit_group: &UnitGroup) -> StoreResult<()> {
        let _guard = self
            .begin_write(EntityKind::UnitGroup, unit_group.code.as_str())
            .await?;
        self.tables()?
            .unit_groups
            .insert(unit_group.code.clone(), unit_group.clone());
        Ok(())
    }

    async fn upsert_section(&self, section: &UnitGroupSection) -> StoreResult<()> {
        let key = format!("{}/{}", section.parent_code, section.title);
        let _guard = self
            .begin_write(EntityKind::UnitGroupSection, &key)
            .await?;
        let mut tables = self.tables()?;
        if !tables.unit_groups.contains_key(&section.parent_code) {
            return Err(StoreError::NotFound(format!(
                "unit group {} referenced by section '{}'",
                section.parent_code, section.title
            )));
        }
        tables.sections.insert(section.key(), section.clone());
        Ok(())
    }

    async fn upsert_region(&self, region: &EconomicRegion) -> StoreResult<()> {
        let _guard = self
            .begin_write(EntityKind::EconomicRegion, region.region_code.as_str())
            .await?;
        self.tables()?
            .regions
            .insert(region.region_code.clone(), region.clone());
        Ok(())
    }

    async fn upsert_outlook(&self, outlook: &Outlook) -> StoreResult<()> {
        let key = outlook.key();
        let rendered = format!(
            "{}/{}/{}/{}/{}",
            key.classification_code, key.region_code, key.province, key.release_date, key.language
        );
        let _guard = self.begin_write(EntityKind::Outlook, &rendered).await?;
        self.tables()?.outlooks.insert(key, outlook.clone());
        Ok(())
    }

    async fn upsert_program_link(&self, link: &ProgramLink) -> StoreResult<()> {
        let key = format!("{}/{}", link.program_id, link.classification_code);
        let _guard = self.begin_write(EntityKind::ProgramLink, &key).await?;
        let mut tables = self.tables()?;
        if !tables.programs.contains_key(&link.program_id) {
            return Err(StoreError::NotFound(format!(
                "program {} referenced by link",
                link.program_id
            )));
        }
        if !tables.unit_groups.contains_key(&link.classification_code) {
            return Err(StoreError::NotFound(format!(
                "unit group {} referenced by link",
                link.classification_code
            )));
        }
        tables.links.insert(
            (link.program_id.clone(), link.classification_code.clone()),
            link.clone(),
        );
        Ok(())
    }
}

/// In-memory [`CheckpointStore`]
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    checkpoints: Mutex<BTreeMap<String, Checkpoint>>,
    fail_writes: AtomicBool,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn checkpoints(&self) -> Result<MutexGuard<'_, BTreeMap<String, Checkpoint>>> {
        self.checkpoints
            .lock()
            .map_err(|_| SeedError::State("checkpoint store lock poisoned".to_string()))
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn write_checkpoint(&self, checkpoint: &Checkpoint) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SeedError::State(format!(
                "checkpoint write for {} rejected",
                checkpoint.operation
            )));
        }
        self.checkpoints()?
            .insert(checkpoint.operation.clone(), checkpoint.clone());
        Ok(())
    }

    async fn load_checkpoint(&self, operation: &str) -> Result<Option<Checkpoint>> {
        Ok(self.checkpoints()?.get(operation).cloned())
    }

    async fn load_all(&self) -> Result<Vec<Checkpoint>> {
        Ok(self.checkpoints()?.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CredentialKind;

    fn area(id: &str) -> ProgramArea {
        ProgramArea {
            external_id: id.to_string(),
            title: format!("Area {id}"),
        }
    }

    fn program(id: &str, area_id: &str) -> Program {
        Program {
            external_id: id.to_string(),
            title: format!("Program {id}"),
            duration: "Unknown".to_string(),
            credential: CredentialKind::Certificate,
            keywords: Vec::new(),
            skills: Vec::new(),
            known_codes: Vec::new(),
            program_area_id: area_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = MemoryStore::new();
        store.upsert_program_area(&area("1")).await.unwrap();
        store.upsert_program_area(&area("1")).await.unwrap();
        assert_eq!(store.count(EntityKind::ProgramArea).await.unwrap(), 1);
        assert_eq!(store.upsert_calls(EntityKind::ProgramArea), 2);
    }

    #[tokio::test]
    async fn test_program_requires_area() {
        let store = MemoryStore::new();
        let err = store.upsert_program(&program("p1", "missing")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        store.upsert_program_area(&area("a")).await.unwrap();
        store.upsert_program(&program("p1", "a")).await.unwrap();
        assert!(store.find_program("p1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_injected_failure_is_consumed() {
        let store = MemoryStore::new();
        store.inject_failure(
            EntityKind::ProgramArea,
            "1",
            StoreError::Transient("deadlock".to_string()),
            1,
        );

        assert!(store.upsert_program_area(&area("1")).await.is_err());
        assert!(store.upsert_program_area(&area("1")).await.is_ok());
        assert_eq!(store.peak_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_count_failure_injection() {
        let store = MemoryStore::new();
        store.fail_count(EntityKind::Outlook);
        assert!(store.count(EntityKind::Outlook).await.is_err());
        assert_eq!(store.count(EntityKind::Program).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_health_check() {
        let store = MemoryStore::new();
        assert!(store.health_check().await.unwrap().is_healthy());
        store.set_unhealthy(true);
        assert!(!store.health_check().await.unwrap().is_healthy());
    }

    #[tokio::test]
    async fn test_checkpoint_store_round_trip() {
        let store = MemoryCheckpointStore::new();
        let checkpoint = crate::core::state::CheckpointBuilder::new("programs")
            .processed(3)
            .total(3)
            .build();
        store.write_checkpoint(&checkpoint).await.unwrap();

        let loaded = store.load_checkpoint("programs").await.unwrap();
        assert_eq!(loaded, Some(checkpoint));
        assert_eq!(store.load_all().await.unwrap().len(), 1);
    }
}
