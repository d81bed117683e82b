//! Store abstraction traits
//!
//! This module defines the traits that storage backends must implement to
//! be seeded: the entity store itself and the side-channel checkpoint store.

use crate::core::state::checkpoint::Checkpoint;
use crate::domain::{
    ClassificationCode, EconomicRegion, EntityKind, HealthStatus, Outlook, Program, ProgramArea,
    ProgramLink, Result, StoreResult, UnitGroup, UnitGroupSection,
};
use async_trait::async_trait;

/// Persistence contract for seeded entities
///
/// Every write is an idempotent upsert keyed on the entity's natural or
/// composite key: repeated calls with the same key and payload converge to
/// the same stored state. Failures are reported as [`StoreError`] variants
/// so callers can classify them without knowing the driver.
///
/// [`StoreError`]: crate::domain::StoreError
#[async_trait]
pub trait SeedStore: Send + Sync {
    /// Short backend name for logs and status output
    fn backend_name(&self) -> &str;

    /// Creates tables and indexes if they do not exist
    async fn ensure_schema(&self) -> StoreResult<()>;

    /// Probes the store and reports round-trip latency
    async fn health_check(&self) -> StoreResult<HealthStatus>;

    /// Number of persisted rows for an entity family
    async fn count(&self, kind: EntityKind) -> StoreResult<u64>;

    async fn find_program_area(&self, external_id: &str) -> StoreResult<Option<ProgramArea>>;

    async fn find_program(&self, external_id: &str) -> StoreResult<Option<Program>>;

    async fn find_unit_group(&self, code: &ClassificationCode) -> StoreResult<Option<UnitGroup>>;

    /// All sections stored under one unit group
    async fn find_sections(&self, parent: &ClassificationCode)
        -> StoreResult<Vec<UnitGroupSection>>;

    async fn upsert_program_area(&self, area: &ProgramArea) -> StoreResult<()>;

    /// Requires the referenced program area to exist
    async fn upsert_program(&self, program: &Program) -> StoreResult<()>;

    async fn upsert_unit_group(&self, unit_group: &UnitGroup) -> StoreResult<()>;

    /// Requires the parent unit group to exist
    async fn upsert_section(&self, section: &UnitGroupSection) -> StoreResult<()>;

    async fn upsert_region(&self, region: &EconomicRegion) -> StoreResult<()>;

    async fn upsert_outlook(&self, outlook: &Outlook) -> StoreResult<()>;

    /// Requires both the program and the unit group to exist
    async fn upsert_program_link(&self, link: &ProgramLink) -> StoreResult<()>;
}

/// Side-channel store for resumability checkpoints
///
/// Holds the latest checkpoint per operation name. Writers treat it as
/// best-effort; see [`CheckpointManager`].
///
/// [`CheckpointManager`]: crate::core::state::CheckpointManager
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Replaces the stored checkpoint for `checkpoint.operation`
    ///
    /// # Errors
    ///
    /// Returns an error if the checkpoint cannot be persisted.
    async fn write_checkpoint(&self, checkpoint: &Checkpoint) -> Result<()>;

    /// Loads the latest checkpoint for one operation
    async fn load_checkpoint(&self, operation: &str) -> Result<Option<Checkpoint>>;

    /// Loads every stored checkpoint, ordered by operation name
    async fn load_all(&self) -> Result<Vec<Checkpoint>>;
}
