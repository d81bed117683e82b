//! Entity seeders
//!
//! One seeder per entity family. Each one takes its source collection,
//! maps records to persistence shapes, resolves dependencies by look-up and
//! hands iteration to the [`BatchExecutor`] with its own skip offset.
//!
//! | Seeder | Source collection | Depends on |
//! |---|---|---|
//! | [`ProgramAreaSeeder`] | unique areas of the programs file | |
//! | [`ProgramSeeder`] | programs file | program areas |
//! | [`UnitGroupSeeder`] | unit groups file (sections fanned out) | |
//! | [`OutlookSeeder`] | outlook rows (regions fanned out first) | unit groups |
//! | [`ProgramLinkSeeder`] | known codes of every program | programs, unit groups |

pub mod mapping;
mod outlooks;
mod program_areas;
mod program_links;
mod programs;
mod unit_groups;

pub use outlooks::OutlookSeeder;
pub use program_areas::ProgramAreaSeeder;
pub use program_links::ProgramLinkSeeder;
pub use programs::ProgramSeeder;
pub use unit_groups::UnitGroupSeeder;

use crate::adapters::database::SeedStore;
use crate::adapters::source::SourceSet;
use crate::core::executor::{BatchExecutor, BatchResult, RecordOutcome};
use crate::core::retry::RetryPolicy;
use crate::domain::{EntityKind, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Everything a seeder needs for one run
pub struct SeedContext {
    pub store: Arc<dyn SeedStore + Send + Sync>,
    pub executor: BatchExecutor,
    pub retry: RetryPolicy,
    pub sources: Arc<SourceSet>,
    /// Bound on concurrent writes for section and region fan-outs
    pub fanout_concurrency: usize,
}

/// One entity family's seeding step
#[async_trait(?Send)]
pub trait Seeder {
    fn entity(&self) -> EntityKind;

    /// Entity families that must be seeded first
    fn depends_on(&self) -> &'static [EntityKind];

    /// Seed every source record at index `skip` or later
    ///
    /// # Errors
    ///
    /// Returns an error only for failures outside any single record.
    async fn seed(&self, ctx: &SeedContext, skip: usize) -> Result<BatchResult>;
}

/// Every seeder, in dependency order
pub fn all_seeders() -> Vec<Box<dyn Seeder>> {
    vec![
        Box::new(ProgramAreaSeeder),
        Box::new(ProgramSeeder),
        Box::new(UnitGroupSeeder),
        Box::new(OutlookSeeder),
        Box::new(ProgramLinkSeeder),
    ]
}

/// Logs a record that cannot be seeded and counts it as skipped
fn skip_record(entity: EntityKind, position: &str, reason: &str) -> RecordOutcome {
    tracing::warn!(
        entity = %entity,
        record = %position,
        reason = %reason,
        "Skipping record"
    );
    RecordOutcome::Skipped
}
