use super::mapping::extract_program_areas;
use super::{SeedContext, Seeder};
use crate::core::executor::{BatchResult, RecordOutcome};
use crate::core::retry::execute_write;
use crate::domain::{EntityKind, ProgramArea, Result};
use async_trait::async_trait;

/// Seeds the unique program areas named by the programs file
pub struct ProgramAreaSeeder;

#[async_trait(?Send)]
impl Seeder for ProgramAreaSeeder {
    fn entity(&self) -> EntityKind {
        EntityKind::ProgramArea
    }

    fn depends_on(&self) -> &'static [EntityKind] {
        &[]
    }

    async fn seed(&self, ctx: &SeedContext, skip: usize) -> Result<BatchResult> {
        let areas = extract_program_areas(&ctx.sources.programs);
        tracing::info!(areas = areas.len(), skip = skip, "Seeding program areas");

        Ok(ctx
            .executor
            .run(self.entity().as_str(), &areas, skip, |area| {
                seed_area(ctx, area)
            })
            .await)
    }
}

async fn seed_area(ctx: &SeedContext, area: &ProgramArea) -> Result<RecordOutcome> {
    let label = format!("program_areas:{}", area.external_id);
    let outcome = execute_write(&label, &ctx.retry, || ctx.store.upsert_program_area(area)).await;
    Ok(outcome.record_outcome())
}
