use super::mapping::map_program;
use super::{skip_record, SeedContext, Seeder};
use crate::core::executor::{BatchResult, RecordOutcome};
use crate::core::retry::execute_write;
use crate::domain::{EntityKind, ProgramRecord, Result};
use async_trait::async_trait;

/// Seeds programs; each needs its program area in the store
pub struct ProgramSeeder;

#[async_trait(?Send)]
impl Seeder for ProgramSeeder {
    fn entity(&self) -> EntityKind {
        EntityKind::Program
    }

    fn depends_on(&self) -> &'static [EntityKind] {
        &[EntityKind::ProgramArea]
    }

    async fn seed(&self, ctx: &SeedContext, skip: usize) -> Result<BatchResult> {
        let records = &ctx.sources.programs;
        tracing::info!(programs = records.len(), skip = skip, "Seeding programs");

        Ok(ctx
            .executor
            .run(self.entity().as_str(), records, skip, |record| {
                seed_program(ctx, record)
            })
            .await)
    }
}

async fn seed_program(ctx: &SeedContext, record: &ProgramRecord) -> Result<RecordOutcome> {
    let position = record.program_id.as_deref().unwrap_or("<no id>");
    let program = match map_program(record) {
        Ok(program) => program,
        Err(reason) => return Ok(skip_record(EntityKind::Program, position, &reason)),
    };

    if ctx
        .store
        .find_program_area(&program.program_area_id)
        .await?
        .is_none()
    {
        let reason = format!("program area {} does not exist", program.program_area_id);
        return Ok(skip_record(EntityKind::Program, position, &reason));
    }

    let label = format!("programs:{}", program.external_id);
    let outcome = execute_write(&label, &ctx.retry, || ctx.store.upsert_program(&program)).await;
    Ok(outcome.record_outcome())
}
