use super::mapping::{flatten_links, map_link, LinkCandidate};
use super::{skip_record, SeedContext, Seeder};
use crate::core::executor::{BatchResult, RecordOutcome};
use crate::core::retry::execute_write;
use crate::domain::{EntityKind, Result};
use async_trait::async_trait;

/// Seeds one link per known classification code of every program
pub struct ProgramLinkSeeder;

#[async_trait(?Send)]
impl Seeder for ProgramLinkSeeder {
    fn entity(&self) -> EntityKind {
        EntityKind::ProgramLink
    }

    fn depends_on(&self) -> &'static [EntityKind] {
        &[EntityKind::Program, EntityKind::UnitGroup]
    }

    async fn seed(&self, ctx: &SeedContext, skip: usize) -> Result<BatchResult> {
        let candidates = flatten_links(&ctx.sources.programs);
        tracing::info!(links = candidates.len(), skip = skip, "Seeding program links");

        Ok(ctx
            .executor
            .run(self.entity().as_str(), &candidates, skip, |candidate| {
                seed_link(ctx, candidate)
            })
            .await)
    }
}

async fn seed_link(ctx: &SeedContext, candidate: &LinkCandidate) -> Result<RecordOutcome> {
    let position = format!("{}/{}", candidate.program_id, candidate.raw_code);
    let link = match map_link(candidate) {
        Ok(link) => link,
        Err(reason) => return Ok(skip_record(EntityKind::ProgramLink, &position, &reason)),
    };

    if ctx.store.find_program(&link.program_id).await?.is_none() {
        let reason = format!("program {} does not exist", link.program_id);
        return Ok(skip_record(EntityKind::ProgramLink, &position, &reason));
    }
    if ctx
        .store
        .find_unit_group(&link.classification_code)
        .await?
        .is_none()
    {
        let reason = format!("unit group {} does not exist", link.classification_code);
        return Ok(skip_record(EntityKind::ProgramLink, &position, &reason));
    }

    let label = format!(
        "program_links:{}/{}",
        link.program_id, link.classification_code
    );
    let outcome = execute_write(&label, &ctx.retry, || ctx.store.upsert_program_link(&link)).await;
    Ok(outcome.record_outcome())
}
