use super::mapping::map_unit_group;
use super::{skip_record, SeedContext, Seeder};
use crate::core::executor::{BatchResult, RecordOutcome};
use crate::core::retry::{execute_write, WriteOutcome};
use crate::domain::{EntityKind, Result, UnitGroupRecord, UnitGroupSection};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};

/// Seeds unit groups and re-applies all of their sections
pub struct UnitGroupSeeder;

#[async_trait(?Send)]
impl Seeder for UnitGroupSeeder {
    fn entity(&self) -> EntityKind {
        EntityKind::UnitGroup
    }

    fn depends_on(&self) -> &'static [EntityKind] {
        &[]
    }

    async fn seed(&self, ctx: &SeedContext, skip: usize) -> Result<BatchResult> {
        let records = &ctx.sources.unit_groups;
        tracing::info!(unit_groups = records.len(), skip = skip, "Seeding unit groups");

        Ok(ctx
            .executor
            .run(self.entity().as_str(), records, skip, |record| {
                seed_unit_group(ctx, record)
            })
            .await)
    }
}

async fn seed_unit_group(ctx: &SeedContext, record: &UnitGroupRecord) -> Result<RecordOutcome> {
    let position = record.noc_code.as_deref().unwrap_or("<no code>");
    let mapped = match map_unit_group(record) {
        Ok(mapped) => mapped,
        Err(reason) => return Ok(skip_record(EntityKind::UnitGroup, position, &reason)),
    };

    if mapped.dropped_sections > 0 {
        tracing::warn!(
            code = %mapped.unit_group.code,
            dropped = mapped.dropped_sections,
            "Dropping sections without a title"
        );
    }

    let label = format!("unit_groups:{}", mapped.unit_group.code);
    let outcome = execute_write(&label, &ctx.retry, || {
        ctx.store.upsert_unit_group(&mapped.unit_group)
    })
    .await;

    // Sections need the parent row; a conflict means it is already there.
    if matches!(
        outcome,
        WriteOutcome::Written(_) | WriteOutcome::AlreadyExists(_)
    ) {
        upsert_sections(ctx, &mapped.sections).await;
    }

    Ok(outcome.record_outcome())
}

/// Upserts every section of one unit group with bounded concurrency
///
/// Failures are logged per section and never affect the parent's outcome.
async fn upsert_sections(ctx: &SeedContext, sections: &[UnitGroupSection]) {
    if sections.is_empty() {
        return;
    }

    let outcomes: Vec<bool> = stream::iter(sections)
        .map(|section| async move {
            let label = format!("unit_group_sections:{}/{}", section.parent_code, section.title);
            execute_write(&label, &ctx.retry, || ctx.store.upsert_section(section))
                .await
                .is_written()
        })
        .buffer_unordered(ctx.fanout_concurrency.max(1))
        .collect()
        .await;

    let failed = outcomes.iter().filter(|written| !**written).count();
    if failed > 0 {
        tracing::warn!(
            code = %sections[0].parent_code,
            sections = sections.len(),
            failed = failed,
            "Some sections were not written"
        );
    } else {
        tracing::debug!(
            code = %sections[0].parent_code,
            sections = sections.len(),
            "Sections written"
        );
    }
}
