use super::mapping::{extract_regions, map_outlook};
use super::{skip_record, SeedContext, Seeder};
use crate::core::executor::{BatchResult, RecordOutcome};
use crate::core::retry::execute_write;
use crate::domain::{EconomicRegion, EntityKind, OutlookRow, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};

/// Seeds economic regions, then the outlook rows that reference them
pub struct OutlookSeeder;

#[async_trait(?Send)]
impl Seeder for OutlookSeeder {
    fn entity(&self) -> EntityKind {
        EntityKind::Outlook
    }

    fn depends_on(&self) -> &'static [EntityKind] {
        &[EntityKind::UnitGroup]
    }

    async fn seed(&self, ctx: &SeedContext, skip: usize) -> Result<BatchResult> {
        let rows = &ctx.sources.outlooks;

        // Regions are not resumable and are always re-applied in full.
        let regions = extract_regions(rows);
        upsert_regions(ctx, &regions).await;

        tracing::info!(rows = rows.len(), skip = skip, "Seeding outlooks");
        Ok(ctx
            .executor
            .run(self.entity().as_str(), rows, skip, |row| seed_outlook(ctx, row))
            .await)
    }
}

async fn upsert_regions(ctx: &SeedContext, regions: &[EconomicRegion]) {
    tracing::info!(regions = regions.len(), "Seeding economic regions");

    let written = stream::iter(regions)
        .map(|region| async move {
            let label = format!("economic_regions:{}", region.region_code);
            execute_write(&label, &ctx.retry, || ctx.store.upsert_region(region))
                .await
                .is_written()
        })
        .buffer_unordered(ctx.fanout_concurrency.max(1))
        .filter(|written| futures::future::ready(*written))
        .count()
        .await;

    if written < regions.len() {
        tracing::warn!(
            regions = regions.len(),
            written = written,
            "Some economic regions were not written"
        );
    } else {
        tracing::info!(written = written, "Economic regions seeded");
    }
}

async fn seed_outlook(ctx: &SeedContext, row: &OutlookRow) -> Result<RecordOutcome> {
    let outlook = match map_outlook(row) {
        Ok(outlook) => outlook,
        Err(reason) => {
            let position = format!(
                "{}/{}",
                row.noc_code.as_deref().unwrap_or("?"),
                row.region_code.as_deref().unwrap_or("?")
            );
            return Ok(skip_record(EntityKind::Outlook, &position, &reason));
        }
    };

    let label = format!(
        "outlooks:{}/{}/{}",
        outlook.classification_code, outlook.region_code, outlook.release_date
    );
    let outcome = execute_write(&label, &ctx.retry, || ctx.store.upsert_outlook(&outlook)).await;
    Ok(outcome.record_outcome())
}
