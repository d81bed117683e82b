//! PostgreSQL adapter implementing the store trait
//!
//! Every write is a single `INSERT ... ON CONFLICT DO UPDATE` on the
//! entity's natural key; non-key columns are overwritten with the new
//! values.

use crate::adapters::database::traits::SeedStore;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::postgresql::errors::classify_db_error;
use crate::adapters::postgresql::models::{
    program_area_from_row, program_from_row, section_from_row, table_name, unit_group_from_row,
};
use crate::domain::{
    ClassificationCode, EconomicRegion, EntityKind, HealthStatus, Outlook, Program, ProgramArea,
    ProgramLink, StoreResult, UnitGroup, UnitGroupSection,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// PostgreSQL implementation of [`SeedStore`]
pub struct PostgreSQLStore {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLStore {
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    async fn execute(&self, statement: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<u64> {
        let conn = self.client.connection().await?;
        conn.execute(statement, params)
            .await
            .map_err(|e| classify_db_error(&e))
    }

    async fn query_opt(
        &self,
        query: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> StoreResult<Option<tokio_postgres::Row>> {
        let conn = self.client.connection().await?;
        conn.query_opt(query, params)
            .await
            .map_err(|e| classify_db_error(&e))
    }
}

#[async_trait]
impl SeedStore for PostgreSQLStore {
    fn backend_name(&self) -> &str {
        "postgresql"
    }

    async fn ensure_schema(&self) -> StoreResult<()> {
        self.client.ensure_schema().await
    }

    async fn health_check(&self) -> StoreResult<HealthStatus> {
        self.client.health_check().await
    }

    async fn count(&self, kind: EntityKind) -> StoreResult<u64> {
        let query = format!("SELECT COUNT(*) FROM {}", table_name(kind));
        let conn = self.client.connection().await?;
        let row = conn
            .query_one(query.as_str(), &[])
            .await
            .map_err(|e| classify_db_error(&e))?;
        let count: i64 = row
            .try_get(0)
            .map_err(|e| crate::domain::StoreError::Other(format!("count column: {e}")))?;
        Ok(count.max(0) as u64)
    }

    async fn find_program_area(&self, external_id: &str) -> StoreResult<Option<ProgramArea>> {
        self.query_opt(
            "SELECT external_id, title FROM program_areas WHERE external_id = $1",
            &[&external_id],
        )
        .await?
        .as_ref()
        .map(program_area_from_row)
        .transpose()
    }

    async fn find_program(&self, external_id: &str) -> StoreResult<Option<Program>> {
        self.query_opt(
            r#"
            SELECT external_id, title, duration, credential, keywords, skills,
                   known_codes, program_area_id
            FROM programs
            WHERE external_id = $1
            "#,
            &[&external_id],
        )
        .await?
        .as_ref()
        .map(program_from_row)
        .transpose()
    }

    async fn find_unit_group(&self, code: &ClassificationCode) -> StoreResult<Option<UnitGroup>> {
        self.query_opt(
            "SELECT code, occupation_title FROM unit_groups WHERE code = $1",
            &[&code.as_str()],
        )
        .await?
        .as_ref()
        .map(unit_group_from_row)
        .transpose()
    }

    async fn find_sections(
        &self,
        parent: &ClassificationCode,
    ) -> StoreResult<Vec<UnitGroupSection>> {
        let conn = self.client.connection().await?;
        let rows = conn
            .query(
                "SELECT parent_code, title, items FROM unit_group_sections \
                 WHERE parent_code = $1 ORDER BY title",
                &[&parent.as_str()],
            )
            .await
            .map_err(|e| classify_db_error(&e))?;
        rows.iter().map(section_from_row).collect()
    }

    async fn upsert_program_area(&self, area: &ProgramArea) -> StoreResult<()> {
        self.execute(
            r#"
            INSERT INTO program_areas (external_id, title)
            VALUES ($1, $2)
            ON CONFLICT (external_id) DO UPDATE SET
                title = EXCLUDED.title,
                updated_at = NOW()
            "#,
            &[&area.external_id, &area.title],
        )
        .await?;
        Ok(())
    }

    async fn upsert_program(&self, program: &Program) -> StoreResult<()> {
        let credential = program.credential.as_str();
        self.execute(
            r#"
            INSERT INTO programs (
                external_id, title, duration, credential, keywords, skills,
                known_codes, program_area_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (external_id) DO UPDATE SET
                title = EXCLUDED.title,
                duration = EXCLUDED.duration,
                credential = EXCLUDED.credential,
                keywords = EXCLUDED.keywords,
                skills = EXCLUDED.skills,
                known_codes = EXCLUDED.known_codes,
                program_area_id = EXCLUDED.program_area_id,
                updated_at = NOW()
            "#,
            &[
                &program.external_id,
                &program.title,
                &program.duration,
                &credential,
                &program.keywords,
                &program.skills,
                &program.known_codes,
                &program.program_area_id,
            ],
        )
        .await?;
        Ok(())
    }

    async fn upsert_unit_group(&self, unit_group: &UnitGroup) -> StoreResult<()> {
        self.execute(
            r#"
            INSERT INTO unit_groups (code, occupation_title)
            VALUES ($1, $2)
            ON CONFLICT (code) DO UPDATE SET
                occupation_title = EXCLUDED.occupation_title,
                updated_at = NOW()
            "#,
            &[&unit_group.code.as_str(), &unit_group.occupation_title],
        )
        .await?;
        Ok(())
    }

    async fn upsert_section(&self, section: &UnitGroupSection) -> StoreResult<()> {
        self.execute(
            r#"
            INSERT INTO unit_group_sections (parent_code, title, items)
            VALUES ($1, $2, $3)
            ON CONFLICT (parent_code, title) DO UPDATE SET
                items = EXCLUDED.items,
                updated_at = NOW()
            "#,
            &[&section.parent_code.as_str(), &section.title, &section.items],
        )
        .await?;
        Ok(())
    }

    async fn upsert_region(&self, region: &EconomicRegion) -> StoreResult<()> {
        self.execute(
            r#"
            INSERT INTO economic_regions (region_code, province, region_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (region_code) DO UPDATE SET
                province = EXCLUDED.province,
                region_name = EXCLUDED.region_name,
                updated_at = NOW()
            "#,
            &[
                &region.region_code.as_str(),
                &region.province,
                &region.region_name,
            ],
        )
        .await?;
        Ok(())
    }

    async fn upsert_outlook(&self, outlook: &Outlook) -> StoreResult<()> {
        self.execute(
            r#"
            INSERT INTO outlooks (
                classification_code, region_code, province, release_date,
                language, outlook_rating, trends
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT ON CONSTRAINT uq_outlooks_key DO UPDATE SET
                outlook_rating = EXCLUDED.outlook_rating,
                trends = EXCLUDED.trends,
                updated_at = NOW()
            "#,
            &[
                &outlook.classification_code.as_str(),
                &outlook.region_code.as_str(),
                &outlook.province,
                &outlook.release_date,
                &outlook.language,
                &outlook.outlook_rating,
                &outlook.trends,
            ],
        )
        .await?;
        Ok(())
    }

    async fn upsert_program_link(&self, link: &ProgramLink) -> StoreResult<()> {
        self.execute(
            r#"
            INSERT INTO program_links (program_id, classification_code, is_known, confidence)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (program_id, classification_code) DO UPDATE SET
                is_known = EXCLUDED.is_known,
                confidence = EXCLUDED.confidence,
                updated_at = NOW()
            "#,
            &[
                &link.program_id,
                &link.classification_code.as_str(),
                &link.is_known,
                &link.confidence,
            ],
        )
        .await?;
        Ok(())
    }
}
