//! Row mapping for PostgreSQL tables
//!
//! Converts `tokio_postgres::Row`s read back from the seeded tables into
//! domain entities.

use crate::domain::{
    ClassificationCode, CredentialKind, EntityKind, Program, ProgramArea, StoreError, StoreResult,
    UnitGroup, UnitGroupSection,
};
use tokio_postgres::Row;

/// Table holding each entity family
pub fn table_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::ProgramArea => "program_areas",
        EntityKind::Program => "programs",
        EntityKind::UnitGroup => "unit_groups",
        EntityKind::UnitGroupSection => "unit_group_sections",
        EntityKind::EconomicRegion => "economic_regions",
        EntityKind::Outlook => "outlooks",
        EntityKind::ProgramLink => "program_links",
    }
}

fn get<'a, T>(row: &'a Row, column: &str) -> StoreResult<T>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Other(format!("column {column}: {e}")))
}

fn code(raw: &str) -> StoreResult<ClassificationCode> {
    ClassificationCode::normalize(raw).map_err(StoreError::InvalidInput)
}

pub fn program_area_from_row(row: &Row) -> StoreResult<ProgramArea> {
    Ok(ProgramArea {
        external_id: get(row, "external_id")?,
        title: get(row, "title")?,
    })
}

pub fn program_from_row(row: &Row) -> StoreResult<Program> {
    let credential: String = get(row, "credential")?;
    Ok(Program {
        external_id: get(row, "external_id")?,
        title: get(row, "title")?,
        duration: get(row, "duration")?,
        credential: CredentialKind::normalize(Some(&credential)),
        keywords: get(row, "keywords")?,
        skills: get(row, "skills")?,
        known_codes: get(row, "known_codes")?,
        program_area_id: get(row, "program_area_id")?,
    })
}

pub fn unit_group_from_row(row: &Row) -> StoreResult<UnitGroup> {
    let raw: String = get(row, "code")?;
    Ok(UnitGroup {
        code: code(&raw)?,
        occupation_title: get(row, "occupation_title")?,
    })
}

pub fn section_from_row(row: &Row) -> StoreResult<UnitGroupSection> {
    let raw: String = get(row, "parent_code")?;
    Ok(UnitGroupSection {
        parent_code: code(&raw)?,
        title: get(row, "title")?,
        items: get(row, "items")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_match_entity_names() {
        for kind in EntityKind::ALL {
            assert_eq!(table_name(kind), kind.as_str());
        }
    }
}
