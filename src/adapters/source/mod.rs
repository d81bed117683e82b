//! Source data providers
//!
//! Read the three input documents into plain records: the programs JSON,
//! the unit groups JSON and the outlook spreadsheet. Providers do no
//! validation beyond decoding; the seeders decide what is usable.

pub mod json;
pub mod spreadsheet;

use crate::config::SourcesConfig;
use crate::domain::{
    EntityKind, OutlookRow, ProgramRecord, Result, SeedError, UnitGroupRecord,
};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub use json::read_json_collection;
pub use spreadsheet::{read_spreadsheet, Sheet};

/// Every source collection, loaded once per run
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    pub programs: Vec<ProgramRecord>,
    pub unit_groups: Vec<UnitGroupRecord>,
    pub outlooks: Vec<OutlookRow>,
}

/// Supplies source records to the seeders and the resume calculator
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Human-readable description for logs
    fn describe(&self) -> String;

    async fn programs(&self) -> Result<Vec<ProgramRecord>>;

    async fn unit_groups(&self) -> Result<Vec<UnitGroupRecord>>;

    async fn outlook_rows(&self) -> Result<Vec<OutlookRow>>;

    /// Content fingerprints of the backing files, keyed by seeded entity
    async fn fingerprints(&self) -> Result<HashMap<EntityKind, String>> {
        Ok(HashMap::new())
    }

    /// Loads all three collections
    ///
    /// # Errors
    ///
    /// Returns the first collection's error; nothing is partially returned.
    async fn load_all(&self) -> Result<SourceSet> {
        Ok(SourceSet {
            programs: self.programs().await?,
            unit_groups: self.unit_groups().await?,
            outlooks: self.outlook_rows().await?,
        })
    }
}

/// Hex SHA-256 of a file's bytes
///
/// # Errors
///
/// Returns [`SeedError::Source`] if the file cannot be read.
pub async fn fingerprint_file(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        SeedError::Source(format!("Cannot fingerprint {}: {e}", path.display()))
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Provider reading the files named in `[sources]`
#[derive(Debug, Clone)]
pub struct FileSourceProvider {
    programs_path: PathBuf,
    unit_groups_path: PathBuf,
    outlooks_path: PathBuf,
    outlook_delimiter: char,
}

impl FileSourceProvider {
    pub fn new(config: &SourcesConfig) -> Self {
        Self {
            programs_path: PathBuf::from(&config.programs_path),
            unit_groups_path: PathBuf::from(&config.unit_groups_path),
            outlooks_path: PathBuf::from(&config.outlooks_path),
            outlook_delimiter: config.outlook_delimiter,
        }
    }
}

#[async_trait]
impl SourceProvider for FileSourceProvider {
    fn describe(&self) -> String {
        format!(
            "programs={}, unit_groups={}, outlooks={}",
            self.programs_path.display(),
            self.unit_groups_path.display(),
            self.outlooks_path.display()
        )
    }

    async fn programs(&self) -> Result<Vec<ProgramRecord>> {
        read_json_collection(&self.programs_path).await
    }

    async fn unit_groups(&self) -> Result<Vec<UnitGroupRecord>> {
        read_json_collection(&self.unit_groups_path).await
    }

    async fn outlook_rows(&self) -> Result<Vec<OutlookRow>> {
        let sheet = read_spreadsheet(&self.outlooks_path, self.outlook_delimiter).await?;
        Ok(sheet
            .records()
            .iter()
            .map(OutlookRow::from_cells)
            .collect())
    }

    async fn fingerprints(&self) -> Result<HashMap<EntityKind, String>> {
        let programs = fingerprint_file(&self.programs_path).await?;
        let unit_groups = fingerprint_file(&self.unit_groups_path).await?;
        let outlooks = fingerprint_file(&self.outlooks_path).await?;

        Ok(HashMap::from([
            (EntityKind::ProgramArea, programs.clone()),
            (EntityKind::Program, programs.clone()),
            (EntityKind::ProgramLink, programs),
            (EntityKind::UnitGroup, unit_groups),
            (EntityKind::Outlook, outlooks),
        ]))
    }
}

/// Provider serving records held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticSourceProvider {
    sources: SourceSet,
}

impl StaticSourceProvider {
    pub fn new(sources: SourceSet) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl SourceProvider for StaticSourceProvider {
    fn describe(&self) -> String {
        format!(
            "static (programs={}, unit_groups={}, outlooks={})",
            self.sources.programs.len(),
            self.sources.unit_groups.len(),
            self.sources.outlooks.len()
        )
    }

    async fn programs(&self) -> Result<Vec<ProgramRecord>> {
        Ok(self.sources.programs.clone())
    }

    async fn unit_groups(&self) -> Result<Vec<UnitGroupRecord>> {
        Ok(self.sources.unit_groups.clone())
    }

    async fn outlook_rows(&self) -> Result<Vec<OutlookRow>> {
        Ok(self.sources.outlooks.clone())
    }
}
