//! Persistence-layer entity shapes
//!
//! These are the rows the seeder writes. Every entity has a natural or
//! composite key and is only ever written through an upsert on that key.

use crate::domain::ids::{ClassificationCode, RegionCode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entity families known to the seeder
///
/// Sections and economic regions are written as part of their parent
/// seeders and are only counted for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    ProgramArea,
    Program,
    UnitGroup,
    UnitGroupSection,
    EconomicRegion,
    Outlook,
    ProgramLink,
}

impl EntityKind {
    /// The five entity families that carry their own skip offset, in
    /// dependency order
    pub const SEEDED: [EntityKind; 5] = [
        EntityKind::ProgramArea,
        EntityKind::Program,
        EntityKind::UnitGroup,
        EntityKind::Outlook,
        EntityKind::ProgramLink,
    ];

    /// Every entity family, including the diagnostic-only ones
    pub const ALL: [EntityKind; 7] = [
        EntityKind::ProgramArea,
        EntityKind::Program,
        EntityKind::UnitGroup,
        EntityKind::UnitGroupSection,
        EntityKind::EconomicRegion,
        EntityKind::Outlook,
        EntityKind::ProgramLink,
    ];

    /// Stable name used in configuration, checkpoints and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::ProgramArea => "program_areas",
            EntityKind::Program => "programs",
            EntityKind::UnitGroup => "unit_groups",
            EntityKind::UnitGroupSection => "unit_group_sections",
            EntityKind::EconomicRegion => "economic_regions",
            EntityKind::Outlook => "outlooks",
            EntityKind::ProgramLink => "program_links",
        }
    }

    /// Whether this family has its own skip offset
    pub fn is_seeded(&self) -> bool {
        Self::SEEDED.contains(self)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "Unknown entity '{s}'. Expected one of: {}",
                    Self::ALL.map(|k| k.as_str()).join(", ")
                )
            })
    }
}

/// Credential awarded by a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CredentialKind {
    #[default]
    Certificate,
    Diploma,
    Degree,
}

impl CredentialKind {
    /// Normalizes free-text credential descriptions
    ///
    /// Unknown or missing descriptions fall back to `Certificate`.
    pub fn normalize(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        let text = raw.trim().to_lowercase();
        if text.contains("degree") || text.contains("bachelor") || text.contains("master") {
            CredentialKind::Degree
        } else if text.contains("diploma") {
            CredentialKind::Diploma
        } else {
            CredentialKind::Certificate
        }
    }

    /// Database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::Certificate => "CERTIFICATE",
            CredentialKind::Diploma => "DIPLOMA",
            CredentialKind::Degree => "DEGREE",
        }
    }
}

/// Program area, keyed by external id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramArea {
    pub external_id: String,
    pub title: String,
}

/// Educational program, keyed by external id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub external_id: String,
    pub title: String,
    pub duration: String,
    pub credential: CredentialKind,
    pub keywords: Vec<String>,
    pub skills: Vec<String>,
    /// Canonical classification codes the source lists as known matches
    pub known_codes: Vec<String>,
    pub program_area_id: String,
}

/// Classification unit group, keyed by code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitGroup {
    pub code: ClassificationCode,
    pub occupation_title: String,
}

/// Named section of a unit group, keyed by (parent code, title)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitGroupSection {
    pub parent_code: ClassificationCode,
    pub title: String,
    pub items: Vec<String>,
}

impl UnitGroupSection {
    pub fn key(&self) -> (ClassificationCode, String) {
        (self.parent_code.clone(), self.title.clone())
    }
}

/// Economic region, keyed by region code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomicRegion {
    pub region_code: RegionCode,
    pub province: String,
    pub region_name: String,
}

/// Composite key of an outlook row
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutlookKey {
    pub classification_code: ClassificationCode,
    pub region_code: RegionCode,
    pub province: String,
    pub release_date: NaiveDate,
    pub language: String,
}

/// Employment outlook for one unit group in one economic region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outlook {
    pub classification_code: ClassificationCode,
    pub region_code: RegionCode,
    pub province: String,
    pub release_date: NaiveDate,
    pub language: String,
    /// Rating on a 1 (very limited) to 5 (very good) scale
    pub outlook_rating: i16,
    pub trends: String,
}

impl Outlook {
    pub fn key(&self) -> OutlookKey {
        OutlookKey {
            classification_code: self.classification_code.clone(),
            region_code: self.region_code.clone(),
            province: self.province.clone(),
            release_date: self.release_date,
            language: self.language.clone(),
        }
    }
}

/// Link between a program and a unit group, keyed by (program, code)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramLink {
    pub program_id: String,
    pub classification_code: ClassificationCode,
    pub is_known: bool,
    pub confidence: f32,
}

/// Result of a store health probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub response_time_ms: u64,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
