//! Domain models and types for the seeder.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Normalized identifiers** ([`ClassificationCode`], [`RegionCode`])
//! - **Source records** ([`ProgramRecord`], [`UnitGroupRecord`], [`OutlookRow`])
//!   as parsed from the input files
//! - **Persistence entities** ([`Program`], [`UnitGroup`], [`Outlook`], ...)
//!   as written to the store
//! - **Error types** ([`SeedError`], [`StoreError`], [`ErrorClass`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, SeedError>`]; persistence
//! primitives return [`StoreResult`] so that the retry policy can classify
//! failures without knowing the database driver.

pub mod entities;
pub mod errors;
pub mod ids;
pub mod records;
pub mod result;

// Re-export commonly used types for convenience
pub use entities::{
    CredentialKind, EconomicRegion, EntityKind, HealthStatus, Outlook, OutlookKey, Program,
    ProgramArea, ProgramLink, UnitGroup, UnitGroupSection,
};
pub use errors::{ErrorClass, SeedError, StoreError};
pub use ids::{ClassificationCode, RegionCode};
pub use records::{OutlookRow, ProgramRecord, SectionRecord, UnitGroupRecord};
pub use result::{Result, StoreResult};
