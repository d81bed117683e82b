//! Domain error types
//!
//! This module defines the error hierarchy for the seeder. Persistence
//! failures are carried as [`StoreError`], whose variants are independent of
//! the database driver so that retry decisions never depend on driver types.

use thiserror::Error;

/// Main seeder error type
///
/// This is the primary error type used throughout the application.
/// Errors of this type abort whatever operation produced them; record-level
/// problems are reported as outcomes instead.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Database setup and connectivity errors
    #[error("Database error: {0}")]
    Database(String),

    /// Classified persistence failures
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Source file reading or parsing errors
    #[error("Source error: {0}")]
    Source(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Checkpoint state errors
    #[error("State management error: {0}")]
    State(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Persistence failures as reported by a [`SeedStore`](crate::adapters::database::SeedStore)
///
/// Each store implementation translates its own driver errors into these
/// variants. Nothing outside the store adapters inspects driver error codes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// A referenced row does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The payload was rejected by the store (type, null or check constraint)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transaction conflict, connection exhaustion or rate limiting
    #[error("Transient failure: {0}")]
    Transient(String),

    /// Anything the store could not classify
    #[error("{0}")]
    Other(String),
}

/// Closed classification of persistence failures used by the retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Retrying may succeed
    Transient,
    /// The row already exists; the next upsert reconciles it
    Conflict,
    /// A referenced row is missing
    NotFound,
    /// The payload itself is unacceptable
    Validation,
    /// Unclassified
    Other,
}

impl ErrorClass {
    /// Whether a failure of this class is worth another attempt
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorClass::Transient)
    }
}

impl StoreError {
    /// Classify this failure
    pub fn class(&self) -> ErrorClass {
        match self {
            StoreError::UniqueViolation(_) => ErrorClass::Conflict,
            StoreError::NotFound(_) => ErrorClass::NotFound,
            StoreError::InvalidInput(_) => ErrorClass::Validation,
            StoreError::Transient(_) => ErrorClass::Transient,
            StoreError::Other(_) => ErrorClass::Other,
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for SeedError {
    fn from(err: std::io::Error) -> Self {
        SeedError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for SeedError {
    fn from(err: serde_json::Error) -> Self {
        SeedError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for SeedError {
    fn from(err: toml::de::Error) -> Self {
        SeedError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<csv::Error> for SeedError {
    fn from(err: csv::Error) -> Self {
        SeedError::Source(format!("Spreadsheet parse error: {err}"))
    }
}
