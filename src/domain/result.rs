//! Result type aliases for the seeder

use super::errors::{SeedError, StoreError};

/// Result type alias for seeder operations
///
/// # Examples
///
/// ```
/// use noc_seeder::domain::result::Result;
/// use noc_seeder::domain::errors::SeedError;
///
/// fn failing_function() -> Result<()> {
///     Err(SeedError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, SeedError>;

/// Result type alias for persistence primitives
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> StoreResult<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }

    #[test]
    fn test_store_error_propagates_into_seed_error() {
        fn inner() -> StoreResult<()> {
            Err(StoreError::NotFound("program".to_string()))
        }
        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }

        assert!(matches!(outer(), Err(SeedError::Store(_))));
    }
}
