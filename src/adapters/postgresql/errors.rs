//! PostgreSQL error classification
//!
//! Translates driver and pool failures into [`StoreError`]. This is the
//! only place in the crate that looks at SQLSTATE codes.

use crate::domain::StoreError;
use deadpool_postgres::PoolError;

/// SQLSTATE codes treated as transient
const TRANSIENT_CODES: [&str; 8] = [
    "40001", // serialization_failure
    "40P01", // deadlock_detected
    "53300", // too_many_connections
    "53400", // configuration_limit_exceeded
    "57P01", // admin_shutdown
    "57P03", // cannot_connect_now
    "57014", // query_canceled (statement timeout)
    "08006", // connection_failure
];

/// Maps a SQLSTATE code and message to a [`StoreError`]
pub fn classify_sqlstate(code: &str, message: String) -> StoreError {
    match code {
        "23505" => StoreError::UniqueViolation(message),
        "23503" | "P0002" => StoreError::NotFound(message),
        "23502" | "23514" => StoreError::InvalidInput(message),
        c if c.starts_with("22") => StoreError::InvalidInput(message),
        c if c.starts_with("08") || TRANSIENT_CODES.contains(&c) => StoreError::Transient(message),
        _ => StoreError::Other(message),
    }
}

/// Classifies a `tokio_postgres` error
pub fn classify_db_error(err: &tokio_postgres::Error) -> StoreError {
    let message = match err.as_db_error() {
        Some(db) => db.message().to_string(),
        None => err.to_string(),
    };

    if let Some(state) = err.code() {
        return classify_sqlstate(state.code(), message);
    }

    if err.is_closed() {
        return StoreError::Transient(message);
    }

    StoreError::Other(message)
}

/// Classifies a connection pool error
pub fn classify_pool_error(err: &PoolError) -> StoreError {
    match err {
        PoolError::Timeout(kind) => {
            StoreError::Transient(format!("connection pool timeout ({kind:?})"))
        }
        PoolError::Backend(e) => match classify_db_error(e) {
            StoreError::Other(message) => StoreError::Transient(message),
            classified => classified,
        },
        PoolError::Closed => StoreError::Other("connection pool is closed".to_string()),
        other => StoreError::Other(other.to_string()),
    }
}
