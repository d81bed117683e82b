//! JSON collection reader

use crate::domain::{Result, SeedError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;

/// Reads a JSON document holding an array of records
///
/// A top-level object with exactly one array-valued field is unwrapped, so
/// both `[...]` and `{"programs": [...]}` are accepted. Elements that fail
/// to deserialize abort the read; the error names the element index.
///
/// # Errors
///
/// Returns [`SeedError::Source`] if the file is unreadable, is not JSON, or
/// does not contain an array.
pub async fn read_json_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        SeedError::Source(format!("Cannot read {}: {e}", path.display()))
    })?;
    parse_json_collection(&contents)
        .map_err(|e| SeedError::Source(format!("{}: {e}", path.display())))
}

/// Parses JSON text holding an array of records
pub fn parse_json_collection<T: DeserializeOwned>(contents: &str) -> Result<Vec<T>> {
    let document: Value = serde_json::from_str(contents)
        .map_err(|e| SeedError::Source(format!("invalid JSON: {e}")))?;

    let items = match document {
        Value::Array(items) => items,
        Value::Object(map) => {
            let mut arrays = map.into_iter().filter_map(|(_, v)| match v {
                Value::Array(items) => Some(items),
                _ => None,
            });
            match (arrays.next(), arrays.next()) {
                (Some(items), None) => items,
                _ => {
                    return Err(SeedError::Source(
                        "expected an array or an object with one array field".to_string(),
                    ))
                }
            }
        }
        _ => {
            return Err(SeedError::Source(
                "expected an array of records".to_string(),
            ))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            serde_json::from_value(item)
                .map_err(|e| SeedError::Source(format!("record {idx} is malformed: {e}")))
        })
        .collect()
}
