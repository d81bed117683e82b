//! Delimited spreadsheet reader
//!
//! The outlook workbook is consumed as a delimited-text export: the first
//! row holds header names and every following row holds positional values.

use crate::domain::{Result, SeedError};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::path::Path;

/// Header row plus data rows of one sheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Maps every row to an object keyed by header name
    ///
    /// Cells beyond the last header are dropped; missing trailing cells
    /// are simply absent from the map.
    pub fn records(&self) -> Vec<HashMap<String, String>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .zip(row.iter())
                    .map(|(header, value)| (header.clone(), value.clone()))
                    .collect()
            })
            .collect()
    }
}

/// Reads a delimited file into a [`Sheet`]
///
/// Rows whose cells are all blank are dropped.
///
/// # Errors
///
/// Returns [`SeedError::Source`] if the file cannot be read, has no header
/// row, or a row cannot be decoded.
pub async fn read_spreadsheet(path: &Path, delimiter: char) -> Result<Sheet> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        SeedError::Source(format!("Cannot read spreadsheet {}: {e}", path.display()))
    })?;
    parse_sheet(&bytes, delimiter).map_err(|e| match e {
        SeedError::Source(msg) => SeedError::Source(format!("{}: {msg}", path.display())),
        other => other,
    })
}

/// Parses delimited bytes into a [`Sheet`]
pub fn parse_sheet(bytes: &[u8], delimiter: char) -> Result<Sheet> {
    let delimiter = u8::try_from(delimiter).map_err(|_| {
        SeedError::Configuration(format!("Delimiter '{delimiter}' is not a single byte"))
    })?;

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut records = reader.records();

    let headers: Vec<String> = match records.next() {
        Some(header) => header?
            .iter()
            .map(|cell| cell.trim_start_matches('\u{feff}').trim().to_string())
            .collect(),
        None => return Err(SeedError::Source("spreadsheet has no header row".to_string())),
    };

    let mut rows = Vec::new();
    for (idx, result) in records.enumerate() {
        let record = result.map_err(|e| {
            SeedError::Source(format!("row {} could not be decoded: {e}", idx + 2))
        })?;
        let row: Vec<String> = record.iter().map(|cell| cell.to_string()).collect();
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(row);
    }

    Ok(Sheet { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sheet_maps_by_header() {
        let data = "\u{feff}NOC_Code,Province,Outlook\nNOC_12345,ON,Good\n,,\n21232,BC\n";
        let sheet = parse_sheet(data.as_bytes(), ',').unwrap();

        assert_eq!(sheet.headers, vec!["NOC_Code", "Province", "Outlook"]);
        assert_eq!(sheet.rows.len(), 2);

        let records = sheet.records();
        assert_eq!(records[0]["Outlook"], "Good");
        assert_eq!(records[1]["Province"], "BC");
        assert!(!records[1].contains_key("Outlook"));
    }

    #[test]
    fn test_parse_sheet_custom_delimiter() {
        let data = "a;b\n1;2\n";
        let sheet = parse_sheet(data.as_bytes(), ';').unwrap();
        assert_eq!(sheet.rows, vec![vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn test_empty_sheet_is_error() {
        assert!(matches!(parse_sheet(b"", ','), Err(SeedError::Source(_))));
    }
}
