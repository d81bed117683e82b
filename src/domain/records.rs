//! Source record shapes
//!
//! Plain records as they come out of the source files, before validation.
//! Every field is optional so that a malformed record can be reported and
//! skipped rather than failing the whole file.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

/// One program entry of the programs JSON document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub program_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub program_area_id: Option<String>,
    #[serde(default, rename = "programArea", deserialize_with = "lenient_string")]
    pub program_area_title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub credential: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub known_noc_groups: Vec<String>,
}

/// One unit group entry of the classification JSON document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitGroupRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub noc_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub occupation: Option<String>,
    #[serde(default)]
    pub sections: Vec<SectionRecord>,
}

/// A titled list of items nested under a unit group
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SectionRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default)]
    pub items: Vec<String>,
}

/// One data row of the outlook spreadsheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutlookRow {
    pub noc_code: Option<String>,
    pub region_code: Option<String>,
    pub region_name: Option<String>,
    pub province: Option<String>,
    pub outlook: Option<String>,
    pub trends: Option<String>,
    pub release_date: Option<String>,
    pub language: Option<String>,
}

/// Accepted header spellings for each outlook column, compared case-insensitively
const OUTLOOK_HEADERS: [(&str, &[&str]); 8] = [
    ("noc_code", &["noc_code", "noc code", "noc"]),
    (
        "region_code",
        &["economic region code", "er_code", "region code"],
    ),
    (
        "region_name",
        &["economic region name", "er_name", "region name"],
    ),
    ("province", &["province", "prov"]),
    ("outlook", &["outlook", "outlook rating"]),
    ("trends", &["employment trends", "trends"]),
    ("release_date", &["release date", "date"]),
    ("language", &["language", "lang"]),
];

impl OutlookRow {
    /// Builds a row from cells keyed by header name
    ///
    /// Blank cells become `None`.
    pub fn from_cells(cells: &HashMap<String, String>) -> Self {
        let lookup: HashMap<String, &str> = cells
            .iter()
            .map(|(header, value)| (header.trim().to_lowercase(), value.as_str()))
            .collect();

        let field = |name: &str| -> Option<String> {
            let aliases = OUTLOOK_HEADERS
                .iter()
                .find(|(field, _)| *field == name)
                .map(|(_, aliases)| *aliases)
                .unwrap_or(&[]);
            aliases
                .iter()
                .find_map(|alias| lookup.get(*alias))
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        Self {
            noc_code: field("noc_code"),
            region_code: field("region_code"),
            region_name: field("region_name"),
            province: field("province"),
            outlook: field("outlook"),
            trends: field("trends"),
            release_date: field("release_date"),
            language: field("language"),
        }
    }
}

/// Accepts strings and numbers, treating blank strings and null as absent
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_string))
}

fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(value
        .unwrap_or_default()
        .into_iter()
        .filter_map(value_to_string)
        .collect())
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
