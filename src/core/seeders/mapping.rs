//! Source-to-persistence mapping rules
//!
//! Pure functions shared by the seeders and the resume calculator. The
//! derived collections built here (unique program areas, flattened links,
//! unique regions) define the source sizes that skip offsets are clamped
//! against, so both sides must build them the same way.

use crate::domain::{
    ClassificationCode, CredentialKind, EconomicRegion, Outlook, OutlookRow, Program,
    ProgramArea, ProgramLink, ProgramRecord, RegionCode, UnitGroup, UnitGroupRecord,
    UnitGroupSection,
};
use chrono::{DateTime, Duration, NaiveDate};
use std::collections::HashSet;

/// Duration recorded for programs that do not state one
pub const DEFAULT_DURATION: &str = "Unknown";

/// Outlook language when the row has none
pub const DEFAULT_LANGUAGE: &str = "en";

/// Release date assumed for outlook rows without one
pub fn default_release_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// One program-to-code pair before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    pub program_id: String,
    pub raw_code: String,
}

/// A unit group with its mapped sections
#[derive(Debug, Clone, PartialEq)]
pub struct MappedUnitGroup {
    pub unit_group: UnitGroup,
    pub sections: Vec<UnitGroupSection>,
    /// Sections dropped for lacking a title
    pub dropped_sections: usize,
}

/// Unique program areas in order of first appearance
///
/// Programs without an area id contribute nothing. The title comes from
/// the first program naming the area and falls back to the id.
pub fn extract_program_areas(programs: &[ProgramRecord]) -> Vec<ProgramArea> {
    let mut seen = HashSet::new();
    programs
        .iter()
        .filter_map(|program| {
            let id = program.program_area_id.as_deref()?;
            if !seen.insert(id.to_string()) {
                return None;
            }
            Some(ProgramArea {
                external_id: id.to_string(),
                title: program
                    .program_area_title
                    .clone()
                    .unwrap_or_else(|| id.to_string()),
            })
        })
        .collect()
}

/// Maps a program record, or names the missing field
pub fn map_program(record: &ProgramRecord) -> Result<Program, String> {
    let external_id = record
        .program_id
        .clone()
        .ok_or_else(|| "missing programId".to_string())?;
    let title = record
        .title
        .clone()
        .ok_or_else(|| format!("program {external_id} is missing a title"))?;
    let program_area_id = record
        .program_area_id
        .clone()
        .ok_or_else(|| format!("program {external_id} is missing programAreaId"))?;

    let known_codes = record
        .known_noc_groups
        .iter()
        .filter_map(|raw| ClassificationCode::normalize(raw).ok())
        .map(ClassificationCode::into_inner)
        .collect();

    Ok(Program {
        external_id,
        title,
        duration: record
            .duration
            .clone()
            .unwrap_or_else(|| DEFAULT_DURATION.to_string()),
        credential: CredentialKind::normalize(record.credential.as_deref()),
        keywords: record.keywords.clone(),
        skills: record.skills.clone(),
        known_codes,
        program_area_id,
    })
}

/// Every known code of every identified program, in source order
pub fn flatten_links(programs: &[ProgramRecord]) -> Vec<LinkCandidate> {
    programs
        .iter()
        .filter_map(|program| Some((program.program_id.as_deref()?, program)))
        .flat_map(|(program_id, program)| {
            program
                .known_noc_groups
                .iter()
                .map(move |raw_code| LinkCandidate {
                    program_id: program_id.to_string(),
                    raw_code: raw_code.clone(),
                })
        })
        .collect()
}

/// Links generated from known-code lists are certain
pub fn map_link(candidate: &LinkCandidate) -> Result<ProgramLink, String> {
    let classification_code = ClassificationCode::normalize(&candidate.raw_code)?;
    Ok(ProgramLink {
        program_id: candidate.program_id.clone(),
        classification_code,
        is_known: true,
        confidence: 1.0,
    })
}

pub fn map_unit_group(record: &UnitGroupRecord) -> Result<MappedUnitGroup, String> {
    let raw_code = record
        .noc_code
        .as_deref()
        .ok_or_else(|| "missing nocCode".to_string())?;
    let code = ClassificationCode::normalize(raw_code)?;
    let occupation_title = record
        .occupation
        .clone()
        .ok_or_else(|| format!("unit group {code} is missing an occupation title"))?;

    let mut dropped_sections = 0;
    let sections = record
        .sections
        .iter()
        .filter_map(|section| match &section.title {
            Some(title) => Some(UnitGroupSection {
                parent_code: code.clone(),
                title: title.clone(),
                items: section.items.clone(),
            }),
            None => {
                dropped_sections += 1;
                None
            }
        })
        .collect();

    Ok(MappedUnitGroup {
        unit_group: UnitGroup {
            code,
            occupation_title,
        },
        sections,
        dropped_sections,
    })
}

/// Unique economic regions by code, in order of first appearance
///
/// Rows without a usable region code or province are ignored here; the
/// outlook seeder reports them.
pub fn extract_regions(rows: &[OutlookRow]) -> Vec<EconomicRegion> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter_map(|row| {
            let region_code = RegionCode::normalize(row.region_code.as_deref()?).ok()?;
            let province = row.province.clone()?;
            if !seen.insert(region_code.clone()) {
                return None;
            }
            let region_name = row
                .region_name
                .clone()
                .unwrap_or_else(|| region_code.to_string());
            Some(EconomicRegion {
                region_code,
                province,
                region_name,
            })
        })
        .collect()
}

/// Maps one outlook row
///
/// Code, region, province and rating are required. A missing release date
/// becomes [`default_release_date`]; an unparsable one rejects the row.
pub fn map_outlook(row: &OutlookRow) -> Result<Outlook, String> {
    let raw_code = row
        .noc_code
        .as_deref()
        .ok_or_else(|| "missing classification code".to_string())?;
    let classification_code = ClassificationCode::normalize(raw_code)?;
    let region_code = RegionCode::normalize(
        row.region_code
            .as_deref()
            .ok_or_else(|| format!("outlook {classification_code} is missing a region code"))?,
    )?;
    let province = row
        .province
        .clone()
        .ok_or_else(|| format!("outlook {classification_code} is missing a province"))?;
    let outlook_rating = parse_rating(
        row.outlook
            .as_deref()
            .ok_or_else(|| format!("outlook {classification_code} is missing a rating"))?,
    )?;
    let release_date = parse_release_date(row.release_date.as_deref())?;

    Ok(Outlook {
        classification_code,
        region_code,
        province,
        release_date,
        language: row
            .language
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        outlook_rating,
        trends: row.trends.clone().unwrap_or_default(),
    })
}

/// Parses a 1 to 5 rating given as a number or a label
pub fn parse_rating(raw: &str) -> Result<i16, String> {
    let text = raw.trim().to_lowercase();
    let rating = match text.as_str() {
        "very good" => 5,
        "good" => 4,
        "moderate" | "fair" => 3,
        "limited" => 2,
        "very limited" => 1,
        numeric => {
            let value: f64 = numeric
                .parse()
                .map_err(|_| format!("unrecognised outlook rating '{raw}'"))?;
            if value.fract() != 0.0 {
                return Err(format!("outlook rating '{raw}' is not a whole number"));
            }
            value as i16
        }
    };

    if (1..=5).contains(&rating) {
        Ok(rating)
    } else {
        Err(format!("outlook rating '{raw}' is outside 1..=5"))
    }
}

/// Parses a release date cell
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, an RFC 3339 or `YYYY-MM-DD hh:mm:ss`
/// timestamp, or a spreadsheet serial day number.
pub fn parse_release_date(raw: Option<&str>) -> Result<NaiveDate, String> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(default_release_date());
    };

    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(date);
        }
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.date_naive());
    }
    if let Some(date) = raw
        .get(..10)
        .filter(|_| matches!(raw.as_bytes().get(10), Some(b'T') | Some(b' ')))
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
    {
        return Ok(date);
    }

    if let Ok(serial) = raw.parse::<f64>() {
        if (1.0..=2_958_465.0).contains(&serial) {
            let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
                .ok_or_else(|| "invalid spreadsheet epoch".to_string())?;
            return epoch
                .checked_add_signed(Duration::days(serial.trunc() as i64))
                .ok_or_else(|| format!("release date serial '{raw}' is out of range"));
        }
    }

    Err(format!("unparsable release date '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SectionRecord;
    use test_case::test_case;

    fn program(id: &str, area: Option<&str>, codes: &[&str]) -> ProgramRecord {
        ProgramRecord {
            program_id: Some(id.to_string()),
            title: Some(format!("Program {id}")),
            program_area_id: area.map(str::to_string),
            known_noc_groups: codes.iter().map(|c| c.to_string()).collect(),
            ..ProgramRecord::default()
        }
    }

    fn outlook_row() -> OutlookRow {
        OutlookRow {
            noc_code: Some("NOC_12345".to_string()),
            region_code: Some("3510".to_string()),
            region_name: Some("Toronto".to_string()),
            province: Some("ON".to_string()),
            outlook: Some("Good".to_string()),
            ..OutlookRow::default()
        }
    }

    #[test]
    fn test_extract_program_areas_first_appearance() {
        let mut first = program("p1", Some("a2"), &[]);
        first.program_area_title = Some("Trades".to_string());
        let programs = vec![
            first,
            program("p2", Some("a1"), &[]),
            program("p3", Some("a2"), &[]),
            program("p4", None, &[]),
        ];

        let areas = extract_program_areas(&programs);
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].external_id, "a2");
        assert_eq!(areas[0].title, "Trades");
        assert_eq!(areas[1].title, "a1");
    }

    #[test]
    fn test_map_program_defaults() {
        let mut record = program("p1", Some("a1"), &["NOC_21232", "bogus", "311"]);
        record.credential = Some("Bachelor of Arts".to_string());

        let mapped = map_program(&record).unwrap();
        assert_eq!(mapped.duration, DEFAULT_DURATION);
        assert_eq!(mapped.credential, CredentialKind::Degree);
        assert_eq!(mapped.known_codes, vec!["21232", "00311"]);
    }

    #[test]
    fn test_map_program_requires_area() {
        assert!(map_program(&program("p1", None, &[])).is_err());
        assert!(map_program(&ProgramRecord::default()).is_err());
    }

    #[test]
    fn test_flatten_links_keeps_invalid_codes_for_counting() {
        let programs = vec![
            program("p1", Some("a"), &["NOC_21232", "bogus"]),
            ProgramRecord {
                known_noc_groups: vec!["11111".to_string()],
                ..ProgramRecord::default()
            },
            program("p2", Some("a"), &["1234"]),
        ];

        let links = flatten_links(&programs);
        assert_eq!(links.len(), 3);
        assert!(map_link(&links[1]).is_err());

        let link = map_link(&links[2]).unwrap();
        assert_eq!(link.classification_code.as_str(), "01234");
        assert!(link.is_known);
        assert_eq!(link.confidence, 1.0);
    }

    #[test]
    fn test_map_unit_group_drops_untitled_sections() {
        let record = UnitGroupRecord {
            noc_code: Some("NOC_21232".to_string()),
            occupation: Some("Software developers".to_string()),
            sections: vec![
                SectionRecord {
                    title: Some("Main duties".to_string()),
                    items: vec!["Write code".to_string()],
                },
                SectionRecord {
                    title: None,
                    items: Vec::new(),
                },
            ],
        };

        let mapped = map_unit_group(&record).unwrap();
        assert_eq!(mapped.unit_group.code.as_str(), "21232");
        assert_eq!(mapped.sections.len(), 1);
        assert_eq!(mapped.dropped_sections, 1);
    }

    #[test]
    fn test_extract_regions_dedupes_by_code() {
        let mut second = outlook_row();
        second.region_code = Some("3510.0".to_string());
        let mut third = outlook_row();
        third.region_code = Some("5920".to_string());
        third.region_name = None;

        let regions = extract_regions(&[outlook_row(), second, third]);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[1].region_name, "5920");
    }

    #[test]
    fn test_map_outlook_defaults_release_date() {
        let outlook = map_outlook(&outlook_row()).unwrap();
        assert_eq!(outlook.classification_code.as_str(), "12345");
        assert_eq!(outlook.release_date, default_release_date());
        assert_eq!(outlook.language, "en");
        assert_eq!(outlook.trends, "");
        assert_eq!(outlook.outlook_rating, 4);
    }

    #[test]
    fn test_map_outlook_rejects_bad_date() {
        let mut row = outlook_row();
        row.release_date = Some("next spring".to_string());
        assert!(map_outlook(&row).is_err());
    }

    #[test]
    fn test_map_outlook_requires_province() {
        let mut row = outlook_row();
        row.province = None;
        assert!(map_outlook(&row).is_err());
    }

    #[test_case("5", 5 ; "numeric")]
    #[test_case("3.0", 3 ; "spreadsheet numeric")]
    #[test_case("Very Good", 5 ; "very good label")]
    #[test_case("limited", 2 ; "limited label")]
    #[test_case(" very limited ", 1 ; "padded label")]
    fn test_parse_rating(raw: &str, expected: i16) {
        assert_eq!(parse_rating(raw).unwrap(), expected);
    }

    #[test_case("0" ; "below range")]
    #[test_case("6" ; "above range")]
    #[test_case("2.5" ; "fractional")]
    #[test_case("undetermined" ; "unknown label")]
    fn test_parse_rating_rejects(raw: &str) {
        assert!(parse_rating(raw).is_err());
    }

    #[test_case(Some("2024-03-01"), (2024, 3, 1) ; "iso date")]
    #[test_case(Some("2023/11/15"), (2023, 11, 15) ; "slashed date")]
    #[test_case(Some("2024-03-01T00:00:00Z"), (2024, 3, 1) ; "rfc3339")]
    #[test_case(Some("2024-03-01 12:00:00"), (2024, 3, 1) ; "naive timestamp")]
    #[test_case(Some("45352"), (2024, 3, 1) ; "spreadsheet serial")]
    #[test_case(None, (2024, 1, 1) ; "missing")]
    #[test_case(Some("  "), (2024, 1, 1) ; "blank")]
    fn test_parse_release_date(raw: Option<&str>, expected: (i32, u32, u32)) {
        let expected = NaiveDate::from_ymd_opt(expected.0, expected.1, expected.2).unwrap();
        assert_eq!(parse_release_date(raw).unwrap(), expected);
    }
}
