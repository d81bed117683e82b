//! End-to-end seeding runs against the in-memory store

use noc_seeder::adapters::database::{Backends, SeedStore};
use noc_seeder::adapters::memory::{MemoryCheckpointStore, MemoryStore};
use noc_seeder::adapters::source::{SourceSet, StaticSourceProvider};
use noc_seeder::cli::commands::exit_code_for;
use noc_seeder::config::{parse_config, SeederConfig};
use noc_seeder::core::coordinator::RunCoordinator;
use noc_seeder::core::report::RunReport;
use noc_seeder::domain::{
    ClassificationCode, EntityKind, OutlookRow, ProgramRecord, SectionRecord, SeedError,
    StoreError, UnitGroupRecord,
};
use chrono::NaiveDate;
use std::sync::Arc;

const CONFIG: &str = r#"
database_target = "memory"

[sources]
programs_path = "unused.json"
unit_groups_path = "unused.json"
outlooks_path = "unused.csv"

[seed]
batch_size = 3
parallel_groups = 2
inter_batch_delay_ms = 0
fanout_concurrency = 2

[retry]
max_retries = 2
base_delay_ms = 1
"#;

fn config() -> SeederConfig {
    parse_config(CONFIG).unwrap()
}

fn program(id: &str, area: &str, codes: &[&str]) -> ProgramRecord {
    ProgramRecord {
        program_id: Some(id.to_string()),
        title: Some(format!("Program {id}")),
        program_area_id: Some(area.to_string()),
        program_area_title: Some(format!("Area {area}")),
        credential: Some("Ontario College Diploma".to_string()),
        known_noc_groups: codes.iter().map(|c| c.to_string()).collect(),
        ..Default::default()
    }
}

/// Ten programs spread over three areas
fn ten_programs() -> Vec<ProgramRecord> {
    (0..10)
        .map(|i| program(&format!("p{i:02}"), &format!("a{}", i % 3), &[]))
        .collect()
}

fn unit_group(code: &str, sections: &[&str]) -> UnitGroupRecord {
    UnitGroupRecord {
        noc_code: Some(code.to_string()),
        occupation: Some(format!("Occupation {code}")),
        sections: sections
            .iter()
            .map(|title| SectionRecord {
                title: Some(title.to_string()),
                items: vec![format!("{title} item")],
            })
            .collect(),
    }
}

fn outlook(code: &str, region: &str, rating: &str, date: Option<&str>) -> OutlookRow {
    OutlookRow {
        noc_code: Some(code.to_string()),
        region_code: Some(region.to_string()),
        region_name: Some(format!("Region {region}")),
        province: Some("ON".to_string()),
        outlook: Some(rating.to_string()),
        trends: None,
        release_date: date.map(str::to_string),
        language: None,
    }
}

fn backends(store: &Arc<MemoryStore>, ceiling: Option<usize>) -> Backends {
    Backends {
        store: Arc::clone(store) as Arc<dyn SeedStore + Send + Sync>,
        checkpoints: Some(Arc::new(MemoryCheckpointStore::new())),
        connection_ceiling: ceiling,
    }
}

async fn run(config: &SeederConfig, store: &Arc<MemoryStore>, sources: SourceSet) -> RunReport {
    try_run(config, store, sources).await.unwrap()
}

async fn try_run(
    config: &SeederConfig,
    store: &Arc<MemoryStore>,
    sources: SourceSet,
) -> Result<RunReport, SeedError> {
    let provider = Arc::new(StaticSourceProvider::new(sources));
    RunCoordinator::new(config, backends(store, None), provider, false)
        .run()
        .await
}

fn counts(report: &RunReport, entity: EntityKind) -> (usize, usize, usize) {
    let result = report.result_for(entity).unwrap();
    (result.created, result.skipped, result.errors)
}

#[tokio::test]
async fn test_empty_store_creates_every_record() {
    let store = Arc::new(MemoryStore::new());
    let sources = SourceSet {
        programs: ten_programs(),
        ..Default::default()
    };

    let report = run(&config(), &store, sources).await;

    assert!(report.success);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(counts(&report, EntityKind::ProgramArea), (3, 0, 0));
    assert_eq!(counts(&report, EntityKind::Program), (10, 0, 0));
    assert_eq!(store.count(EntityKind::Program).await.unwrap(), 10);
}

#[tokio::test]
async fn test_partial_store_resumes_after_stored_prefix() {
    let store = Arc::new(MemoryStore::new());
    let all = ten_programs();

    run(
        &config(),
        &store,
        SourceSet {
            programs: all[..4].to_vec(),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(store.count(EntityKind::ProgramArea).await.unwrap(), 3);
    assert_eq!(store.count(EntityKind::Program).await.unwrap(), 4);

    let report = run(
        &config(),
        &store,
        SourceSet {
            programs: all,
            ..Default::default()
        },
    )
    .await;

    let areas = report.result_for(EntityKind::ProgramArea).unwrap();
    assert_eq!(areas.skip, 3);
    assert_eq!(areas.created, 0);

    let programs = report.result_for(EntityKind::Program).unwrap();
    assert_eq!(programs.skip, 4);
    assert_eq!((programs.created, programs.skipped), (6, 0));

    // Only the tail was written on the second run
    assert_eq!(store.upsert_calls(EntityKind::Program), 10);
    assert_eq!(store.count(EntityKind::Program).await.unwrap(), 10);
}

#[tokio::test]
async fn test_program_with_unknown_area_is_skipped() {
    let store = Arc::new(MemoryStore::new());
    let mut programs = ten_programs();
    // Not a source area either, so the area seeder never creates it
    programs[5].program_area_id = None;
    programs[5].program_area_title = None;
    let mut config = config();
    config.seed.entities.program_areas = false;

    store
        .upsert_program_area(&noc_seeder::domain::ProgramArea {
            external_id: "a0".to_string(),
            title: "Area a0".to_string(),
        })
        .await
        .unwrap();

    let report = run(
        &config,
        &store,
        SourceSet {
            programs,
            ..Default::default()
        },
    )
    .await;

    // a0 exists; a1 and a2 were never seeded; p05 has no area at all
    let (created, skipped, errors) = counts(&report, EntityKind::Program);
    assert_eq!(created, 4);
    assert_eq!(skipped, 6);
    assert_eq!(errors, 0);
    assert!(report.success);
    assert!(report.result_for(EntityKind::ProgramArea).is_none());
}

#[tokio::test]
async fn test_outlook_codes_normalized_and_date_defaulted() {
    let store = Arc::new(MemoryStore::new());
    let sources = SourceSet {
        unit_groups: vec![unit_group("12345", &[])],
        outlooks: vec![
            outlook("NOC_12345", "3510", "Good", None),
            outlook("12345", "3520.0", "5", Some("2025-03-01")),
        ],
        ..Default::default()
    };

    let report = run(&config(), &store, sources).await;
    assert_eq!(counts(&report, EntityKind::Outlook), (2, 0, 0));

    let snapshot = store.snapshot().unwrap();
    assert_eq!(snapshot.regions.len(), 2);
    let first = snapshot
        .outlooks
        .iter()
        .find(|o| o.region_code.as_str() == "3510")
        .unwrap();
    assert_eq!(first.classification_code.as_str(), "12345");
    assert_eq!(
        first.release_date,
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    );
    assert_eq!(first.outlook_rating, 4);
    assert_eq!(first.language, "en");
    assert_eq!(first.trends, "");
}

#[tokio::test]
async fn test_unique_violation_is_benign_and_batch_continues() {
    let store = Arc::new(MemoryStore::new());
    store.inject_failure(
        EntityKind::Program,
        "p04",
        StoreError::UniqueViolation("programs_pkey".to_string()),
        1,
    );

    let report = run(
        &config(),
        &store,
        SourceSet {
            programs: ten_programs(),
            ..Default::default()
        },
    )
    .await;

    assert_eq!(counts(&report, EntityKind::Program), (9, 1, 0));
    assert!(report.success);
    // p05 shares p04's group and still went through
    let snapshot = store.snapshot().unwrap();
    assert!(snapshot.programs.iter().any(|p| p.external_id == "p05"));
}

#[tokio::test]
async fn test_second_run_leaves_store_unchanged() {
    let store = Arc::new(MemoryStore::new());
    let sources = SourceSet {
        programs: vec![
            program("p1", "a1", &["21232", "NOC_1111"]),
            program("p2", "a2", &["21232"]),
        ],
        unit_groups: vec![
            unit_group("21232", &["Main duties", "Employment requirements"]),
            unit_group("01111", &["Main duties"]),
        ],
        outlooks: vec![
            outlook("21232", "3510", "Very good", Some("2024-12-01")),
            outlook("01111", "3510", "Limited", Some("2024-12-01")),
        ],
    };

    let first = run(&config(), &store, sources.clone()).await;
    assert!(first.success);
    let after_first = store.snapshot().unwrap();
    assert_eq!(after_first.links.len(), 3);
    assert_eq!(after_first.sections.len(), 3);

    let second = run(&config(), &store, sources).await;
    assert!(second.success);
    assert_eq!(second.total_created, 0);
    assert_eq!(store.snapshot().unwrap(), after_first);
}

#[tokio::test]
async fn test_stale_rows_clamp_skip_to_source_length() {
    let store = Arc::new(MemoryStore::new());
    run(
        &config(),
        &store,
        SourceSet {
            programs: ten_programs(),
            ..Default::default()
        },
    )
    .await;

    let report = run(
        &config(),
        &store,
        SourceSet {
            programs: ten_programs()[..4].to_vec(),
            ..Default::default()
        },
    )
    .await;

    let programs = report.result_for(EntityKind::Program).unwrap();
    assert_eq!(programs.skip, 4);
    assert_eq!(programs.processed(), 0);
    assert_eq!(store.upsert_calls(EntityKind::Program), 10);
}

#[tokio::test]
async fn test_every_section_written_when_unit_group_processed() {
    let store = Arc::new(MemoryStore::new());
    store.inject_failure(
        EntityKind::UnitGroupSection,
        "21232/Main duties",
        StoreError::InvalidInput("bad items".to_string()),
        1,
    );
    let sources = SourceSet {
        unit_groups: vec![unit_group(
            "21232",
            &["Main duties", "Employment requirements", "Example titles"],
        )],
        ..Default::default()
    };

    let report = run(&config(), &store, sources).await;

    assert_eq!(counts(&report, EntityKind::UnitGroup), (1, 0, 0));
    assert_eq!(store.upsert_calls(EntityKind::UnitGroupSection), 3);
    let sections = store
        .find_sections(&ClassificationCode::normalize("21232").unwrap())
        .await
        .unwrap();
    assert_eq!(sections.len(), 2);
}

#[tokio::test]
async fn test_created_plus_skipped_matches_presented_records() {
    let store = Arc::new(MemoryStore::new());
    let mut programs = ten_programs();
    programs.push(ProgramRecord::default());
    programs[3].title = None;

    let sources = SourceSet {
        programs,
        unit_groups: vec![unit_group("21232", &[]), unit_group("not-a-code", &[])],
        outlooks: vec![
            outlook("21232", "3510", "Good", None),
            outlook("21232", "3520", "Excellent", None),
            outlook("21232", "3530", "Fair", Some("yesterday")),
        ],
    };
    let presented = sources.clone();

    let report = run(&config(), &store, sources).await;

    for result in &report.results {
        let source_len = match result.entity {
            EntityKind::Program => presented.programs.len(),
            EntityKind::UnitGroup => presented.unit_groups.len(),
            EntityKind::Outlook => presented.outlooks.len(),
            _ => continue,
        };
        assert_eq!(
            result.created + result.skipped,
            source_len - result.skip,
            "{}",
            result.entity
        );
    }
    assert_eq!(counts(&report, EntityKind::Program), (9, 2, 0));
    assert_eq!(counts(&report, EntityKind::Outlook), (1, 2, 0));
}

#[tokio::test]
async fn test_parallelism_capped_by_connection_ceiling() {
    let store = Arc::new(MemoryStore::new());
    let mut config = config();
    config.seed.batch_size = 1;
    config.seed.parallel_groups = 8;
    config.seed.entities.program_areas = false;
    for i in 0..3 {
        store
            .upsert_program_area(&noc_seeder::domain::ProgramArea {
                external_id: format!("a{i}"),
                title: format!("Area a{i}"),
            })
            .await
            .unwrap();
    }

    let provider = Arc::new(StaticSourceProvider::new(SourceSet {
        programs: ten_programs(),
        ..Default::default()
    }));
    let report = RunCoordinator::new(&config, backends(&store, Some(2)), provider, false)
        .run()
        .await
        .unwrap();

    assert_eq!(counts(&report, EntityKind::Program), (10, 0, 0));
    assert!(store.peak_in_flight() <= 2);
}

#[tokio::test]
async fn test_failed_count_restarts_entity_from_zero() {
    let store = Arc::new(MemoryStore::new());
    let sources = SourceSet {
        programs: ten_programs(),
        ..Default::default()
    };
    run(&config(), &store, sources.clone()).await;

    store.fail_count(EntityKind::Program);
    let report = run(&config(), &store, sources).await;

    let programs = report.result_for(EntityKind::Program).unwrap();
    assert_eq!(programs.skip, 0);
    assert_eq!(programs.created, 10);
    // Areas still resumed from their own count
    assert_eq!(report.result_for(EntityKind::ProgramArea).unwrap().skip, 3);
    assert_eq!(store.snapshot().unwrap().programs.len(), 10);
}

#[tokio::test]
async fn test_record_errors_do_not_stop_later_entities() {
    let store = Arc::new(MemoryStore::new());
    store.fail_lookups(EntityKind::ProgramArea);
    let sources = SourceSet {
        programs: vec![program("p1", "a1", &["21232"])],
        unit_groups: vec![unit_group("21232", &[])],
        ..Default::default()
    };

    let report = run(&config(), &store, sources).await;

    assert_eq!(counts(&report, EntityKind::Program), (0, 1, 1));
    assert_eq!(counts(&report, EntityKind::UnitGroup), (1, 0, 0));
    // The link's program was never written
    assert_eq!(counts(&report, EntityKind::ProgramLink), (0, 1, 0));
    assert!(!report.success);
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn test_disabled_dependency_relies_on_stored_rows() {
    let store = Arc::new(MemoryStore::new());
    let mut config = config();
    config.seed.entities = noc_seeder::config::EntityToggles::only(&[EntityKind::ProgramLink]);
    let sources = SourceSet {
        programs: vec![program("p1", "a1", &["21232"])],
        unit_groups: vec![unit_group("21232", &[])],
        ..Default::default()
    };

    let report = run(&config, &store, sources).await;

    assert_eq!(report.results.len(), 1);
    assert_eq!(counts(&report, EntityKind::ProgramLink), (0, 1, 0));
}

#[tokio::test]
async fn test_unhealthy_store_aborts_before_seeding() {
    let store = Arc::new(MemoryStore::new());
    store.set_unhealthy(true);

    let err = try_run(
        &config(),
        &store,
        SourceSet {
            programs: ten_programs(),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SeedError::Database(_)));
    assert_eq!(exit_code_for(&err), 4);
    assert_eq!(store.upsert_calls(EntityKind::ProgramArea), 0);
}
