//! Seeding from source files on disk

use noc_seeder::adapters::checkpoint::FileCheckpointStore;
use noc_seeder::adapters::database::{Backends, CheckpointStore, SeedStore};
use noc_seeder::adapters::memory::MemoryStore;
use noc_seeder::adapters::source::{FileSourceProvider, SourceProvider};
use noc_seeder::cli::commands::exit_code_for;
use noc_seeder::config::{parse_config, SeederConfig};
use noc_seeder::core::coordinator::RunCoordinator;
use noc_seeder::domain::{EntityKind, SeedError};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const PROGRAMS: &str = r#"{
  "programs": [
    {
      "programId": 1042,
      "title": "Practical Nursing",
      "programAreaId": 7,
      "programArea": "Health",
      "credential": "Ontario College Diploma",
      "knownNocGroups": ["NOC_32101"]
    },
    {
      "programId": "1043",
      "title": "Computer Programming",
      "programAreaId": "9",
      "programArea": "Technology",
      "duration": "2 years",
      "credential": "Bachelor of Technology",
      "knownNocGroups": ["21232", "NOC_99999"]
    }
  ]
}"#;

const UNIT_GROUPS: &str = r#"[
  {
    "nocCode": 32101,
    "occupation": "Licensed practical nurses",
    "sections": [
      {"title": "Main duties", "items": ["Provide care"]},
      {"title": "Employment requirements", "items": ["Completion of a college program"]}
    ]
  },
  {"nocCode": "NOC_21232", "occupation": "Software developers and programmers"}
]"#;

const OUTLOOKS: &str = "\u{feff}NOC_Code;Economic Region Code;Economic Region Name;Province;Outlook;Employment Trends;Release Date;Language\n\
NOC_32101;3510;Ottawa;ON;Very good;Growing demand;2024-11-15;EN\n\
21232;3510.0;Ottawa;ON;3;;;\n\
;;;;;;;\n\
21232;5910;Vancouver Island;BC;Undetermined;;;\n";

fn write_sources(dir: &Path) -> SeederConfig {
    fs::write(dir.join("programs.json"), PROGRAMS).unwrap();
    fs::write(dir.join("unit_groups.json"), UNIT_GROUPS).unwrap();
    fs::write(dir.join("outlooks.csv"), OUTLOOKS).unwrap();

    parse_config(&format!(
        r#"
database_target = "memory"

[sources]
programs_path = "{dir}/programs.json"
unit_groups_path = "{dir}/unit_groups.json"
outlooks_path = "{dir}/outlooks.csv"
outlook_delimiter = ";"

[seed]
inter_batch_delay_ms = 0

[state]
checkpoint_path = "{dir}/state/checkpoints.json"
"#,
        dir = dir.display()
    ))
    .unwrap()
}

fn backends(store: &Arc<MemoryStore>, config: &SeederConfig) -> Backends {
    Backends {
        store: Arc::clone(store) as Arc<dyn SeedStore + Send + Sync>,
        checkpoints: Some(Arc::new(FileCheckpointStore::new(
            &config.state.checkpoint_path,
        ))),
        connection_ceiling: None,
    }
}

#[tokio::test]
async fn test_file_provider_reads_every_collection() {
    let dir = TempDir::new().unwrap();
    let config = write_sources(dir.path());
    let provider = FileSourceProvider::new(&config.sources);

    let sources = provider.load_all().await.unwrap();
    assert_eq!(sources.programs.len(), 2);
    assert_eq!(sources.unit_groups.len(), 2);
    // The all-blank row is dropped
    assert_eq!(sources.outlooks.len(), 3);
    assert_eq!(sources.outlooks[0].region_name.as_deref(), Some("Ottawa"));
    assert_eq!(sources.outlooks[1].release_date, None);
}

#[tokio::test]
async fn test_full_run_from_files() {
    let dir = TempDir::new().unwrap();
    let config = write_sources(dir.path());
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(FileSourceProvider::new(&config.sources));

    let report = RunCoordinator::new(&config, backends(&store, &config), provider, false)
        .run()
        .await
        .unwrap();

    let snapshot = store.snapshot().unwrap();
    assert_eq!(snapshot.program_areas.len(), 2);
    assert_eq!(snapshot.programs.len(), 2);
    assert_eq!(snapshot.unit_groups.len(), 2);
    assert_eq!(snapshot.sections.len(), 2);
    assert_eq!(snapshot.regions.len(), 2);

    // "Undetermined" is not a rating
    let outlooks = report.result_for(EntityKind::Outlook).unwrap();
    assert_eq!((outlooks.created, outlooks.skipped), (2, 1));
    assert!(snapshot.outlooks.iter().any(|o| o.language == "en"));

    // NOC_99999 has no unit group
    let links = report.result_for(EntityKind::ProgramLink).unwrap();
    assert_eq!((links.created, links.skipped), (2, 1));

    let programming = snapshot
        .programs
        .iter()
        .find(|p| p.external_id == "1043")
        .unwrap();
    assert_eq!(programming.credential.as_str(), "DEGREE");
    assert_eq!(programming.duration, "2 years");

    let checkpoints = FileCheckpointStore::new(&config.state.checkpoint_path)
        .load_all()
        .await
        .unwrap();
    assert_eq!(checkpoints.len(), 5);
    assert!(checkpoints.iter().all(|c| c.source_fingerprint.is_some()));
}

#[tokio::test]
async fn test_changed_source_is_flagged_in_skip_plan() {
    let dir = TempDir::new().unwrap();
    let config = write_sources(dir.path());
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(FileSourceProvider::new(&config.sources));

    RunCoordinator::new(&config, backends(&store, &config), provider.clone(), false)
        .run()
        .await
        .unwrap();

    let reordered = PROGRAMS.replace("1042", "2042");
    fs::write(dir.path().join("programs.json"), reordered).unwrap();

    let plan = RunCoordinator::new(&config, backends(&store, &config), provider, false)
        .skip_plan()
        .await;

    let programs = plan.entry(EntityKind::Program).unwrap();
    assert_eq!(programs.skip, 2);
    assert!(programs.fingerprint_changed);
    assert!(!plan.entry(EntityKind::UnitGroup).unwrap().fingerprint_changed);
}

#[tokio::test]
async fn test_missing_source_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let mut config = write_sources(dir.path());
    config.sources.outlooks_path = dir.path().join("absent.csv").display().to_string();
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(FileSourceProvider::new(&config.sources));

    let err = RunCoordinator::new(&config, backends(&store, &config), provider, false)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, SeedError::Source(_)));
    assert_eq!(exit_code_for(&err), 5);
    assert_eq!(store.upsert_calls(EntityKind::ProgramArea), 0);
}

#[tokio::test]
async fn test_malformed_json_names_the_file() {
    let dir = TempDir::new().unwrap();
    let config = write_sources(dir.path());
    fs::write(dir.path().join("unit_groups.json"), "{not json").unwrap();

    let err = FileSourceProvider::new(&config.sources)
        .unit_groups()
        .await
        .unwrap_err();

    assert!(err.to_string().contains("unit_groups.json"));
}
