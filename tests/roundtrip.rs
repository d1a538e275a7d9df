use std::fs;
use std::path::{Path, PathBuf};

use cricket_pipeline::config::PipelineConfig;
use cricket_pipeline::export::{
    ADVANCED_DIR, CLEANED_DELIVERIES_FILE, MATCH_SUMMARY_FILE, PLAYER_MATCH_FILE, SEASON_FILE,
    TEAM_SEASON_FILE,
};
use cricket_pipeline::match_summary::MatchSummary;
use cricket_pipeline::pipeline::{
    run, run_clean_stage, run_matches_stage, run_players_stage, run_rollups_stage,
};
use cricket_pipeline::player_match::PlayerMatchEntry;
use cricket_pipeline::table::{Table, read_records};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn config_for(out_dir: &Path) -> PipelineConfig {
    PipelineConfig {
        deliveries_path: fixture_path("deliveries.csv"),
        matches_path: Some(fixture_path("matches.csv")),
        output_dir: out_dir.to_path_buf(),
        min_balls: 2,
        ..PipelineConfig::default()
    }
}

#[test]
fn full_run_writes_every_stage_table() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config_for(dir.path());
    let report = run(&cfg).expect("pipeline run");

    for name in [CLEANED_DELIVERIES_FILE, MATCH_SUMMARY_FILE, PLAYER_MATCH_FILE, TEAM_SEASON_FILE, SEASON_FILE] {
        assert!(dir.path().join(name).exists(), "{name} missing");
    }
    assert!(dir.path().join(ADVANCED_DIR).is_dir());
    assert!(report.written.len() >= 7 + 9);

    let header = fs::read_to_string(dir.path().join(MATCH_SUMMARY_FILE)).unwrap();
    assert!(header.starts_with("match_code,match_id,season,season_start_year,season_no,season_match_no,date,"));
}

#[test]
fn stage_files_reproduce_in_memory_results() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config_for(dir.path());
    let report = run(&cfg).expect("pipeline run");

    let matches: Vec<MatchSummary> = read_records(
        &dir.path().join(MATCH_SUMMARY_FILE),
        &cfg.encodings,
        "match_summary",
    )
    .unwrap();
    assert_eq!(matches, report.outputs.matches);

    let staged = dir.path().join("staged");
    let rows = run_players_stage(
        &dir.path().join(CLEANED_DELIVERIES_FILE),
        &dir.path().join(MATCH_SUMMARY_FILE),
        &staged.join(PLAYER_MATCH_FILE),
        &cfg,
    )
    .unwrap();
    assert_eq!(rows, report.outputs.player_matches);

    let reread: Vec<PlayerMatchEntry> =
        read_records(&staged.join(PLAYER_MATCH_FILE), &cfg.encodings, "player_match_summary").unwrap();
    assert_eq!(reread, report.outputs.player_matches);
}

#[test]
fn per_stage_chain_matches_full_run() {
    let full = tempfile::tempdir().expect("tempdir");
    let cfg = config_for(full.path());
    run(&cfg).expect("pipeline run");

    let staged = tempfile::tempdir().expect("tempdir");
    let s = staged.path();
    run_clean_stage(&cfg.deliveries_path, &s.join(CLEANED_DELIVERIES_FILE), &cfg).unwrap();
    run_matches_stage(
        &s.join(CLEANED_DELIVERIES_FILE),
        cfg.matches_path.as_deref(),
        &s.join(MATCH_SUMMARY_FILE),
        &cfg,
    )
    .unwrap();
    run_players_stage(
        &s.join(CLEANED_DELIVERIES_FILE),
        &s.join(MATCH_SUMMARY_FILE),
        &s.join(PLAYER_MATCH_FILE),
        &cfg,
    )
    .unwrap();
    run_rollups_stage(&s.join(PLAYER_MATCH_FILE), &s.join(MATCH_SUMMARY_FILE), s, &cfg).unwrap();

    for name in [
        CLEANED_DELIVERIES_FILE,
        MATCH_SUMMARY_FILE,
        PLAYER_MATCH_FILE,
        TEAM_SEASON_FILE,
        SEASON_FILE,
    ] {
        let a = fs::read(full.path().join(name)).unwrap();
        let b = fs::read(s.join(name)).unwrap();
        assert_eq!(a, b, "{name} differs between full run and staged run");
    }
}

#[test]
fn repeated_runs_are_byte_identical() {
    let first = tempfile::tempdir().expect("tempdir");
    let second = tempfile::tempdir().expect("tempdir");
    let a = run(&config_for(first.path())).expect("first run");
    let b = run(&config_for(second.path())).expect("second run");
    assert_eq!(a.written.len(), b.written.len());

    for path in &a.written {
        let rel = path.strip_prefix(first.path()).unwrap();
        let left = fs::read(path).unwrap();
        let right = fs::read(second.path().join(rel)).unwrap();
        assert_eq!(left, right, "{} differs between runs", rel.display());
    }
}

#[test]
fn header_only_output_for_empty_stage() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("empty.csv");
    cricket_pipeline::table::write_records::<MatchSummary>(&[], &path).unwrap();
    let table = Table::read_csv(&path, &PipelineConfig::default().encodings).unwrap();
    assert!(table.is_empty());
    assert_eq!(table.headers()[0], "match_code");
}

#[test]
fn workbook_is_written_when_configured() {
    let dir = tempfile::tempdir().expect("tempdir");
    let workbook = dir.path().join("reports").join("pipeline.xlsx");
    let cfg = PipelineConfig {
        workbook_path: Some(workbook.clone()),
        ..config_for(dir.path())
    };
    let report = run(&cfg).expect("pipeline run");
    assert!(workbook.exists());
    assert!(report.written.contains(&workbook));
    assert!(fs::metadata(&workbook).unwrap().len() > 0);
}
