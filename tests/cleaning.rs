use std::path::PathBuf;

use cricket_pipeline::clean::{CleanOptions, NO_EXTRA, NO_WICKET, UNKNOWN, clean_deliveries};
use cricket_pipeline::config::PipelineConfig;
use cricket_pipeline::error::PipelineError;
use cricket_pipeline::table::Table;

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn read_fixture(name: &str) -> Table {
    let cfg = PipelineConfig::default();
    Table::read_csv(&fixture_path(name), &cfg.encodings).expect("fixture should load")
}

fn column(table: &Table, name: &str) -> Vec<Option<String>> {
    let idx = table.column_index(name).expect("column present");
    (0..table.len())
        .map(|row| table.value(row, idx).map(str::to_string))
        .collect()
}

#[test]
fn cleans_fixture_and_reports_counts() {
    let (cleaned, report) = clean_deliveries(read_fixture("deliveries.csv"), &CleanOptions::default());
    assert_eq!(report.rows_in, 20);
    assert_eq!(report.rows_out, 19);
    assert_eq!(report.duplicates_removed, 1);
    assert_eq!(report.dropped_columns, vec!["umpire".to_string()]);
    assert_eq!(report.numeric_coerced, 1);
    assert_eq!(report.runs_total_repaired, 1);
    assert_eq!(report.dates_unparsed, 0);
    assert_eq!(cleaned.len(), 19);
    assert!(!cleaned.has_column("umpire"));
}

#[test]
fn runs_total_matches_components_after_cleaning() {
    let (cleaned, _) = clean_deliveries(read_fixture("deliveries.csv"), &CleanOptions::default());
    let num = |name: &str| -> Vec<u64> {
        column(&cleaned, name)
            .into_iter()
            .map(|v| v.and_then(|v| v.parse().ok()).expect("numeric after cleaning"))
            .collect()
    };
    let (bat, extras, total) = (num("runs_batter"), num("runs_extras"), num("runs_total"));
    for idx in 0..cleaned.len() {
        assert_eq!(total[idx], bat[idx] + extras[idx], "row {idx}");
    }
}

#[test]
fn placeholders_become_sentinels_or_missing() {
    let (cleaned, _) = clean_deliveries(read_fixture("deliveries.csv"), &CleanOptions::default());
    let extra = column(&cleaned, "extra_type");
    let wicket = column(&cleaned, "wicket_kind");
    let out = column(&cleaned, "player_out");
    let potm = column(&cleaned, "player_of_match");

    assert_eq!(extra[0].as_deref(), Some(NO_EXTRA));
    assert_eq!(extra[1].as_deref(), Some("wides"));
    assert_eq!(wicket[0].as_deref(), Some(NO_WICKET));
    assert!(out[0].is_none());
    assert!(extra.iter().all(Option::is_some));
    assert!(wicket.iter().all(Option::is_some));
    // match 103 has no player of the match
    assert!(potm.last().is_some_and(Option::is_none));
}

#[test]
fn dates_and_team_names_are_normalised() {
    let (cleaned, _) = clean_deliveries(read_fixture("deliveries.csv"), &CleanOptions::default());
    let dates = column(&cleaned, "date");
    assert_eq!(dates.last().cloned().flatten().as_deref(), Some("2021-05-02"));

    let batting = column(&cleaned, "batting_team");
    assert!(batting.iter().flatten().all(|t| t != "Kings XI Punjab"));
    assert!(batting.iter().flatten().any(|t| t == "Punjab Kings"));
    let winners = column(&cleaned, "match_won_by");
    assert!(winners.iter().flatten().any(|t| t == "Delhi Capitals"));
}

#[test]
fn preferred_order_then_remaining_columns() {
    let raw = Table::from_csv_str(
        "zeta,runs_total,batter,match_id,alpha\n\
         x,1,A,1,y\n",
    )
    .unwrap();
    let (cleaned, _) = clean_deliveries(raw, &CleanOptions::default());
    assert_eq!(
        cleaned.headers(),
        &["match_id", "batter", "runs_total", "zeta", "alpha"]
    );
}

#[test]
fn aliases_resolve_before_cleaning() {
    let raw = Table::from_csv_str(
        "Match,Batsman,batsman_runs,extra_runs,total_runs,winner\n\
         7,Kohli,4,0,4,\n",
    )
    .unwrap();
    let (cleaned, report) = clean_deliveries(raw, &CleanOptions::default());
    for name in ["match_id", "batter", "runs_batter", "runs_extras", "runs_total", "match_won_by"] {
        assert!(cleaned.has_column(name), "missing {name}");
    }
    assert_eq!(report.renamed_columns.len(), 6);
    assert_eq!(column(&cleaned, "match_won_by")[0].as_deref(), Some(UNKNOWN));
}

#[test]
fn missing_file_is_a_load_error() {
    let cfg = PipelineConfig::default();
    let err = Table::read_csv(&fixture_path("does_not_exist.csv"), &cfg.encodings).unwrap_err();
    assert!(matches!(err, PipelineError::Load { .. }));
    assert!(err.to_string().contains("does_not_exist.csv"));
}
