use std::path::PathBuf;

use cricket_pipeline::config::PipelineConfig;
use cricket_pipeline::pipeline::{PipelineOutputs, compute};
use cricket_pipeline::rollup::{TeamSeasonSummary, TeamWinPct};
use cricket_pipeline::table::Table;

fn read_fixture(name: &str) -> Table {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    Table::read_csv(&path, &PipelineConfig::default().encodings).expect("fixture should load")
}

fn outputs() -> PipelineOutputs {
    compute(read_fixture("deliveries.csv"), None, &PipelineConfig::default())
        .expect("fixture pipeline runs")
}

fn team_season<'a>(rows: &'a [TeamSeasonSummary], season: &str, team: &str) -> &'a TeamSeasonSummary {
    rows.iter()
        .find(|r| r.season == season && r.team == team)
        .unwrap_or_else(|| panic!("no team-season row for {team} in {season}"))
}

fn win_row<'a>(rows: &'a [TeamWinPct], season: &str, team: &str) -> &'a TeamWinPct {
    rows.iter()
        .find(|r| r.season == season && r.team == team)
        .unwrap_or_else(|| panic!("no win row for {team} in {season}"))
}

#[test]
fn team_season_counts_distinct_matches_and_wins() {
    let out = outputs();
    let mi = team_season(&out.team_seasons, "2021", "Mumbai Indians");
    assert_eq!(mi.matches, 2);
    assert_eq!(mi.runs_scored, 14);
    assert_eq!(mi.balls_faced, 8);
    assert_eq!(mi.wickets_taken, 1);
    assert_eq!(mi.balls_bowled, 7);
    assert_eq!(mi.wins, 1);
    assert_eq!(mi.avg_runs, 7.0);
    assert_eq!(mi.avg_rpo, 10.5);
    assert_eq!(mi.win_pct, 50.0);

    let csk = team_season(&out.team_seasons, "2021", "Chennai Super Kings");
    assert_eq!((csk.matches, csk.runs_scored, csk.wickets_taken), (2, 13, 2));
}

#[test]
fn winless_team_has_zero_win_pct() {
    let out = outputs();
    let pbks = team_season(&out.team_seasons, "2020/21", "Punjab Kings");
    assert_eq!(pbks.wins, 0);
    assert_eq!(pbks.win_pct, 0.0);

    let fan_out = win_row(&out.team_win_pct, "2020/21", "Punjab Kings");
    assert_eq!((fan_out.matches_played, fan_out.wins), (1, 0));
    assert_eq!(fan_out.win_pct, 0.0);
    assert_eq!(win_row(&out.team_win_pct, "2020/21", "Delhi Capitals").win_pct, 100.0);
    assert_eq!(out.team_win_pct.len(), 4);
}

#[test]
fn venue_and_season_rollups() {
    let out = outputs();
    let season = out
        .seasons
        .iter()
        .find(|s| s.season == "2021")
        .expect("2021 season");
    assert_eq!(season.total_matches, 2);
    assert_eq!(season.total_runs, 29);
    assert_eq!(season.total_wickets, 3);
    assert_eq!(season.avg_runs, 14.5);
    assert_eq!(season.avg_wickets, 1.5);

    let venue = out
        .venue_seasons
        .iter()
        .find(|v| v.season == "2021" && v.venue == "Wankhede Stadium")
        .expect("venue row");
    assert_eq!(venue.matches, 2);
    assert_eq!(venue.total_runs, 29);
    assert_eq!(venue.avg_first_innings, 10.0);
    assert_eq!(venue.avg_wickets, 1.5);
}

#[test]
fn metadata_overrides_match_fields() {
    let cfg = PipelineConfig::default();
    let out = compute(
        read_fixture("deliveries.csv"),
        Some(read_fixture("matches.csv")),
        &cfg,
    )
    .expect("pipeline with metadata");

    let m102 = out.matches.iter().find(|m| m.match_id == "102").unwrap();
    assert_eq!(m102.match_won_by.as_deref(), Some("Punjab Kings"));
    assert_eq!(m102.win_outcome.as_deref(), Some("super over"));
    let m103 = out.matches.iter().find(|m| m.match_id == "103").unwrap();
    assert_eq!(m103.player_of_match.as_deref(), Some("Jadeja"));
    let m101 = out.matches.iter().find(|m| m.match_id == "101").unwrap();
    assert_eq!(m101.venue.as_deref(), Some("Wankhede Stadium, Mumbai"));

    let pbks = win_row(&out.team_win_pct, "2020/21", "Punjab Kings");
    assert_eq!(pbks.win_pct, 100.0);
}

#[test]
fn metadata_placeholders_keep_delivery_values() {
    let meta = Table::from_csv_str(
        "id,season,date,venue,city,winner,player_of_match,result\n\
         101,2021,2021-04-09,NA,Mumbai,NA,None,Unknown\n",
    )
    .unwrap();
    let out = compute(read_fixture("deliveries.csv"), Some(meta), &PipelineConfig::default())
        .expect("pipeline with placeholder metadata");

    let m101 = out.matches.iter().find(|m| m.match_id == "101").unwrap();
    assert_eq!(m101.venue.as_deref(), Some("Wankhede Stadium"));
    assert_eq!(m101.match_won_by.as_deref(), Some("Mumbai Indians"));
    assert_eq!(m101.player_of_match.as_deref(), Some("Rohit"));
    assert_eq!(m101.win_outcome.as_deref(), Some("runs 6"));
    assert_eq!(win_row(&out.team_win_pct, "2021", "Mumbai Indians").wins, 1);
}

#[test]
fn metadata_without_match_id_is_a_schema_error() {
    let meta = Table::from_csv_str("season,venue\n2021,Somewhere\n").unwrap();
    let err = compute(read_fixture("deliveries.csv"), Some(meta), &PipelineConfig::default())
        .unwrap_err();
    assert!(err.to_string().contains("match_id"));
}
