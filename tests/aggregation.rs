use std::collections::HashMap;
use std::path::PathBuf;

use cricket_pipeline::clean::{CleanOptions, UNKNOWN, clean_deliveries};
use cricket_pipeline::config::PipelineConfig;
use cricket_pipeline::delivery::{Delivery, deliveries_from_table};
use cricket_pipeline::match_summary::{
    MatchSummary, join_keys, summarize_matches, with_chronological_codes,
};
use cricket_pipeline::player_match::{PlayerMatchEntry, aggregate_player_matches};
use cricket_pipeline::table::Table;

fn read_fixture(name: &str) -> Table {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    Table::read_csv(&path, &PipelineConfig::default().encodings).expect("fixture should load")
}

fn fixture_deliveries() -> Vec<Delivery> {
    let (cleaned, _) = clean_deliveries(read_fixture("deliveries.csv"), &CleanOptions::default());
    deliveries_from_table(&cleaned).expect("required columns present")
}

fn deliveries_from_csv(raw: &str) -> Vec<Delivery> {
    let (cleaned, _) = clean_deliveries(Table::from_csv_str(raw).unwrap(), &CleanOptions::default());
    deliveries_from_table(&cleaned).unwrap()
}

fn by_id(matches: &[MatchSummary]) -> HashMap<&str, &MatchSummary> {
    matches.iter().map(|m| (m.match_id.as_str(), m)).collect()
}

fn find<'a>(rows: &'a [PlayerMatchEntry], match_id: &str, player: &str) -> &'a PlayerMatchEntry {
    rows.iter()
        .find(|r| r.match_id == match_id && r.player == player)
        .unwrap_or_else(|| panic!("no row for {player} in {match_id}"))
}

#[test]
fn match_summaries_count_runs_wickets_and_legal_balls() {
    let matches = summarize_matches(&fixture_deliveries());
    assert_eq!(matches.len(), 3);
    let m = by_id(&matches);

    let first = m["101"];
    assert_eq!(first.team1, "Mumbai Indians");
    assert_eq!(first.team2, "Chennai Super Kings");
    assert_eq!(
        (first.runs_team1, first.extras_team1, first.wickets_team1, first.balls_team1),
        (14, 1, 1, 5)
    );
    assert_eq!(
        (first.runs_team2, first.extras_team2, first.wickets_team2, first.balls_team2),
        (8, 1, 1, 4)
    );
    assert_eq!(first.match_won_by.as_deref(), Some("Mumbai Indians"));

    let renamed = m["102"];
    assert_eq!(renamed.team1, "Punjab Kings");
    assert_eq!(renamed.team2, "Delhi Capitals");
    assert_eq!(renamed.season, "2020/21");
}

#[test]
fn legal_balls_exclude_wides_and_no_balls() {
    let deliveries = fixture_deliveries();
    let matches = summarize_matches(&deliveries);
    for m in &matches {
        for (team, balls) in [(&m.team1, m.balls_team1), (&m.team2, m.balls_team2)] {
            let expected = deliveries
                .iter()
                .filter(|d| d.match_id == m.match_id && &d.batting_team == team && d.is_legal())
                .count() as u32;
            assert_eq!(balls, expected, "match {} team {team}", m.match_id);
        }
    }
}

#[test]
fn single_batting_side_gets_unknown_opponent() {
    let deliveries = deliveries_from_csv(
        "match_id,season,batting_team,bowling_team,batter,bowler,runs_batter,runs_extras,runs_total\n\
         9,2022,Gujarat Titans,Lucknow Super Giants,Gill,Avesh,4,0,4\n",
    );
    let matches = summarize_matches(&deliveries);
    assert_eq!(matches[0].team2, UNKNOWN);
    assert_eq!(matches[0].runs_team2, 0);
}

#[test]
fn chronological_codes_and_join_keys_differ() {
    let matches = with_chronological_codes(summarize_matches(&fixture_deliveries()));
    let order: Vec<(&str, Option<&str>)> = matches
        .iter()
        .map(|m| (m.match_id.as_str(), m.match_code.as_deref()))
        .collect();
    assert_eq!(
        order,
        vec![("102", Some("S1_01")), ("101", Some("S2_01")), ("103", Some("S2_02"))]
    );
    assert_eq!(matches[0].season_start_year, Some(2020));

    let keys: HashMap<String, String> = join_keys(&matches)
        .into_iter()
        .map(|k| (k.match_id, k.match_s_id))
        .collect();
    assert_eq!(keys["102"], "S1_M1");
    assert_eq!(keys["101"], "S2_M1");
    assert_eq!(keys["103"], "S2_M2");
}

#[test]
fn season_numbers_are_dense_and_match_numbers_a_permutation() {
    let matches = summarize_matches(&fixture_deliveries());
    let keys = join_keys(&matches);
    let mut seasons: Vec<u32> = keys.iter().map(|k| k.season_number).collect();
    seasons.sort_unstable();
    seasons.dedup();
    assert_eq!(seasons, (1..=seasons.len() as u32).collect::<Vec<_>>());

    for season in seasons {
        let mut numbers: Vec<u32> = keys
            .iter()
            .filter(|k| k.season_number == season)
            .map(|k| k.match_number_in_season)
            .collect();
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=numbers.len() as u32).collect::<Vec<_>>());
    }
}

#[test]
fn unparseable_season_is_excluded_from_chronological_codes() {
    let deliveries = deliveries_from_csv(
        "match_id,season,date,batting_team,bowling_team,batter,bowler,runs_batter,runs_extras,runs_total\n\
         1,2021,2021-04-10,A,B,x,y,1,0,1\n\
         2,Exhibition,2021-04-01,A,B,x,y,1,0,1\n\
         3,2021,2021-04-09,B,A,y,x,1,0,1\n",
    );
    let matches = with_chronological_codes(summarize_matches(&deliveries));
    let order: Vec<(&str, Option<&str>)> = matches
        .iter()
        .map(|m| (m.match_id.as_str(), m.match_code.as_deref()))
        .collect();
    assert_eq!(order, vec![("3", Some("S1_01")), ("1", Some("S1_02")), ("2", None)]);
}

#[test]
fn wide_counts_as_ball_faced_for_the_batter() {
    let deliveries = deliveries_from_csv(
        "match_id,season,batting_team,bowling_team,batter,bowler,runs_batter,runs_extras,runs_total,extra_type\n\
         1,2021,X,Y,A,B,4,0,4,\n\
         1,2021,X,Y,A,B,0,1,1,wides\n",
    );
    let matches = with_chronological_codes(summarize_matches(&deliveries));
    let rows = aggregate_player_matches(&deliveries, &matches);
    let a = find(&rows, "1", "A");
    assert_eq!((a.runs, a.balls, a.outs), (4, 2, 0));
    assert_eq!(a.strike_rate, 200.0);
    assert_eq!(a.batting_average, 4.0);
    assert_eq!(a.balls_bowled, 0);
    assert_eq!(a.bowling_economy, 0.0);

    let b = find(&rows, "1", "B");
    assert_eq!((b.balls_bowled, b.runs_conceded, b.wickets), (2, 5, 0));
    assert_eq!(b.bowling_economy, 15.0);
    assert_eq!(b.bowling_average, 5.0);
    assert_eq!(b.balls, 0);
    assert_eq!(b.strike_rate, 0.0);
}

#[test]
fn player_match_rows_merge_batting_and_bowling() {
    let deliveries = fixture_deliveries();
    let matches = with_chronological_codes(summarize_matches(&deliveries));
    let rows = aggregate_player_matches(&deliveries, &matches);
    assert_eq!(rows.len(), 14);

    let rohit = find(&rows, "101", "Rohit");
    assert_eq!((rohit.runs, rohit.balls, rohit.outs), (7, 4, 0));
    assert_eq!(rohit.strike_rate, 175.0);
    assert_eq!(rohit.batting_average, 7.0);
    assert_eq!(rohit.match_s_id, "S2_M1");
    assert_eq!(rohit.match_code.as_deref(), Some("S2_01"));

    let deepak = find(&rows, "101", "Deepak");
    assert_eq!((deepak.balls_bowled, deepak.runs_conceded, deepak.wickets), (6, 14, 1));
    assert_eq!(deepak.bowling_economy, 14.0);
    assert_eq!(deepak.bowling_average, 14.0);

    let bumrah = find(&rows, "101", "Bumrah");
    assert_eq!(bumrah.bowling_economy, 9.6);
    assert_eq!(bumrah.team, "Mumbai Indians");

    // ordered by join key, then player
    let head: Vec<(&str, &str)> = rows
        .iter()
        .take(4)
        .map(|r| (r.match_s_id.as_str(), r.player.as_str()))
        .collect();
    assert_eq!(
        head,
        vec![("S1_M1", "Dhawan"), ("S1_M1", "Rabada"), ("S1_M1", "Rahul"), ("S1_M1", "Shami")]
    );
}

#[test]
fn rate_fallbacks_hold_for_every_row() {
    let deliveries = fixture_deliveries();
    let matches = with_chronological_codes(summarize_matches(&deliveries));
    for row in aggregate_player_matches(&deliveries, &matches) {
        if row.balls_bowled == 0 {
            assert_eq!(row.bowling_economy, 0.0);
        }
        if row.wickets == 0 {
            assert_eq!(row.bowling_average, row.runs_conceded as f64);
        }
        if row.outs == 0 {
            assert_eq!(row.batting_average, row.runs as f64);
        }
    }
}
