use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::delivery::Delivery;
use crate::match_code::JoinKey;
use crate::match_summary::{MatchSummary, join_keys};
use crate::metrics::{batting_average, bowling_average, bowling_economy, strike_rate};
use crate::table::Record;

/// One player's batting and bowling contribution to one match, carrying the
/// match context so downstream consumers need no second join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMatchEntry {
    pub match_s_id: String,
    pub match_id: String,
    pub match_code: Option<String>,
    pub season: String,
    pub date: Option<NaiveDate>,
    pub venue: Option<String>,
    pub city: Option<String>,
    pub player: String,
    pub team: String,
    pub runs: u32,
    pub balls: u32,
    pub outs: u32,
    pub balls_bowled: u32,
    pub runs_conceded: u32,
    pub wickets: u32,
    pub strike_rate: f64,
    pub batting_average: f64,
    pub bowling_economy: f64,
    pub bowling_average: f64,
    pub team1: String,
    pub team2: String,
    pub runs_team1: u32,
    pub extras_team1: u32,
    pub wickets_team1: u32,
    pub balls_team1: u32,
    pub runs_team2: u32,
    pub extras_team2: u32,
    pub wickets_team2: u32,
    pub balls_team2: u32,
    pub player_of_match: Option<String>,
    pub match_won_by: Option<String>,
    pub win_outcome: Option<String>,
}

impl Record for PlayerMatchEntry {
    const COLUMNS: &'static [&'static str] = &[
        "match_s_id",
        "match_id",
        "match_code",
        "season",
        "date",
        "venue",
        "city",
        "player",
        "team",
        "runs",
        "balls",
        "outs",
        "balls_bowled",
        "runs_conceded",
        "wickets",
        "strike_rate",
        "batting_average",
        "bowling_economy",
        "bowling_average",
        "team1",
        "team2",
        "runs_team1",
        "extras_team1",
        "wickets_team1",
        "balls_team1",
        "runs_team2",
        "extras_team2",
        "wickets_team2",
        "balls_team2",
        "player_of_match",
        "match_won_by",
        "win_outcome",
    ];
}

#[derive(Debug, Clone, Copy, Default)]
struct Contribution {
    runs: u32,
    balls: u32,
    outs: u32,
    balls_bowled: u32,
    runs_conceded: u32,
    wickets: u32,
}

type PlayerKey<'a> = (&'a str, &'a str, &'a str);

/// Batting grouped by (match, batter, batting team), bowling by (match,
/// bowler, bowling team), outer-joined on (match, player, team).
///
/// Every delivery row counts as one ball faced and one ball bowled; wides
/// and no-balls are not netted out here.
pub fn aggregate_player_matches(
    deliveries: &[Delivery],
    matches: &[MatchSummary],
) -> Vec<PlayerMatchEntry> {
    let mut contributions: HashMap<PlayerKey<'_>, Contribution> = HashMap::new();
    for d in deliveries {
        let bat = contributions
            .entry((d.match_id.as_str(), d.batter.as_str(), d.batting_team.as_str()))
            .or_default();
        bat.runs += d.runs_batter;
        bat.balls += 1;
        if d.is_wicket() {
            bat.outs += 1;
        }

        let bowl = contributions
            .entry((d.match_id.as_str(), d.bowler.as_str(), d.bowling_team.as_str()))
            .or_default();
        bowl.balls_bowled += 1;
        bowl.runs_conceded += d.runs_total;
        if d.is_wicket() {
            bowl.wickets += 1;
        }
    }

    let keys: HashMap<&str, JoinKey> = join_keys(matches)
        .into_iter()
        .zip(matches)
        .map(|(key, m)| (m.match_id.as_str(), key))
        .collect();
    let by_id: HashMap<&str, &MatchSummary> =
        matches.iter().map(|m| (m.match_id.as_str(), m)).collect();

    let mut unmatched = 0usize;
    let mut rows: Vec<(u32, u32, PlayerMatchEntry)> = Vec::with_capacity(contributions.len());
    for ((match_id, player, team), c) in contributions {
        let (Some(key), Some(m)) = (keys.get(match_id), by_id.get(match_id)) else {
            unmatched += 1;
            continue;
        };
        rows.push((
            key.season_number,
            key.match_number_in_season,
            entry(key, m, player, team, c),
        ));
    }
    if unmatched > 0 {
        warn!(count = unmatched, "player contributions without a match summary skipped");
    }

    rows.sort_by(|(sa, ma, a), (sb, mb, b)| {
        sa.cmp(sb)
            .then(ma.cmp(mb))
            .then_with(|| a.player.cmp(&b.player))
            .then_with(|| a.team.cmp(&b.team))
    });
    let out: Vec<PlayerMatchEntry> = rows.into_iter().map(|(_, _, row)| row).collect();
    info!(rows = out.len(), "aggregated player-match rows");
    out
}

fn entry(key: &JoinKey, m: &MatchSummary, player: &str, team: &str, c: Contribution) -> PlayerMatchEntry {
    PlayerMatchEntry {
        match_s_id: key.match_s_id.clone(),
        match_id: m.match_id.clone(),
        match_code: m.match_code.clone(),
        season: m.season.clone(),
        date: m.date,
        venue: m.venue.clone(),
        city: m.city.clone(),
        player: player.to_string(),
        team: team.to_string(),
        runs: c.runs,
        balls: c.balls,
        outs: c.outs,
        balls_bowled: c.balls_bowled,
        runs_conceded: c.runs_conceded,
        wickets: c.wickets,
        strike_rate: strike_rate(c.runs, c.balls),
        batting_average: batting_average(c.runs, c.outs),
        bowling_economy: bowling_economy(c.runs_conceded, c.balls_bowled),
        bowling_average: bowling_average(c.runs_conceded, c.wickets),
        team1: m.team1.clone(),
        team2: m.team2.clone(),
        runs_team1: m.runs_team1,
        extras_team1: m.extras_team1,
        wickets_team1: m.wickets_team1,
        balls_team1: m.balls_team1,
        runs_team2: m.runs_team2,
        extras_team2: m.extras_team2,
        wickets_team2: m.wickets_team2,
        balls_team2: m.balls_team2,
        player_of_match: m.player_of_match.clone(),
        match_won_by: m.match_won_by.clone(),
        win_outcome: m.win_outcome.clone(),
    }
}
