use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aliases::{MATCH_METADATA_ALIASES, normalize_columns};
use crate::clean::{UNKNOWN, parse_date};
use crate::delivery::Delivery;
use crate::error::PipelineResult;
use crate::match_code::{
    JoinKey, MatchKeyInput, assign_chronological_code, assign_join_key_code,
};
use crate::table::{Record, Table};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub match_code: Option<String>,
    pub match_id: String,
    pub season: String,
    pub season_start_year: Option<i32>,
    pub season_no: Option<u32>,
    pub season_match_no: Option<u32>,
    pub date: Option<NaiveDate>,
    pub venue: Option<String>,
    pub city: Option<String>,
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

impl Record for MatchSummary {
    const COLUMNS: &'static [&'static str] = &[
        "match_code",
        "match_id",
        "season",
        "season_start_year",
        "season_no",
        "season_match_no",
        "date",
        "venue",
        "city",
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

impl MatchSummary {
    pub fn key_input(&self) -> MatchKeyInput<'_> {
        MatchKeyInput {
            match_id: &self.match_id,
            season: &self.season,
            date: self.date,
        }
    }

    pub fn total_runs(&self) -> u32 {
        self.runs_team1 + self.runs_team2
    }

    pub fn total_wickets(&self) -> u32 {
        self.wickets_team1 + self.wickets_team2
    }

    pub fn winner_is(&self, team: &str) -> bool {
        self.match_won_by.as_deref() == Some(team)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct TeamInnings {
    runs: u32,
    extras: u32,
    wickets: u32,
    legal_balls: u32,
}

impl TeamInnings {
    fn push(&mut self, d: &Delivery) {
        self.runs += d.runs_total;
        self.extras += d.runs_extras;
        if d.is_wicket() {
            self.wickets += 1;
        }
        if d.is_legal() {
            self.legal_balls += 1;
        }
    }
}

/// One row per match, in order of first appearance of the match identifier.
/// Codes are left empty; see [`with_chronological_codes`].
pub fn summarize_matches(deliveries: &[Delivery]) -> Vec<MatchSummary> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&Delivery>> = HashMap::new();
    for d in deliveries {
        let group = groups.entry(d.match_id.as_str()).or_default();
        if group.is_empty() {
            order.push(d.match_id.as_str());
        }
        group.push(d);
    }

    let summaries: Vec<MatchSummary> = order
        .into_iter()
        .filter_map(|id| groups.get(id).map(|rows| summarize_one(id, rows)))
        .collect();
    info!(matches = summaries.len(), "summarized matches");
    summaries
}

fn summarize_one(match_id: &str, rows: &[&Delivery]) -> MatchSummary {
    let first = rows[0];

    let mut teams: Vec<&str> = Vec::with_capacity(2);
    for d in rows {
        if !teams.contains(&d.batting_team.as_str()) {
            teams.push(d.batting_team.as_str());
        }
    }
    if teams.len() > 2 {
        warn!(match_id, teams = ?teams, "more than two batting teams; extra teams ignored");
    }
    let team1 = teams[0].to_string();
    let team2 = teams.get(1).copied().unwrap_or(UNKNOWN).to_string();

    let mut first_innings = TeamInnings::default();
    let mut second_innings = TeamInnings::default();
    for d in rows {
        if d.batting_team == team1 {
            first_innings.push(d);
        } else if teams.len() > 1 && d.batting_team == team2 {
            second_innings.push(d);
        }
    }

    let ctx = &first.context;
    MatchSummary {
        match_code: None,
        match_id: match_id.to_string(),
        season: ctx.season.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        season_start_year: None,
        season_no: None,
        season_match_no: None,
        date: ctx.date,
        venue: ctx.venue.clone(),
        city: ctx.city.clone(),
        team1,
        team2,
        runs_team1: first_innings.runs,
        extras_team1: first_innings.extras,
        wickets_team1: first_innings.wickets,
        balls_team1: first_innings.legal_balls,
        runs_team2: second_innings.runs,
        extras_team2: second_innings.extras,
        wickets_team2: second_innings.wickets,
        balls_team2: second_innings.legal_balls,
        player_of_match: ctx.player_of_match.clone(),
        match_won_by: ctx.match_won_by.clone(),
        win_outcome: ctx.win_outcome.clone(),
    }
}

/// Overlays match-level metadata rows (keyed by `match_id`) onto the
/// summaries. Present metadata values win; empty cells and placeholder tokens
/// leave the summary as is.
pub fn apply_match_metadata(
    matches: &mut [MatchSummary],
    mut metadata: Table,
    team_names: &BTreeMap<String, String>,
    placeholders: &[String],
) -> PipelineResult<usize> {
    normalize_columns(&mut metadata, MATCH_METADATA_ALIASES);
    let id_col = metadata.require("match_metadata", "match_id")?;
    let col = |name: &str| metadata.column_index(name);
    let (season, date, venue, city, potm, winner, outcome) = (
        col("season"),
        col("date"),
        col("venue"),
        col("city"),
        col("player_of_match"),
        col("match_won_by"),
        col("win_outcome"),
    );

    let mut by_id: HashMap<&str, usize> = HashMap::new();
    for row in 0..metadata.len() {
        if let Some(id) = metadata.value(row, id_col) {
            by_id.entry(id.trim()).or_insert(row);
        }
    }

    let text = |row: usize, c: Option<usize>| -> Option<String> {
        c.and_then(|c| metadata.value(row, c))
            .map(str::trim)
            .filter(|v| !v.is_empty() && !placeholders.iter().any(|p| p == v))
            .map(str::to_string)
    };

    let mut applied = 0usize;
    for m in matches.iter_mut() {
        let Some(&row) = by_id.get(m.match_id.as_str()) else {
            continue;
        };
        if let Some(v) = text(row, season) {
            m.season = v;
        }
        if let Some(v) = text(row, date).as_deref().and_then(parse_date) {
            m.date = Some(v);
        }
        if let Some(v) = text(row, venue) {
            m.venue = Some(v);
        }
        if let Some(v) = text(row, city) {
            m.city = Some(v);
        }
        if let Some(v) = text(row, potm) {
            m.player_of_match = Some(v);
        }
        if let Some(v) = text(row, winner) {
            m.match_won_by = Some(team_names.get(&v).cloned().unwrap_or(v));
        }
        if let Some(v) = text(row, outcome) {
            m.win_outcome = Some(v);
        }
        applied += 1;
    }

    let unmatched = matches.len() - applied;
    if unmatched > 0 {
        warn!(count = unmatched, "matches without a metadata row");
    }
    info!(applied, "applied match metadata");
    Ok(applied)
}

pub fn join_keys(matches: &[MatchSummary]) -> Vec<JoinKey> {
    let inputs: Vec<MatchKeyInput<'_>> = matches.iter().map(MatchSummary::key_input).collect();
    assign_join_key_code(&inputs)
}

/// Fills the display codes and reorders matches chronologically. Matches whose
/// season has no start year follow the coded ones with empty codes.
pub fn with_chronological_codes(matches: Vec<MatchSummary>) -> Vec<MatchSummary> {
    let assignment = {
        let inputs: Vec<MatchKeyInput<'_>> = matches.iter().map(MatchSummary::key_input).collect();
        assign_chronological_code(&inputs)
    };

    let mut by_id: HashMap<String, MatchSummary> = HashMap::with_capacity(matches.len());
    let mut arrival: Vec<String> = Vec::with_capacity(matches.len());
    for m in matches {
        arrival.push(m.match_id.clone());
        by_id.insert(m.match_id.clone(), m);
    }

    let mut out = Vec::with_capacity(arrival.len());
    for code in &assignment.codes {
        let Some(mut m) = by_id.remove(&code.match_id) else {
            continue;
        };
        m.match_code = Some(code.match_code.clone());
        m.season_start_year = Some(code.season_start_year);
        m.season_no = Some(code.season_no);
        m.season_match_no = Some(code.season_match_no);
        out.push(m);
    }
    for id in &arrival {
        if let Some(mut m) = by_id.remove(id) {
            m.match_code = None;
            m.season_start_year = None;
            m.season_no = None;
            m.season_match_no = None;
            out.push(m);
        }
    }

    if !assignment.excluded.is_empty() {
        warn!(
            count = assignment.excluded.len(),
            "matches excluded from chronological order"
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::MatchContext;

    fn ball(match_id: &str, batting: &str, runs: u32, extras: u32, extra_type: &str, out: bool) -> Delivery {
        Delivery {
            match_id: match_id.to_string(),
            innings: 1,
            over: 0,
            ball: 1,
            batting_team: batting.to_string(),
            bowling_team: "Other".to_string(),
            batter: "A".to_string(),
            non_striker: None,
            bowler: "B".to_string(),
            runs_batter: runs,
            runs_extras: extras,
            runs_total: runs + extras,
            extra_type: extra_type.to_string(),
            wicket_kind: "No Wicket".to_string(),
            player_out: out.then(|| "A".to_string()),
            context: MatchContext {
                season: Some("2021".to_string()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn single_team_match_gets_unknown_opponent() {
        let rows = vec![
            ball("1", "Mumbai Indians", 4, 0, "No Extra", false),
            ball("1", "Mumbai Indians", 0, 1, "wides", false),
            ball("1", "Mumbai Indians", 0, 0, "No Extra", true),
        ];
        let out = summarize_matches(&rows);
        assert_eq!(out.len(), 1);
        let m = &out[0];
        assert_eq!(m.team2, UNKNOWN);
        assert_eq!(m.runs_team1, 5);
        assert_eq!(m.extras_team1, 1);
        assert_eq!(m.wickets_team1, 1);
        assert_eq!(m.balls_team1, 2);
        assert_eq!(m.runs_team2, 0);
    }
}
