use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clean::UNKNOWN;
use crate::match_summary::MatchSummary;
use crate::metrics::{percentage, ratio, round2};
use crate::player_match::PlayerMatchEntry;
use crate::table::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSeasonSummary {
    pub season: String,
    pub team: String,
    pub matches: u32,
    pub runs_scored: u32,
    pub wickets_taken: u32,
    pub balls_faced: u32,
    pub balls_bowled: u32,
    pub wins: u32,
    pub avg_runs: f64,
    pub avg_rpo: f64,
    pub win_pct: f64,
}

impl Record for TeamSeasonSummary {
    const COLUMNS: &'static [&'static str] = &[
        "season",
        "team",
        "matches",
        "runs_scored",
        "wickets_taken",
        "balls_faced",
        "balls_bowled",
        "wins",
        "avg_runs",
        "avg_rpo",
        "win_pct",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueSeasonSummary {
    pub season: String,
    pub venue: String,
    pub matches: u32,
    pub total_runs: u32,
    pub total_wickets: u32,
    pub avg_runs: f64,
    pub avg_wickets: f64,
    pub avg_first_innings: f64,
}

impl Record for VenueSeasonSummary {
    const COLUMNS: &'static [&'static str] = &[
        "season",
        "venue",
        "matches",
        "total_runs",
        "total_wickets",
        "avg_runs",
        "avg_wickets",
        "avg_first_innings",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub season: String,
    pub total_matches: u32,
    pub total_runs: u32,
    pub total_wickets: u32,
    pub avg_runs: f64,
    pub avg_wickets: f64,
}

impl Record for SeasonSummary {
    const COLUMNS: &'static [&'static str] = &[
        "season",
        "total_matches",
        "total_runs",
        "total_wickets",
        "avg_runs",
        "avg_wickets",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamWinPct {
    pub season: String,
    pub team: String,
    pub matches_played: u32,
    pub wins: u32,
    pub win_pct: f64,
}

impl Record for TeamWinPct {
    const COLUMNS: &'static [&'static str] = &["season", "team", "matches_played", "wins", "win_pct"];
}

/// One team's appearance in one match, the unit the win-percentage fan-out
/// counts over.
#[derive(Debug, Clone, Copy)]
pub struct TeamAppearance<'a> {
    pub season: &'a str,
    pub match_key: &'a str,
    pub team: &'a str,
    pub winner: Option<&'a str>,
}

fn mean(total: f64, count: u32) -> f64 {
    ratio(total, count as f64, "mean").map(round2).unwrap_or(0.0)
}

#[derive(Default)]
struct TeamSeasonAcc<'a> {
    matches: BTreeSet<&'a str>,
    won: BTreeSet<&'a str>,
    runs: u32,
    wickets: u32,
    balls_faced: u32,
    balls_bowled: u32,
}

pub fn team_season_summaries(rows: &[PlayerMatchEntry]) -> Vec<TeamSeasonSummary> {
    let mut groups: BTreeMap<(&str, &str), TeamSeasonAcc<'_>> = BTreeMap::new();
    for row in rows {
        let acc = groups
            .entry((row.season.as_str(), row.team.as_str()))
            .or_default();
        acc.matches.insert(row.match_s_id.as_str());
        if row.match_won_by.as_deref() == Some(row.team.as_str()) {
            acc.won.insert(row.match_s_id.as_str());
        }
        acc.runs += row.runs;
        acc.wickets += row.wickets;
        acc.balls_faced += row.balls;
        acc.balls_bowled += row.balls_bowled;
    }

    let out: Vec<TeamSeasonSummary> = groups
        .into_iter()
        .map(|((season, team), acc)| {
            let matches = acc.matches.len() as u32;
            let wins = acc.won.len() as u32;
            TeamSeasonSummary {
                season: season.to_string(),
                team: team.to_string(),
                matches,
                runs_scored: acc.runs,
                wickets_taken: acc.wickets,
                balls_faced: acc.balls_faced,
                balls_bowled: acc.balls_bowled,
                wins,
                avg_runs: mean(acc.runs as f64, matches),
                avg_rpo: ratio(acc.runs as f64 * 6.0, acc.balls_faced as f64, "avg_rpo")
                    .map(round2)
                    .unwrap_or(0.0),
                win_pct: percentage(wins, matches),
            }
        })
        .collect();
    info!(rows = out.len(), "team-season summary");
    out
}

#[derive(Default)]
struct VenueAcc<'a> {
    matches: BTreeSet<&'a str>,
    runs: u32,
    wickets: u32,
    first_innings: u32,
}

pub fn venue_season_summaries(matches: &[MatchSummary]) -> Vec<VenueSeasonSummary> {
    let mut groups: BTreeMap<(&str, &str), VenueAcc<'_>> = BTreeMap::new();
    for m in matches {
        let venue = m.venue.as_deref().unwrap_or(UNKNOWN);
        let acc = groups.entry((m.season.as_str(), venue)).or_default();
        if !acc.matches.insert(m.match_id.as_str()) {
            continue;
        }
        acc.runs += m.total_runs();
        acc.wickets += m.total_wickets();
        acc.first_innings += m.runs_team1;
    }

    let out: Vec<VenueSeasonSummary> = groups
        .into_iter()
        .map(|((season, venue), acc)| {
            let n = acc.matches.len() as u32;
            VenueSeasonSummary {
                season: season.to_string(),
                venue: venue.to_string(),
                matches: n,
                total_runs: acc.runs,
                total_wickets: acc.wickets,
                avg_runs: mean(acc.runs as f64, n),
                avg_wickets: mean(acc.wickets as f64, n),
                avg_first_innings: mean(acc.first_innings as f64, n),
            }
        })
        .collect();
    info!(rows = out.len(), "venue-season summary");
    out
}

pub fn season_summaries(matches: &[MatchSummary]) -> Vec<SeasonSummary> {
    let mut groups: BTreeMap<&str, (BTreeSet<&str>, u32, u32)> = BTreeMap::new();
    for m in matches {
        let (ids, runs, wickets) = groups.entry(m.season.as_str()).or_default();
        if ids.insert(m.match_id.as_str()) {
            *runs += m.total_runs();
            *wickets += m.total_wickets();
        }
    }

    let out: Vec<SeasonSummary> = groups
        .into_iter()
        .map(|(season, (ids, runs, wickets))| {
            let n = ids.len() as u32;
            SeasonSummary {
                season: season.to_string(),
                total_matches: n,
                total_runs: runs,
                total_wickets: wickets,
                avg_runs: mean(runs as f64, n),
                avg_wickets: mean(wickets as f64, n),
            }
        })
        .collect();
    info!(rows = out.len(), "season summary");
    out
}

/// Each match contributes one appearance per side; the single-team sentinel
/// opponent is not a side.
pub fn team_win_percentages(matches: &[MatchSummary]) -> Vec<TeamWinPct> {
    let appearances = matches.iter().flat_map(|m| {
        [m.team1.as_str(), m.team2.as_str()]
            .into_iter()
            .map(move |team| TeamAppearance {
                season: m.season.as_str(),
                match_key: m.match_id.as_str(),
                team,
                winner: m.match_won_by.as_deref(),
            })
    });
    win_percentages(appearances)
}

/// Played is the number of distinct matches per (season, team); wins count
/// the matches whose recorded winner equals the team, zero when none did.
pub fn win_percentages<'a>(
    appearances: impl IntoIterator<Item = TeamAppearance<'a>>,
) -> Vec<TeamWinPct> {
    let mut seen: BTreeSet<(&str, &str, &str)> = BTreeSet::new();
    let mut tally: BTreeMap<(&str, &str), (u32, u32)> = BTreeMap::new();
    for a in appearances {
        if a.team == UNKNOWN || !seen.insert((a.season, a.match_key, a.team)) {
            continue;
        }
        let (played, wins) = tally.entry((a.season, a.team)).or_insert((0, 0));
        *played += 1;
        if a.winner == Some(a.team) {
            *wins += 1;
        }
    }

    tally
        .into_iter()
        .map(|((season, team), (played, wins))| TeamWinPct {
            season: season.to_string(),
            team: team.to_string(),
            matches_played: played,
            wins,
            win_pct: percentage(wins, played),
        })
        .collect()
}
