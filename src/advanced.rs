//! Season superlatives and leaderboards over a player-match table.
//!
//! Each statistic declares the columns it needs and is computed on its own.
//! A missing column skips that statistic with a warning; the others still run.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aliases::{PLAYER_MATCH_ALIASES, normalize_columns};
use crate::clean::UNKNOWN;
use crate::delivery::saturating_count;
use crate::config::{DEFAULT_MIN_BALLS, DEFAULT_TOP_N, PipelineConfig};
use crate::error::PipelineResult;
use crate::metrics::{bowling_economy, ratio, round2, runs_per_over, strike_rate};
use crate::rollup::{TeamAppearance, TeamWinPct, win_percentages};
use crate::table::{Record, Table};

#[derive(Debug, Clone, Copy)]
pub struct AdvancedOptions {
    pub min_balls: u32,
    pub top_n: usize,
}

impl Default for AdvancedOptions {
    fn default() -> Self {
        Self {
            min_balls: DEFAULT_MIN_BALLS,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl From<&PipelineConfig> for AdvancedOptions {
    fn from(cfg: &PipelineConfig) -> Self {
        Self {
            min_balls: cfg.min_balls,
            top_n: cfg.top_n.max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighestScore {
    pub season: String,
    pub player: String,
    pub team: Option<String>,
    pub match_key: String,
    pub runs: u32,
}

impl Record for HighestScore {
    const COLUMNS: &'static [&'static str] = &["season", "player", "team", "match_key", "runs"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestBowling {
    pub season: String,
    pub player: String,
    pub team: Option<String>,
    pub match_key: String,
    pub wickets: u32,
    pub runs_conceded: u32,
}

impl Record for BestBowling {
    const COLUMNS: &'static [&'static str] =
        &["season", "player", "team", "match_key", "wickets", "runs_conceded"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeRateLeader {
    pub season: String,
    pub rank: u32,
    pub player: String,
    pub runs: u32,
    pub balls: u32,
    pub strike_rate: f64,
}

impl Record for StrikeRateLeader {
    const COLUMNS: &'static [&'static str] =
        &["season", "rank", "player", "runs", "balls", "strike_rate"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomyLeader {
    pub season: String,
    pub rank: u32,
    pub player: String,
    pub balls_bowled: u32,
    pub runs_conceded: u32,
    pub economy: f64,
}

impl Record for EconomyLeader {
    const COLUMNS: &'static [&'static str] =
        &["season", "rank", "player", "balls_bowled", "runs_conceded", "economy"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRunRate {
    pub season: String,
    pub team: String,
    pub innings: u32,
    pub runs: u32,
    pub balls: u32,
    pub runs_per_over: f64,
}

impl Record for TeamRunRate {
    const COLUMNS: &'static [&'static str] =
        &["season", "team", "innings", "runs", "balls", "runs_per_over"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueInsight {
    pub venue: String,
    pub matches: u32,
    pub avg_first_innings: f64,
    pub avg_wickets_per_innings: f64,
    pub avg_match_runs: f64,
}

impl Record for VenueInsight {
    const COLUMNS: &'static [&'static str] = &[
        "venue",
        "matches",
        "avg_first_innings",
        "avg_wickets_per_innings",
        "avg_match_runs",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InningsRunRate {
    pub season: String,
    pub match_key: String,
    pub team1: String,
    pub team2: String,
    pub first_innings_rpo: f64,
    pub second_innings_rpo: f64,
    pub rpo_difference: f64,
}

impl Record for InningsRunRate {
    const COLUMNS: &'static [&'static str] = &[
        "season",
        "match_key",
        "team1",
        "team2",
        "first_innings_rpo",
        "second_innings_rpo",
        "rpo_difference",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonOverview {
    pub season: String,
    pub matches: u32,
    pub highest_team_score: u32,
    pub highest_scoring_team: String,
    pub lowest_team_score: u32,
    pub lowest_scoring_team: String,
    pub avg_match_runs: f64,
    pub top_scorer: String,
    pub top_scorer_runs: u32,
    pub top_bowler: String,
    pub top_bowler_wickets: u32,
}

impl Record for SeasonOverview {
    const COLUMNS: &'static [&'static str] = &[
        "season",
        "matches",
        "highest_team_score",
        "highest_scoring_team",
        "lowest_team_score",
        "lowest_scoring_team",
        "avg_match_runs",
        "top_scorer",
        "top_scorer_runs",
        "top_bowler",
        "top_bowler_wickets",
    ];
}

/// Every statistic is `None` when it was skipped; `skipped` names them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdvancedStats {
    pub season_overview: Option<Vec<SeasonOverview>>,
    pub highest_scores: Option<Vec<HighestScore>>,
    pub best_bowling: Option<Vec<BestBowling>>,
    pub strike_rate_leaders: Option<Vec<StrikeRateLeader>>,
    pub economy_leaders: Option<Vec<EconomyLeader>>,
    pub team_win_pct: Option<Vec<TeamWinPct>>,
    pub team_run_rates: Option<Vec<TeamRunRate>>,
    pub venue_insights: Option<Vec<VenueInsight>>,
    pub innings_run_rates: Option<Vec<InningsRunRate>>,
    pub skipped: Vec<String>,
}

pub fn compute_advanced(mut player_match: Table, opts: &AdvancedOptions) -> AdvancedStats {
    normalize_columns(&mut player_match, PLAYER_MATCH_ALIASES);
    let t = &player_match;
    let mut skipped = Vec::new();

    let stats = AdvancedStats {
        season_overview: attempt("season_overview", &mut skipped, || season_overview(t)),
        highest_scores: attempt("highest_individual_scores", &mut skipped, || {
            highest_individual_scores(t)
        }),
        best_bowling: attempt("best_bowling_figures", &mut skipped, || best_bowling_figures(t)),
        strike_rate_leaders: attempt("strike_rate_leaders", &mut skipped, || {
            strike_rate_leaders(t, opts)
        }),
        economy_leaders: attempt("economy_leaders", &mut skipped, || economy_leaders(t, opts)),
        team_win_pct: attempt("team_win_pct", &mut skipped, || team_win_pct(t)),
        team_run_rates: attempt("team_run_rates", &mut skipped, || team_run_rates(t)),
        venue_insights: attempt("venue_insights", &mut skipped, || venue_insights(t)),
        innings_run_rates: attempt("innings_run_rates", &mut skipped, || innings_run_rates(t)),
        skipped: Vec::new(),
    };
    if !skipped.is_empty() {
        warn!(skipped = ?skipped, "advanced stats computed with reduced coverage");
    }
    AdvancedStats { skipped, ..stats }
}

fn attempt<T>(
    name: &'static str,
    skipped: &mut Vec<String>,
    compute: impl FnOnce() -> PipelineResult<Vec<T>>,
) -> Option<Vec<T>> {
    match compute() {
        Ok(rows) => {
            info!(stat = name, rows = rows.len(), "computed advanced stat");
            Some(rows)
        }
        Err(err) => {
            warn!(stat = name, "{err}; skipped");
            skipped.push(name.to_string());
            None
        }
    }
}

fn count(t: &Table, row: usize, col: usize) -> u32 {
    t.value(row, col).map(saturating_count).unwrap_or(0)
}

fn text(t: &Table, row: usize, col: usize) -> &str {
    t.value(row, col).unwrap_or(UNKNOWN)
}

/// `match_s_id` when present, the raw identifier otherwise.
fn match_key_column(t: &Table, stage: &'static str) -> PipelineResult<usize> {
    match t.column_index("match_s_id") {
        Some(idx) => Ok(idx),
        None => t.require(stage, "match_id"),
    }
}

/// Index of the first row of every distinct match, in table order.
fn first_row_per_match(t: &Table, key: usize) -> Vec<usize> {
    let mut seen = HashSet::new();
    (0..t.len())
        .filter(|&row| seen.insert(text(t, row, key)))
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct InningsCols {
    team1: usize,
    team2: usize,
    runs1: usize,
    runs2: usize,
    balls1: usize,
    balls2: usize,
}

impl InningsCols {
    fn require(t: &Table, stage: &'static str) -> PipelineResult<Self> {
        let c = t.require_all(
            stage,
            &["team1", "team2", "runs_team1", "runs_team2", "balls_team1", "balls_team2"],
        )?;
        Ok(Self {
            team1: c[0],
            team2: c[1],
            runs1: c[2],
            runs2: c[3],
            balls1: c[4],
            balls2: c[5],
        })
    }

    /// (team, runs, legal balls) for both innings of the match at `row`.
    fn innings<'t>(&self, t: &'t Table, row: usize) -> [(&'t str, u32, u32); 2] {
        [
            (text(t, row, self.team1), count(t, row, self.runs1), count(t, row, self.balls1)),
            (text(t, row, self.team2), count(t, row, self.runs2), count(t, row, self.balls2)),
        ]
    }
}

/// Per season, the largest single-match run total by one player. Ties go to
/// the alphabetically first player.
pub fn highest_individual_scores(t: &Table) -> PipelineResult<Vec<HighestScore>> {
    const STAGE: &str = "highest_individual_scores";
    let c = t.require_all(STAGE, &["season", "player", "runs"])?;
    let (season, player, runs) = (c[0], c[1], c[2]);
    let key = match_key_column(t, STAGE)?;
    let team = t.column_index("team");

    let mut totals: BTreeMap<(&str, &str, &str), (u32, Option<&str>)> = BTreeMap::new();
    for row in 0..t.len() {
        let entry = totals
            .entry((text(t, row, season), text(t, row, key), text(t, row, player)))
            .or_insert((0, team.and_then(|col| t.value(row, col))));
        entry.0 += count(t, row, runs);
    }

    let mut best: BTreeMap<&str, HighestScore> = BTreeMap::new();
    for ((s, match_key, p), (r, tm)) in totals {
        let better = match best.get(s) {
            None => true,
            Some(cur) => r > cur.runs || (r == cur.runs && p < cur.player.as_str()),
        };
        if better {
            best.insert(
                s,
                HighestScore {
                    season: s.to_string(),
                    player: p.to_string(),
                    team: tm.map(str::to_string),
                    match_key: match_key.to_string(),
                    runs: r,
                },
            );
        }
    }
    Ok(best.into_values().collect())
}

/// Per season, the best single-match figures: most wickets, then fewest runs
/// conceded, then player name.
pub fn best_bowling_figures(t: &Table) -> PipelineResult<Vec<BestBowling>> {
    const STAGE: &str = "best_bowling_figures";
    let c = t.require_all(STAGE, &["season", "player", "wickets", "runs_conceded"])?;
    let (season, player, wickets, conceded) = (c[0], c[1], c[2], c[3]);
    let key = match_key_column(t, STAGE)?;
    let team = t.column_index("team");
    let balls_bowled = t.column_index("balls_bowled");

    let mut figures: BTreeMap<(&str, &str, &str), (u32, u32, u32, Option<&str>)> = BTreeMap::new();
    for row in 0..t.len() {
        let entry = figures
            .entry((text(t, row, season), text(t, row, key), text(t, row, player)))
            .or_insert((0, 0, 0, team.and_then(|col| t.value(row, col))));
        entry.0 += count(t, row, wickets);
        entry.1 += count(t, row, conceded);
        entry.2 += balls_bowled.map_or(0, |col| count(t, row, col));
    }

    let mut best: BTreeMap<&str, BestBowling> = BTreeMap::new();
    for ((s, match_key, p), (w, r, b, tm)) in figures {
        let bowled = match balls_bowled {
            Some(_) => b > 0,
            None => w > 0 || r > 0,
        };
        if !bowled {
            continue;
        }
        let better = match best.get(s) {
            None => true,
            Some(cur) => {
                (w, Reverse(r), Reverse(p))
                    > (cur.wickets, Reverse(cur.runs_conceded), Reverse(cur.player.as_str()))
            }
        };
        if better {
            best.insert(
                s,
                BestBowling {
                    season: s.to_string(),
                    player: p.to_string(),
                    team: tm.map(str::to_string),
                    match_key: match_key.to_string(),
                    wickets: w,
                    runs_conceded: r,
                },
            );
        }
    }
    Ok(best.into_values().collect())
}

/// Highest season strike rates among players who faced at least
/// `min_balls`. Without a balls column each row counts as one ball.
pub fn strike_rate_leaders(t: &Table, opts: &AdvancedOptions) -> PipelineResult<Vec<StrikeRateLeader>> {
    const STAGE: &str = "strike_rate_leaders";
    let c = t.require_all(STAGE, &["season", "player", "runs"])?;
    let (season, player, runs) = (c[0], c[1], c[2]);
    let balls = t.column_index("balls");
    if balls.is_none() {
        warn!("no balls column; counting player rows as balls faced");
    }

    let mut totals: BTreeMap<(&str, &str), (u32, u32)> = BTreeMap::new();
    for row in 0..t.len() {
        let entry = totals
            .entry((text(t, row, season), text(t, row, player)))
            .or_default();
        entry.0 += count(t, row, runs);
        entry.1 += balls.map_or(1, |col| count(t, row, col));
    }

    let mut by_season: BTreeMap<&str, Vec<(&str, u32, u32, f64)>> = BTreeMap::new();
    for ((s, p), (r, b)) in totals {
        if b >= opts.min_balls && b > 0 {
            by_season.entry(s).or_default().push((p, r, b, strike_rate(r, b)));
        }
    }

    let mut out = Vec::new();
    for (s, mut rows) in by_season {
        rows.sort_by(|a, b| b.3.total_cmp(&a.3).then_with(|| a.0.cmp(b.0)));
        for (idx, (p, r, b, sr)) in rows.into_iter().take(opts.top_n).enumerate() {
            out.push(StrikeRateLeader {
                season: s.to_string(),
                rank: idx as u32 + 1,
                player: p.to_string(),
                runs: r,
                balls: b,
                strike_rate: sr,
            });
        }
    }
    Ok(out)
}

/// Lowest season economy among players who bowled at least `min_balls`.
pub fn economy_leaders(t: &Table, opts: &AdvancedOptions) -> PipelineResult<Vec<EconomyLeader>> {
    const STAGE: &str = "economy_leaders";
    let c = t.require_all(STAGE, &["season", "player", "balls_bowled", "runs_conceded"])?;
    let (season, player, balls_bowled, conceded) = (c[0], c[1], c[2], c[3]);

    let mut totals: BTreeMap<(&str, &str), (u32, u32)> = BTreeMap::new();
    for row in 0..t.len() {
        let entry = totals
            .entry((text(t, row, season), text(t, row, player)))
            .or_default();
        entry.0 += count(t, row, balls_bowled);
        entry.1 += count(t, row, conceded);
    }

    let mut by_season: BTreeMap<&str, Vec<(&str, u32, u32, f64)>> = BTreeMap::new();
    for ((s, p), (b, r)) in totals {
        if b >= opts.min_balls && b > 0 {
            by_season.entry(s).or_default().push((p, b, r, bowling_economy(r, b)));
        }
    }

    let mut out = Vec::new();
    for (s, mut rows) in by_season {
        rows.sort_by(|a, b| a.3.total_cmp(&b.3).then_with(|| a.0.cmp(b.0)));
        for (idx, (p, b, r, econ)) in rows.into_iter().take(opts.top_n).enumerate() {
            out.push(EconomyLeader {
                season: s.to_string(),
                rank: idx as u32 + 1,
                player: p.to_string(),
                balls_bowled: b,
                runs_conceded: r,
                economy: econ,
            });
        }
    }
    Ok(out)
}

/// Uses the per-match `team1`/`team2` fan-out when present, otherwise the
/// distinct teams seen on player rows.
pub fn team_win_pct(t: &Table) -> PipelineResult<Vec<TeamWinPct>> {
    const STAGE: &str = "team_win_pct";
    let c = t.require_all(STAGE, &["season", "match_won_by"])?;
    let (season, winner) = (c[0], c[1]);
    let key = match_key_column(t, STAGE)?;

    let sides: Vec<usize> = match (t.column_index("team1"), t.column_index("team2")) {
        (Some(a), Some(b)) => vec![a, b],
        _ => vec![t.require(STAGE, "team")?],
    };
    let sides = &sides;

    let appearances = (0..t.len()).flat_map(move |row| {
        sides.iter().map(move |&col| TeamAppearance {
            season: text(t, row, season),
            match_key: text(t, row, key),
            team: text(t, row, col),
            winner: t.value(row, winner),
        })
    });
    Ok(win_percentages(appearances))
}

/// Season runs per over for each team, from its innings totals. Innings
/// without a legal ball are left out.
pub fn team_run_rates(t: &Table) -> PipelineResult<Vec<TeamRunRate>> {
    const STAGE: &str = "team_run_rates";
    let season = t.require(STAGE, "season")?;
    let key = match_key_column(t, STAGE)?;
    let cols = InningsCols::require(t, STAGE)?;

    let mut totals: BTreeMap<(&str, &str), (u32, u32, u32)> = BTreeMap::new();
    for row in first_row_per_match(t, key) {
        for (team, runs, balls) in cols.innings(t, row) {
            if balls == 0 || team == UNKNOWN {
                continue;
            }
            let entry = totals.entry((text(t, row, season), team)).or_default();
            entry.0 += 1;
            entry.1 += runs;
            entry.2 += balls;
        }
    }

    Ok(totals
        .into_iter()
        .map(|((s, team), (innings, runs, balls))| TeamRunRate {
            season: s.to_string(),
            team: team.to_string(),
            innings,
            runs,
            balls,
            runs_per_over: runs_per_over(runs as f64, balls as f64)
                .map(round2)
                .unwrap_or(0.0),
        })
        .collect())
}

/// Per venue across all seasons. Each match contributes two innings to the
/// wickets-per-innings average.
pub fn venue_insights(t: &Table) -> PipelineResult<Vec<VenueInsight>> {
    const STAGE: &str = "venue_insights";
    let c = t.require_all(
        STAGE,
        &["venue", "runs_team1", "runs_team2", "wickets_team1", "wickets_team2"],
    )?;
    let (venue, runs1, runs2, wkts1, wkts2) = (c[0], c[1], c[2], c[3], c[4]);
    let key = match_key_column(t, STAGE)?;

    let mut totals: BTreeMap<&str, (u32, u32, u32, u32)> = BTreeMap::new();
    for row in first_row_per_match(t, key) {
        let entry = totals.entry(text(t, row, venue)).or_default();
        let first = count(t, row, runs1);
        entry.0 += 1;
        entry.1 += first;
        entry.2 += count(t, row, wkts1) + count(t, row, wkts2);
        entry.3 += first + count(t, row, runs2);
    }

    let avg = |num: u32, den: u32| {
        ratio(num as f64, den as f64, "venue_average")
            .map(round2)
            .unwrap_or(0.0)
    };
    Ok(totals
        .into_iter()
        .map(|(v, (matches, first, wickets, runs))| VenueInsight {
            venue: v.to_string(),
            matches,
            avg_first_innings: avg(first, matches),
            avg_wickets_per_innings: avg(wickets, matches * 2),
            avg_match_runs: avg(runs, matches),
        })
        .collect())
}

/// First against second innings run rate per match. Matches where either
/// innings has no legal ball have no defined rate and are dropped.
pub fn innings_run_rates(t: &Table) -> PipelineResult<Vec<InningsRunRate>> {
    const STAGE: &str = "innings_run_rates";
    let season = t.require(STAGE, "season")?;
    let key = match_key_column(t, STAGE)?;
    let cols = InningsCols::require(t, STAGE)?;

    let mut out = Vec::new();
    for row in first_row_per_match(t, key) {
        let [(team1, runs1, balls1), (team2, runs2, balls2)] = cols.innings(t, row);
        let (Some(first), Some(second)) = (
            runs_per_over(runs1 as f64, balls1 as f64),
            runs_per_over(runs2 as f64, balls2 as f64),
        ) else {
            continue;
        };
        out.push(InningsRunRate {
            season: text(t, row, season).to_string(),
            match_key: text(t, row, key).to_string(),
            team1: team1.to_string(),
            team2: team2.to_string(),
            first_innings_rpo: round2(first),
            second_innings_rpo: round2(second),
            rpo_difference: round2(first - second),
        });
    }
    Ok(out)
}

#[derive(Default)]
struct OverviewAcc<'t> {
    matches: u32,
    match_runs: u32,
    highest: Option<(u32, &'t str)>,
    lowest: Option<(u32, &'t str)>,
}

/// Season headline numbers. The lowest team score only considers innings
/// with at least one legal ball. Top scorer and top bowler are the season's
/// best single-match figures, as in [`highest_individual_scores`] and
/// [`best_bowling_figures`].
pub fn season_overview(t: &Table) -> PipelineResult<Vec<SeasonOverview>> {
    const STAGE: &str = "season_overview";
    let season = t.require(STAGE, "season")?;
    let key = match_key_column(t, STAGE)?;
    let cols = InningsCols::require(t, STAGE)?;

    let mut top_scorers: HashMap<String, HighestScore> = highest_individual_scores(t)?
        .into_iter()
        .map(|h| (h.season.clone(), h))
        .collect();
    let mut top_bowlers: HashMap<String, BestBowling> = best_bowling_figures(t)?
        .into_iter()
        .map(|b| (b.season.clone(), b))
        .collect();

    let mut seasons: BTreeMap<&str, OverviewAcc<'_>> = BTreeMap::new();
    for row in first_row_per_match(t, key) {
        let acc = seasons.entry(text(t, row, season)).or_default();
        acc.matches += 1;
        for (team, team_runs, balls) in cols.innings(t, row) {
            acc.match_runs += team_runs;
            if acc
                .highest
                .is_none_or(|(best, name)| (team_runs, Reverse(team)) > (best, Reverse(name)))
            {
                acc.highest = Some((team_runs, team));
            }
            if balls > 0
                && acc.lowest.is_none_or(|(worst, name)| (team_runs, team) < (worst, name))
            {
                acc.lowest = Some((team_runs, team));
            }
        }
    }

    Ok(seasons
        .into_iter()
        .map(|(s, acc)| {
            let (top_scorer, top_runs) = top_scorers
                .remove(s)
                .map_or((UNKNOWN.to_string(), 0), |h| (h.player, h.runs));
            let (top_bowler, top_wickets) = top_bowlers
                .remove(s)
                .map_or((UNKNOWN.to_string(), 0), |b| (b.player, b.wickets));
            let (highest, highest_team) = acc.highest.unwrap_or((0, UNKNOWN));
            let (lowest, lowest_team) = acc.lowest.unwrap_or((0, UNKNOWN));
            SeasonOverview {
                season: s.to_string(),
                matches: acc.matches,
                highest_team_score: highest,
                highest_scoring_team: highest_team.to_string(),
                lowest_team_score: lowest,
                lowest_scoring_team: lowest_team.to_string(),
                avg_match_runs: ratio(acc.match_runs as f64, acc.matches as f64, "avg_match_runs")
                    .map(round2)
                    .unwrap_or(0.0),
                top_scorer,
                top_scorer_runs: top_runs,
                top_bowler,
                top_bowler_wickets: top_wickets,
            }
        })
        .collect())
}
