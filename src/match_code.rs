//! Season-aware match codes.
//!
//! Two derivations exist and must stay distinct:
//!
//! * [`assign_join_key_code`] ranks matches by their raw identifier inside a
//!   lexicographically ranked season label. It is only a join key between
//!   delivery rows and player-match rows (`S<season>_M<n>`).
//! * [`assign_chronological_code`] re-derives the season from its start year
//!   and numbers matches by date. It is the display code (`S<season>_<nn>`).

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::warn;

use crate::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone, Copy)]
pub struct MatchKeyInput<'a> {
    pub match_id: &'a str,
    pub season: &'a str,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinKey {
    pub match_id: String,
    pub season_number: u32,
    pub match_number_in_season: u32,
    pub match_s_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChronologicalCode {
    pub match_id: String,
    pub season_start_year: i32,
    pub season_no: u32,
    pub season_match_no: u32,
    pub match_code: String,
}

#[derive(Debug, Clone, Default)]
pub struct ChronologicalAssignment {
    /// Coded matches in chronological order.
    pub codes: Vec<ChronologicalCode>,
    /// Match ids whose season label has no start year, in input order.
    pub excluded: Vec<String>,
}

/// Join-key codes, returned in input order.
///
/// `season_number` is the dense rank of the season label; the match number is
/// the rank of the raw identifier inside its season, ties kept in arrival order.
pub fn assign_join_key_code(inputs: &[MatchKeyInput<'_>]) -> Vec<JoinKey> {
    let labels: BTreeSet<&str> = inputs.iter().map(|m| m.season).collect();
    let season_rank: BTreeMap<&str, u32> = labels
        .into_iter()
        .enumerate()
        .map(|(idx, label)| (label, idx as u32 + 1))
        .collect();

    let mut by_season: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, m) in inputs.iter().enumerate() {
        by_season.entry(m.season).or_default().push(idx);
    }

    let mut numbers = vec![0u32; inputs.len()];
    for indices in by_season.values_mut() {
        indices.sort_by(|&a, &b| compare_match_ids(inputs[a].match_id, inputs[b].match_id));
        for (rank, &idx) in indices.iter().enumerate() {
            numbers[idx] = rank as u32 + 1;
        }
    }

    inputs
        .iter()
        .zip(numbers)
        .map(|(m, n)| {
            let season_number = season_rank[m.season];
            JoinKey {
                match_id: m.match_id.to_string(),
                season_number,
                match_number_in_season: n,
                match_s_id: format!("S{season_number}_M{n}"),
            }
        })
        .collect()
}

/// Display codes ordered by (season start year, date).
///
/// Matches whose season has no parseable start year are left out of the sort
/// and reported in `excluded`.
pub fn assign_chronological_code(inputs: &[MatchKeyInput<'_>]) -> ChronologicalAssignment {
    let mut candidates = Vec::with_capacity(inputs.len());
    let mut excluded = Vec::new();
    for m in inputs {
        match season_start_year(m.season) {
            Ok(year) => candidates.push((m, year)),
            Err(err) => {
                warn!(match_id = m.match_id, "{err}; excluded from chronological order");
                excluded.push(m.match_id.to_string());
            }
        }
    }

    candidates.sort_by(|(a, ya), (b, yb)| ya.cmp(yb).then_with(|| compare_dates(a.date, b.date)));

    let years: BTreeSet<i32> = candidates.iter().map(|(_, y)| *y).collect();
    let season_no: BTreeMap<i32, u32> = years
        .into_iter()
        .enumerate()
        .map(|(idx, y)| (y, idx as u32 + 1))
        .collect();

    let mut counters: BTreeMap<u32, u32> = BTreeMap::new();
    let codes = candidates
        .into_iter()
        .map(|(m, year)| {
            let no = season_no[&year];
            let counter = counters.entry(no).or_insert(0);
            *counter += 1;
            ChronologicalCode {
                match_id: m.match_id.to_string(),
                season_start_year: year,
                season_no: no,
                season_match_no: *counter,
                match_code: format!("S{no}_{:02}", *counter),
            }
        })
        .collect();

    ChronologicalAssignment { codes, excluded }
}

/// `"2020/21"` starts in 2020, `"2022"` in 2022.
pub fn season_start_year(label: &str) -> PipelineResult<i32> {
    let trimmed = label.trim();
    if let Some((head, _)) = trimmed.split_once('/')
        && let Ok(year) = head.trim().parse::<i32>()
    {
        return Ok(year);
    }
    trimmed
        .parse::<i32>()
        .map_err(|_| PipelineError::SeasonParse(trimmed.to_string()))
}

/// Numeric when both identifiers are integers, lexicographic otherwise.
pub fn compare_match_ids(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<u64>(), b.trim().parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn compare_dates(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
