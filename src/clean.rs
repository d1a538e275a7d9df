use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::aliases::{DELIVERY_ALIASES, normalize_columns};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::table::Table;

pub const NO_WICKET: &str = "No Wicket";
pub const NO_EXTRA: &str = "No Extra";
pub const UNKNOWN: &str = "Unknown";

pub const PREFERRED_ORDER: &[&str] = &[
    "match_id",
    "date",
    "season",
    "event_name",
    "match_type",
    "venue",
    "city",
    "innings",
    "batting_team",
    "bowling_team",
    "over",
    "ball",
    "ball_no",
    "batter",
    "non_striker",
    "bowler",
    "runs_batter",
    "runs_extras",
    "runs_total",
    "wicket_kind",
    "player_out",
    "extra_type",
    "bat_pos",
    "balls_faced",
    "team_runs",
    "team_balls",
    "team_wicket",
    "player_of_match",
    "match_won_by",
    "win_outcome",
    "toss_winner",
    "toss_decision",
    "gender",
    "team_type",
];

const TEAM_COLUMNS: &[&str] = &[
    "batting_team",
    "bowling_team",
    "match_won_by",
    "toss_winner",
    "team1",
    "team2",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Debug, Clone)]
pub struct CleanOptions {
    pub placeholder_tokens: Vec<String>,
    pub date_column: String,
    pub numeric_columns: Vec<String>,
    pub dropped_columns: Vec<String>,
    pub team_name_map: BTreeMap<String, String>,
}

impl From<&PipelineConfig> for CleanOptions {
    fn from(cfg: &PipelineConfig) -> Self {
        Self {
            placeholder_tokens: cfg.placeholder_tokens.clone(),
            date_column: cfg.date_column.clone(),
            numeric_columns: cfg.numeric_columns.clone(),
            dropped_columns: cfg.dropped_columns.clone(),
            team_name_map: cfg.team_name_map.clone(),
        }
    }
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub duplicates_removed: usize,
    pub renamed_columns: Vec<(String, String)>,
    pub dropped_columns: Vec<String>,
    pub dates_unparsed: usize,
    pub numeric_coerced: usize,
    pub runs_total_repaired: usize,
}

pub fn clean_deliveries(mut raw: Table, opts: &CleanOptions) -> (Table, CleanReport) {
    let mut report = CleanReport {
        rows_in: raw.len(),
        ..Default::default()
    };
    report.renamed_columns = normalize_columns(&mut raw, DELIVERY_ALIASES).renames;

    let (headers, rows) = raw.into_parts();
    let keep: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| {
            let drop = opts.dropped_columns.iter().any(|d| d == *h);
            if drop {
                report.dropped_columns.push(h.to_string());
            }
            !drop
        })
        .map(|(idx, _)| idx)
        .collect();
    let headers: Vec<String> = keep.iter().map(|&idx| headers[idx].clone()).collect();

    let placeholders: HashSet<&str> = opts.placeholder_tokens.iter().map(String::as_str).collect();
    let mut rows: Vec<Vec<Option<String>>> = rows
        .into_iter()
        .map(|row| {
            keep.iter()
                .map(|&idx| normalize_cell(row.get(idx).cloned().flatten(), &placeholders))
                .collect()
        })
        .collect();

    let col = |name: &str| headers.iter().position(|h| h == name);

    if let Some(idx) = col(&opts.date_column) {
        for row in &mut rows {
            let Some(raw) = row[idx].take() else {
                continue;
            };
            match parse_date(&raw) {
                Some(date) => row[idx] = Some(date.format("%Y-%m-%d").to_string()),
                None => report.dates_unparsed += 1,
            }
        }
    }

    for name in &opts.numeric_columns {
        let Some(idx) = col(name) else {
            continue;
        };
        for row in &mut rows {
            let value = match row[idx].as_deref().map(coerce_count) {
                Some(Ok(n)) => n,
                Some(Err(_)) => {
                    report.numeric_coerced += 1;
                    0
                }
                None => 0,
            };
            row[idx] = Some(value.to_string());
        }
    }

    if !opts.team_name_map.is_empty() {
        for idx in TEAM_COLUMNS.iter().filter_map(|name| col(name)) {
            for row in &mut rows {
                if let Some(team) = row[idx].as_mut()
                    && let Some(canonical) = opts.team_name_map.get(team.as_str())
                {
                    *team = canonical.clone();
                }
            }
        }
    }

    for (name, sentinel) in [
        ("wicket_kind", NO_WICKET),
        ("extra_type", NO_EXTRA),
        ("match_won_by", UNKNOWN),
    ] {
        if let Some(idx) = col(name) {
            for row in &mut rows {
                row[idx].get_or_insert_with(|| sentinel.to_string());
            }
        }
    }

    if let (Some(bat), Some(extras), Some(total)) =
        (col("runs_batter"), col("runs_extras"), col("runs_total"))
    {
        for row in &mut rows {
            let bat_runs = count_at(row, bat);
            let extra_runs = count_at(row, extras);
            if count_at(row, total) != bat_runs + extra_runs {
                row[total] = Some((bat_runs + extra_runs).to_string());
                report.runs_total_repaired += 1;
            }
        }
    }

    let before = rows.len();
    let mut seen = HashSet::with_capacity(rows.len());
    rows.retain(|row| seen.insert(row.clone()));
    report.duplicates_removed = before - rows.len();

    let cleaned = reorder_columns(Table::from_rows(headers, rows));
    report.rows_out = cleaned.len();

    if report.dates_unparsed > 0 {
        warn!(count = report.dates_unparsed, column = %opts.date_column, "unparseable dates set to missing");
    }
    if report.numeric_coerced > 0 {
        warn!(count = report.numeric_coerced, "unparseable numeric values defaulted to zero");
    }
    if report.runs_total_repaired > 0 {
        warn!(count = report.runs_total_repaired, "runs_total recomputed from batter and extras runs");
    }
    info!(
        rows_in = report.rows_in,
        rows_out = report.rows_out,
        duplicates_removed = report.duplicates_removed,
        "cleaned deliveries"
    );
    (cleaned, report)
}

/// Listed columns first in their logical order, any others after them in
/// their original relative order.
pub fn reorder_columns(table: Table) -> Table {
    let (headers, rows) = table.into_parts();
    let mut order: Vec<usize> = PREFERRED_ORDER
        .iter()
        .filter_map(|name| headers.iter().position(|h| h == name))
        .collect();
    let rest: Vec<usize> = (0..headers.len())
        .filter(|idx| !order.contains(idx))
        .collect();
    order.extend(rest);

    let headers = order.iter().map(|&idx| headers[idx].clone()).collect();
    let rows = rows
        .into_iter()
        .map(|row| order.iter().map(|&idx| row[idx].clone()).collect())
        .collect();
    Table::from_rows(headers, rows)
}

fn normalize_cell(value: Option<String>, placeholders: &HashSet<&str>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() || placeholders.contains(trimmed) {
        return None;
    }
    if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

fn count_at(row: &[Option<String>], idx: usize) -> u64 {
    row[idx]
        .as_deref()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
}

/// Non-negative integer coercion. Decimal strings are truncated.
pub fn coerce_count(raw: &str) -> PipelineResult<u64> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<u64>() {
        return Ok(n);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 => Ok(f.trunc() as u64),
        _ => Err(PipelineError::Parse {
            value: trimmed.to_string(),
            expected: "non-negative integer",
        }),
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }
    None
}
