use chrono::NaiveDate;
use tracing::warn;

use crate::clean::{NO_EXTRA, NO_WICKET, UNKNOWN, coerce_count, parse_date};
use crate::error::PipelineResult;
use crate::table::Table;

const STAGE: &str = "deliveries";

pub const REQUIRED_COLUMNS: &[&str] = &[
    "match_id",
    "batting_team",
    "bowling_team",
    "batter",
    "bowler",
    "runs_batter",
    "runs_extras",
    "runs_total",
];

/// One ball bowled.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub match_id: String,
    pub innings: u32,
    pub over: u32,
    pub ball: u32,
    pub batting_team: String,
    pub bowling_team: String,
    pub batter: String,
    pub non_striker: Option<String>,
    pub bowler: String,
    pub runs_batter: u32,
    pub runs_extras: u32,
    pub runs_total: u32,
    pub extra_type: String,
    pub wicket_kind: String,
    pub player_out: Option<String>,
    pub context: MatchContext,
}

/// Match-level descriptive fields repeated on every delivery row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchContext {
    pub date: Option<NaiveDate>,
    pub season: Option<String>,
    pub venue: Option<String>,
    pub city: Option<String>,
    pub player_of_match: Option<String>,
    pub match_won_by: Option<String>,
    pub win_outcome: Option<String>,
}

impl Delivery {
    /// Wides and no-balls do not count toward the six legal balls of an over.
    pub fn is_legal(&self) -> bool {
        !is_illegal_extra(&self.extra_type)
    }

    pub fn is_wicket(&self) -> bool {
        self.player_out.is_some()
    }
}

pub fn is_illegal_extra(extra_type: &str) -> bool {
    let key: String = extra_type
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    matches!(
        key.as_str(),
        "wide" | "wides" | "wd" | "noball" | "noballs" | "nb"
    )
}

/// Cleaned counts are non-negative integers; values beyond `u32` saturate.
pub fn saturating_count(raw: &str) -> u32 {
    coerce_count(raw)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Typed view over a cleaned delivery table. Rows without a match identifier
/// cannot be grouped and are skipped.
pub fn deliveries_from_table(table: &Table) -> PipelineResult<Vec<Delivery>> {
    let req = table.require_all(STAGE, REQUIRED_COLUMNS)?;
    let (match_id, batting_team, bowling_team, batter, bowler, runs_batter, runs_extras, runs_total) =
        (req[0], req[1], req[2], req[3], req[4], req[5], req[6], req[7]);
    let innings = table.column_index("innings");
    let over = table.column_index("over");
    let ball = table.column_index("ball");
    let non_striker = table.column_index("non_striker");
    let extra_type = table.column_index("extra_type");
    let wicket_kind = table.column_index("wicket_kind");
    let player_out = table.column_index("player_out");
    let date = table.column_index("date");
    let season = table.column_index("season");
    let venue = table.column_index("venue");
    let city = table.column_index("city");
    let player_of_match = table.column_index("player_of_match");
    let match_won_by = table.column_index("match_won_by");
    let win_outcome = table.column_index("win_outcome");

    let text = |row: usize, col: Option<usize>| -> Option<String> {
        col.and_then(|c| table.value(row, c)).map(str::to_string)
    };
    let name = |row: usize, col: usize| -> String {
        table.value(row, col).unwrap_or(UNKNOWN).to_string()
    };
    let count = |row: usize, col: Option<usize>| -> u32 {
        col.and_then(|c| table.value(row, c))
            .map(saturating_count)
            .unwrap_or(0)
    };

    let mut out = Vec::with_capacity(table.len());
    let mut skipped = 0usize;
    for row in 0..table.len() {
        let Some(id) = table.value(row, match_id) else {
            skipped += 1;
            continue;
        };
        out.push(Delivery {
            match_id: id.to_string(),
            innings: count(row, innings),
            over: count(row, over),
            ball: count(row, ball),
            batting_team: name(row, batting_team),
            bowling_team: name(row, bowling_team),
            batter: name(row, batter),
            non_striker: text(row, non_striker),
            bowler: name(row, bowler),
            runs_batter: count(row, Some(runs_batter)),
            runs_extras: count(row, Some(runs_extras)),
            runs_total: count(row, Some(runs_total)),
            extra_type: text(row, extra_type).unwrap_or_else(|| NO_EXTRA.to_string()),
            wicket_kind: text(row, wicket_kind).unwrap_or_else(|| NO_WICKET.to_string()),
            player_out: text(row, player_out),
            context: MatchContext {
                date: text(row, date).as_deref().and_then(parse_date),
                season: text(row, season),
                venue: text(row, venue),
                city: text(row, city),
                player_of_match: text(row, player_of_match),
                match_won_by: text(row, match_won_by),
                win_outcome: text(row, win_outcome),
            },
        });
    }
    if skipped > 0 {
        warn!(count = skipped, "delivery rows without match_id skipped");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{is_illegal_extra, saturating_count};

    #[test]
    fn illegal_extras() {
        assert!(is_illegal_extra("wides"));
        assert!(is_illegal_extra("No-Ball"));
        assert!(is_illegal_extra("noballs"));
        assert!(!is_illegal_extra("legbyes"));
        assert!(!is_illegal_extra("No Extra"));
    }

    #[test]
    fn oversized_counts_saturate_instead_of_zeroing() {
        assert_eq!(saturating_count("6"), 6);
        assert_eq!(saturating_count("4294967296"), u32::MAX);
        assert_eq!(saturating_count("not a number"), 0);
    }
}
