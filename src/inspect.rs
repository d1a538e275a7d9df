use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use crate::metrics::{ratio, round2};
use crate::table::Table;

const UNIQUE_COLUMNS: &[&str] = &["match_id", "season", "venue", "batting_team", "batter", "bowler"];
const VALUE_COUNT_COLUMNS: &[&str] = &["wicket_kind", "extra_type", "player_of_match"];

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub name: String,
    pub missing: usize,
    pub missing_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowsPerMatch {
    pub matches: usize,
    pub min: usize,
    pub median: f64,
    pub mean: f64,
    pub max: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableProfile {
    pub rows: usize,
    pub columns: Vec<ColumnProfile>,
    pub unique_counts: Vec<(String, usize)>,
    pub rows_per_match: Option<RowsPerMatch>,
    pub value_counts: Vec<(String, Vec<(String, usize)>)>,
}

/// Shape and missingness of a raw or cleaned delivery table. `top` bounds the
/// value counts listed per categorical column.
pub fn profile_table(table: &Table, top: usize) -> TableProfile {
    let rows = table.len();
    let columns = table
        .headers()
        .iter()
        .enumerate()
        .map(|(col, name)| {
            let missing = (0..rows).filter(|&row| table.value(row, col).is_none()).count();
            ColumnProfile {
                name: name.clone(),
                missing,
                missing_pct: ratio(missing as f64, rows as f64, "missing_pct")
                    .map(|r| round2(r * 100.0))
                    .unwrap_or(0.0),
            }
        })
        .collect();

    let unique_counts = UNIQUE_COLUMNS
        .iter()
        .filter_map(|name| {
            let col = table.column_index(name)?;
            let distinct: HashSet<&str> = (0..rows).filter_map(|row| table.value(row, col)).collect();
            Some((name.to_string(), distinct.len()))
        })
        .collect();

    let rows_per_match = table.column_index("match_id").and_then(|col| {
        let mut per_match: HashMap<&str, usize> = HashMap::new();
        for row in 0..rows {
            if let Some(id) = table.value(row, col) {
                *per_match.entry(id).or_default() += 1;
            }
        }
        let mut sizes: Vec<usize> = per_match.into_values().collect();
        sizes.sort_unstable();
        let (&min, &max) = (sizes.first()?, sizes.last()?);
        let mid = sizes.len() / 2;
        let median = if sizes.len() % 2 == 0 {
            (sizes[mid - 1] + sizes[mid]) as f64 / 2.0
        } else {
            sizes[mid] as f64
        };
        let total: usize = sizes.iter().sum();
        Some(RowsPerMatch {
            matches: sizes.len(),
            min,
            median,
            mean: round2(total as f64 / sizes.len() as f64),
            max,
        })
    });

    let value_counts = VALUE_COUNT_COLUMNS
        .iter()
        .filter_map(|name| {
            let col = table.column_index(name)?;
            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for row in 0..rows {
                if let Some(v) = table.value(row, col) {
                    *counts.entry(v).or_default() += 1;
                }
            }
            let mut counts: Vec<(String, usize)> = counts
                .into_iter()
                .map(|(v, n)| (v.to_string(), n))
                .collect();
            counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            counts.truncate(top);
            Some((name.to_string(), counts))
        })
        .collect();

    TableProfile {
        rows,
        columns,
        unique_counts,
        rows_per_match,
        value_counts,
    }
}

impl fmt::Display for TableProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rows: {}", self.rows)?;
        writeln!(f, "Columns ({}):", self.columns.len())?;
        for c in &self.columns {
            writeln!(f, "  {:<20} missing {:>7} ({:.2}%)", c.name, c.missing, c.missing_pct)?;
        }
        if !self.unique_counts.is_empty() {
            writeln!(f, "Unique values:")?;
            for (name, n) in &self.unique_counts {
                writeln!(f, "  {name:<20} {n}")?;
            }
        }
        if let Some(r) = &self.rows_per_match {
            writeln!(
                f,
                "Rows per match over {} matches: min={} median={} mean={} max={}",
                r.matches, r.min, r.median, r.mean, r.max
            )?;
        }
        for (name, counts) in &self.value_counts {
            writeln!(f, "{name}:")?;
            for (value, n) in counts {
                writeln!(f, "  {value:<30} {n}")?;
            }
        }
        Ok(())
    }
}
