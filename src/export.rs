use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use tracing::info;

use crate::advanced::AdvancedStats;
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::PipelineOutputs;
use crate::rollup::{SeasonSummary, TeamSeasonSummary, TeamWinPct, VenueSeasonSummary};
use crate::table::{Record, Table, write_records};

pub const CLEANED_DELIVERIES_FILE: &str = "cleaned_deliveries.csv";
pub const MATCH_SUMMARY_FILE: &str = "match_summary.csv";
pub const PLAYER_MATCH_FILE: &str = "player_match_summary.csv";
pub const TEAM_SEASON_FILE: &str = "team_season_summary.csv";
pub const VENUE_SEASON_FILE: &str = "venue_season_summary.csv";
pub const SEASON_FILE: &str = "season_summary.csv";
pub const TEAM_WIN_PCT_FILE: &str = "team_win_pct.csv";

pub const ADVANCED_DIR: &str = "advanced";
pub const SEASON_OVERVIEW_FILE: &str = "season_overview.csv";
pub const HIGHEST_SCORES_FILE: &str = "highest_individual_scores.csv";
pub const BEST_BOWLING_FILE: &str = "best_bowling_figures.csv";
pub const STRIKE_RATE_LEADERS_FILE: &str = "strike_rate_leaders.csv";
pub const ECONOMY_LEADERS_FILE: &str = "economy_leaders.csv";
pub const TEAM_RUN_RATES_FILE: &str = "team_run_rates.csv";
pub const VENUE_INSIGHTS_FILE: &str = "venue_insights.csv";
pub const INNINGS_RUN_RATES_FILE: &str = "innings_run_rates.csv";

fn write_into<T: Record>(rows: &[T], dir: &Path, name: &str, written: &mut Vec<PathBuf>) -> PipelineResult<()> {
    let path = dir.join(name);
    write_records(rows, &path)?;
    written.push(path);
    Ok(())
}

pub fn write_rollups(
    team_seasons: &[TeamSeasonSummary],
    venue_seasons: &[VenueSeasonSummary],
    seasons: &[SeasonSummary],
    team_win_pct: &[TeamWinPct],
    dir: &Path,
) -> PipelineResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(4);
    write_into(team_seasons, dir, TEAM_SEASON_FILE, &mut written)?;
    write_into(venue_seasons, dir, VENUE_SEASON_FILE, &mut written)?;
    write_into(seasons, dir, SEASON_FILE, &mut written)?;
    write_into(team_win_pct, dir, TEAM_WIN_PCT_FILE, &mut written)?;
    Ok(written)
}

/// Skipped statistics produce no file.
pub fn write_advanced(stats: &AdvancedStats, dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    let mut written = Vec::new();
    if let Some(rows) = &stats.season_overview {
        write_into(rows, dir, SEASON_OVERVIEW_FILE, &mut written)?;
    }
    if let Some(rows) = &stats.highest_scores {
        write_into(rows, dir, HIGHEST_SCORES_FILE, &mut written)?;
    }
    if let Some(rows) = &stats.best_bowling {
        write_into(rows, dir, BEST_BOWLING_FILE, &mut written)?;
    }
    if let Some(rows) = &stats.strike_rate_leaders {
        write_into(rows, dir, STRIKE_RATE_LEADERS_FILE, &mut written)?;
    }
    if let Some(rows) = &stats.economy_leaders {
        write_into(rows, dir, ECONOMY_LEADERS_FILE, &mut written)?;
    }
    if let Some(rows) = &stats.team_win_pct {
        write_into(rows, dir, TEAM_WIN_PCT_FILE, &mut written)?;
    }
    if let Some(rows) = &stats.team_run_rates {
        write_into(rows, dir, TEAM_RUN_RATES_FILE, &mut written)?;
    }
    if let Some(rows) = &stats.venue_insights {
        write_into(rows, dir, VENUE_INSIGHTS_FILE, &mut written)?;
    }
    if let Some(rows) = &stats.innings_run_rates {
        write_into(rows, dir, INNINGS_RUN_RATES_FILE, &mut written)?;
    }
    Ok(written)
}

/// Every stage table under `dir`, advanced statistics under `dir/advanced`.
pub fn write_outputs(outputs: &PipelineOutputs, dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    let cleaned_path = dir.join(CLEANED_DELIVERIES_FILE);
    outputs.cleaned.write_csv(&cleaned_path)?;
    let mut written = vec![cleaned_path];

    write_into(&outputs.matches, dir, MATCH_SUMMARY_FILE, &mut written)?;
    write_into(&outputs.player_matches, dir, PLAYER_MATCH_FILE, &mut written)?;
    written.extend(write_rollups(
        &outputs.team_seasons,
        &outputs.venue_seasons,
        &outputs.seasons,
        &outputs.team_win_pct,
        dir,
    )?);
    written.extend(write_advanced(&outputs.advanced, &dir.join(ADVANCED_DIR))?);

    info!(files = written.len(), dir = %dir.display(), "wrote stage outputs");
    Ok(written)
}

/// One sheet per summary table. The cleaned delivery table is left out.
pub fn write_workbook(outputs: &PipelineOutputs, path: &Path) -> PipelineResult<()> {
    let mut sheets: Vec<(&str, Table)> = vec![
        ("Matches", Table::from_records(&outputs.matches)?),
        ("PlayerMatches", Table::from_records(&outputs.player_matches)?),
        ("TeamSeason", Table::from_records(&outputs.team_seasons)?),
        ("VenueSeason", Table::from_records(&outputs.venue_seasons)?),
        ("Season", Table::from_records(&outputs.seasons)?),
        ("TeamWinPct", Table::from_records(&outputs.team_win_pct)?),
    ];
    let adv = &outputs.advanced;
    if let Some(rows) = &adv.season_overview {
        sheets.push(("SeasonOverview", Table::from_records(rows)?));
    }
    if let Some(rows) = &adv.highest_scores {
        sheets.push(("HighestScores", Table::from_records(rows)?));
    }
    if let Some(rows) = &adv.best_bowling {
        sheets.push(("BestBowling", Table::from_records(rows)?));
    }
    if let Some(rows) = &adv.strike_rate_leaders {
        sheets.push(("StrikeRateLeaders", Table::from_records(rows)?));
    }
    if let Some(rows) = &adv.economy_leaders {
        sheets.push(("EconomyLeaders", Table::from_records(rows)?));
    }
    if let Some(rows) = &adv.team_run_rates {
        sheets.push(("TeamRunRates", Table::from_records(rows)?));
    }
    if let Some(rows) = &adv.venue_insights {
        sheets.push(("VenueInsights", Table::from_records(rows)?));
    }
    if let Some(rows) = &adv.innings_run_rates {
        sheets.push(("InningsRunRates", Table::from_records(rows)?));
    }

    let mut workbook = Workbook::new();
    for (name, table) in &sheets {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name(*name)
            .map_err(|err| PipelineError::write(path, err))?;
        write_table(sheet, table).map_err(|err| PipelineError::write(path, err))?;
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|err| PipelineError::write(parent, err))?;
    }
    workbook
        .save(path)
        .map_err(|err| PipelineError::write(path, err))?;
    info!(path = %path.display(), sheets = sheets.len(), "wrote workbook");
    Ok(())
}

fn write_table(worksheet: &mut Worksheet, table: &Table) -> Result<(), XlsxError> {
    for (col_idx, header) in table.headers().iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }
    for (row_idx, row) in table.rows().iter().enumerate() {
        let r = row_idx as u32 + 1;
        for (col_idx, value) in row.iter().enumerate() {
            let Some(value) = value else {
                continue;
            };
            match value.parse::<f64>() {
                Ok(n) if n.is_finite() => worksheet.write_number(r, col_idx as u16, n)?,
                _ => worksheet.write_string(r, col_idx as u16, value)?,
            };
        }
    }
    Ok(())
}
