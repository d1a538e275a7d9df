//! Whole-run orchestration and the per-stage "path in, path out" entry points.
//!
//! Stages hand fully materialised tables forward. Load, clean and match-code
//! failures abort the run; advanced statistics degrade one at a time.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::advanced::{AdvancedOptions, AdvancedStats, compute_advanced};
use crate::clean::{CleanOptions, CleanReport, clean_deliveries};
use crate::config::PipelineConfig;
use crate::delivery::{Delivery, deliveries_from_table};
use crate::error::PipelineResult;
use crate::export::{write_advanced, write_outputs, write_rollups, write_workbook};
use crate::match_summary::{
    MatchSummary, apply_match_metadata, summarize_matches, with_chronological_codes,
};
use crate::player_match::{PlayerMatchEntry, aggregate_player_matches};
use crate::rollup::{
    SeasonSummary, TeamSeasonSummary, TeamWinPct, VenueSeasonSummary, season_summaries,
    team_season_summaries, team_win_percentages, venue_season_summaries,
};
use crate::table::{Table, read_records, write_records};

const MATCH_STAGE: &str = "match_summary";
const PLAYER_STAGE: &str = "player_match_summary";

#[derive(Debug, Clone)]
pub struct PipelineOutputs {
    pub cleaned: Table,
    pub clean_report: CleanReport,
    pub matches: Vec<MatchSummary>,
    pub player_matches: Vec<PlayerMatchEntry>,
    pub team_seasons: Vec<TeamSeasonSummary>,
    pub venue_seasons: Vec<VenueSeasonSummary>,
    pub seasons: Vec<SeasonSummary>,
    pub team_win_pct: Vec<TeamWinPct>,
    pub advanced: AdvancedStats,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub outputs: PipelineOutputs,
    pub written: Vec<PathBuf>,
}

/// All stages in memory, nothing written.
pub fn compute(
    raw: Table,
    metadata: Option<Table>,
    cfg: &PipelineConfig,
) -> PipelineResult<PipelineOutputs> {
    let (cleaned, clean_report) = clean_deliveries(raw, &CleanOptions::from(cfg));
    let deliveries = deliveries_from_table(&cleaned)?;
    let matches = build_matches(&deliveries, metadata, cfg)?;
    let player_matches = aggregate_player_matches(&deliveries, &matches);

    let team_seasons = team_season_summaries(&player_matches);
    let venue_seasons = venue_season_summaries(&matches);
    let seasons = season_summaries(&matches);
    let team_win_pct = team_win_percentages(&matches);
    let advanced = compute_advanced(
        Table::from_records(&player_matches)?,
        &AdvancedOptions::from(cfg),
    );

    Ok(PipelineOutputs {
        cleaned,
        clean_report,
        matches,
        player_matches,
        team_seasons,
        venue_seasons,
        seasons,
        team_win_pct,
        advanced,
    })
}

/// Loads the configured inputs, runs every stage and writes each stage table
/// under `output_dir`, plus the workbook when one is configured.
pub fn run(cfg: &PipelineConfig) -> PipelineResult<RunReport> {
    info!(path = %cfg.deliveries_path.display(), "loading deliveries");
    let raw = Table::read_csv(&cfg.deliveries_path, &cfg.encodings)?;
    let metadata = load_metadata(cfg.matches_path.as_deref(), cfg)?;

    let outputs = compute(raw, metadata, cfg)?;
    let mut written = write_outputs(&outputs, &cfg.output_dir)?;
    if let Some(path) = &cfg.workbook_path {
        write_workbook(&outputs, path)?;
        written.push(path.clone());
    }
    Ok(RunReport { outputs, written })
}

fn build_matches(
    deliveries: &[Delivery],
    metadata: Option<Table>,
    cfg: &PipelineConfig,
) -> PipelineResult<Vec<MatchSummary>> {
    let mut matches = summarize_matches(deliveries);
    if let Some(meta) = metadata {
        apply_match_metadata(
            &mut matches,
            meta,
            &cfg.team_name_map,
            &cfg.placeholder_tokens,
        )?;
    }
    Ok(with_chronological_codes(matches))
}

fn load_metadata(path: Option<&Path>, cfg: &PipelineConfig) -> PipelineResult<Option<Table>> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading match metadata");
            Table::read_csv(path, &cfg.encodings).map(Some)
        }
        None => Ok(None),
    }
}

pub fn run_clean_stage(input: &Path, output: &Path, cfg: &PipelineConfig) -> PipelineResult<CleanReport> {
    let raw = Table::read_csv(input, &cfg.encodings)?;
    let (cleaned, report) = clean_deliveries(raw, &CleanOptions::from(cfg));
    cleaned.write_csv(output)?;
    Ok(report)
}

pub fn run_matches_stage(
    cleaned: &Path,
    metadata: Option<&Path>,
    output: &Path,
    cfg: &PipelineConfig,
) -> PipelineResult<Vec<MatchSummary>> {
    let deliveries = deliveries_from_table(&Table::read_csv(cleaned, &cfg.encodings)?)?;
    let matches = build_matches(&deliveries, load_metadata(metadata, cfg)?, cfg)?;
    write_records(&matches, output)?;
    Ok(matches)
}

/// Join keys are re-derived from the match summary file, so this stage can
/// run on its own after the matches stage.
pub fn run_players_stage(
    cleaned: &Path,
    matches: &Path,
    output: &Path,
    cfg: &PipelineConfig,
) -> PipelineResult<Vec<PlayerMatchEntry>> {
    let deliveries = deliveries_from_table(&Table::read_csv(cleaned, &cfg.encodings)?)?;
    let matches: Vec<MatchSummary> = read_records(matches, &cfg.encodings, MATCH_STAGE)?;
    let rows = aggregate_player_matches(&deliveries, &matches);
    write_records(&rows, output)?;
    Ok(rows)
}

pub fn run_rollups_stage(
    player_matches: &Path,
    matches: &Path,
    out_dir: &Path,
    cfg: &PipelineConfig,
) -> PipelineResult<Vec<PathBuf>> {
    let rows: Vec<PlayerMatchEntry> = read_records(player_matches, &cfg.encodings, PLAYER_STAGE)?;
    let matches: Vec<MatchSummary> = read_records(matches, &cfg.encodings, MATCH_STAGE)?;
    write_rollups(
        &team_season_summaries(&rows),
        &venue_season_summaries(&matches),
        &season_summaries(&matches),
        &team_win_percentages(&matches),
        out_dir,
    )
}

/// Accepts any player-match table whose columns resolve through the
/// player-match aliases, not only this crate's own output.
pub fn run_advanced_stage(
    player_matches: &Path,
    out_dir: &Path,
    cfg: &PipelineConfig,
) -> PipelineResult<(AdvancedStats, Vec<PathBuf>)> {
    let table = Table::read_csv(player_matches, &cfg.encodings)?;
    let stats = compute_advanced(table, &AdvancedOptions::from(cfg));
    let written = write_advanced(&stats, out_dir)?;
    Ok((stats, written))
}
