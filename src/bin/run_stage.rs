use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use cricket_pipeline::args;
use cricket_pipeline::config::PipelineConfig;
use cricket_pipeline::export::{
    CLEANED_DELIVERIES_FILE, MATCH_SUMMARY_FILE, PLAYER_MATCH_FILE,
};
use cricket_pipeline::pipeline;

const USAGE: &str = "usage: run_stage <clean|matches|players|rollups|advanced> \
[--input PATH] [--output PATH] [--match-summary PATH] [--matches PATH] [--config PATH]";

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    cricket_pipeline::init_logging();

    let Some(stage) = args::positional(0) else {
        bail!("{USAGE}");
    };
    let cfg = PipelineConfig::from_env_and_args()?;
    let out_dir = cfg.output_dir.clone();
    let input = |default: PathBuf| args::path_arg("--input").unwrap_or(default);
    let output = |default: PathBuf| args::path_arg("--output").unwrap_or(default);
    let match_summary =
        args::path_arg("--match-summary").unwrap_or_else(|| out_dir.join(MATCH_SUMMARY_FILE));

    match stage.as_str() {
        "clean" => {
            let src = input(cfg.deliveries_path.clone());
            let dst = output(out_dir.join(CLEANED_DELIVERIES_FILE));
            let report = pipeline::run_clean_stage(&src, &dst, &cfg)
                .with_context(|| format!("clean stage over {}", src.display()))?;
            println!("Clean complete: {}", dst.display());
            println!("Rows: {} in, {} out", report.rows_in, report.rows_out);
            println!("Duplicates removed: {}", report.duplicates_removed);
            println!("Dates unparsed: {}", report.dates_unparsed);
            println!("Numeric values coerced: {}", report.numeric_coerced);
            println!("runs_total repaired: {}", report.runs_total_repaired);
            if !report.dropped_columns.is_empty() {
                println!("Dropped columns: {}", report.dropped_columns.join(", "));
            }
        }
        "matches" => {
            let src = input(out_dir.join(CLEANED_DELIVERIES_FILE));
            let dst = output(match_summary);
            let matches =
                pipeline::run_matches_stage(&src, cfg.matches_path.as_deref(), &dst, &cfg)
                    .with_context(|| format!("matches stage over {}", src.display()))?;
            let uncoded = matches.iter().filter(|m| m.match_code.is_none()).count();
            println!("Matches complete: {}", dst.display());
            println!("Matches: {} ({} without a chronological code)", matches.len(), uncoded);
        }
        "players" => {
            let src = input(out_dir.join(CLEANED_DELIVERIES_FILE));
            let dst = output(out_dir.join(PLAYER_MATCH_FILE));
            let rows = pipeline::run_players_stage(&src, &match_summary, &dst, &cfg)
                .with_context(|| format!("players stage over {}", src.display()))?;
            println!("Players complete: {}", dst.display());
            println!("Player-match rows: {}", rows.len());
        }
        "rollups" => {
            let src = input(out_dir.join(PLAYER_MATCH_FILE));
            let dst = output(out_dir.clone());
            let written = pipeline::run_rollups_stage(&src, &match_summary, &dst, &cfg)
                .with_context(|| format!("rollups stage over {}", src.display()))?;
            println!("Rollups complete");
            for path in written {
                println!("  {}", path.display());
            }
        }
        "advanced" => {
            let src = input(out_dir.join(PLAYER_MATCH_FILE));
            let dst = output(cfg.advanced_dir());
            let (stats, written) = pipeline::run_advanced_stage(&src, &dst, &cfg)
                .with_context(|| format!("advanced stage over {}", src.display()))?;
            println!("Advanced complete: {}", dst.display());
            for path in written {
                println!("  {}", path.display());
            }
            if !stats.skipped.is_empty() {
                println!("Skipped: {}", stats.skipped.join(", "));
            }
        }
        other => bail!("unknown stage `{other}`\n{USAGE}"),
    }

    Ok(())
}
