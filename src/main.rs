use anyhow::{Context, Result};

use cricket_pipeline::config::PipelineConfig;
use cricket_pipeline::pipeline;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    cricket_pipeline::init_logging();

    let cfg = PipelineConfig::from_env_and_args()?;
    let report = pipeline::run(&cfg)
        .with_context(|| format!("pipeline run over {}", cfg.deliveries_path.display()))?;
    let out = &report.outputs;

    println!("Pipeline complete");
    println!("Input: {}", cfg.deliveries_path.display());
    println!(
        "Deliveries: {} in, {} out ({} duplicates removed)",
        out.clean_report.rows_in, out.clean_report.rows_out, out.clean_report.duplicates_removed
    );
    println!("Matches: {}", out.matches.len());
    println!("Player-match rows: {}", out.player_matches.len());
    println!(
        "Roll-ups: team-season={} venue-season={} seasons={} team-win={}",
        out.team_seasons.len(),
        out.venue_seasons.len(),
        out.seasons.len(),
        out.team_win_pct.len()
    );
    if !out.advanced.skipped.is_empty() {
        println!("Advanced stats skipped: {}", out.advanced.skipped.join(", "));
    }
    println!("Files written: {}", report.written.len());
    for path in &report.written {
        println!("  {}", path.display());
    }

    Ok(())
}
