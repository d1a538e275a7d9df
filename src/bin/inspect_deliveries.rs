use anyhow::{Context, Result};

use cricket_pipeline::args;
use cricket_pipeline::clean::{CleanOptions, clean_deliveries};
use cricket_pipeline::config::PipelineConfig;
use cricket_pipeline::inspect::profile_table;
use cricket_pipeline::table::Table;

const DEFAULT_TOP: usize = 10;

/// Profiles the raw delivery file, or the cleaned view of it with `--cleaned`.
fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    cricket_pipeline::init_logging();

    let cfg = PipelineConfig::from_env_and_args()?;
    let path = args::path_arg("--input").unwrap_or_else(|| cfg.deliveries_path.clone());
    let top = args::usize_arg("--top").unwrap_or(DEFAULT_TOP);

    let mut table = Table::read_csv(&path, &cfg.encodings)
        .with_context(|| format!("load {}", path.display()))?;
    let label = if args::has_flag("--cleaned") {
        let (cleaned, report) = clean_deliveries(table, &CleanOptions::from(&cfg));
        table = cleaned;
        format!("cleaned ({} duplicates removed)", report.duplicates_removed)
    } else {
        "raw".to_string()
    };

    println!("Dataset: {} [{label}]", path.display());
    print!("{}", profile_table(&table, top));
    Ok(())
}
