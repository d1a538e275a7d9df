pub mod advanced;
pub mod aliases;
pub mod args;
pub mod clean;
pub mod config;
pub mod delivery;
pub mod error;
pub mod export;
pub mod inspect;
pub mod match_code;
pub mod match_summary;
pub mod metrics;
pub mod pipeline;
pub mod player_match;
pub mod rollup;
pub mod table;

pub use error::{PipelineError, PipelineResult};

/// `RUST_LOG` filter, `info` when unset. Safe to call more than once.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
