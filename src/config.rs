use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::args;

pub const DEFAULT_MIN_BALLS: u32 = 100;
pub const DEFAULT_TOP_N: usize = 10;

pub const DEFAULT_PLACEHOLDER_TOKENS: &[&str] = &["NA", "NaN", "None", "none", "Unknown"];

pub const DEFAULT_NUMERIC_COLUMNS: &[&str] = &[
    "innings",
    "over",
    "ball",
    "ball_no",
    "runs_batter",
    "balls_faced",
    "runs_extras",
    "runs_total",
    "runs_bowler",
    "balls_per_over",
    "team_runs",
    "team_balls",
    "team_wicket",
];

pub const DEFAULT_DROPPED_COLUMNS: &[&str] = &[
    "Unnamed: 0",
    "review_batter",
    "team_reviewed",
    "review_decision",
    "umpire",
    "umpires_call",
    "method",
    "superover_winner",
    "result_type",
    "fielders",
    "new_batter",
    "next_batter",
];

/// Franchise renames folded onto one canonical name per side.
pub static DEFAULT_TEAM_NAMES: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        ("Delhi Daredevils", "Delhi Capitals"),
        ("Royal Challengers Bengaluru", "Royal Challengers Bangalore"),
        ("Royal Challengers Banglore", "Royal Challengers Bangalore"),
        ("RCB", "Royal Challengers Bangalore"),
        ("Kings XI Punjab", "Punjab Kings"),
        ("Punjab Kinks", "Punjab Kings"),
        ("Punjab", "Punjab Kings"),
    ])
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub deliveries_path: PathBuf,
    pub matches_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub workbook_path: Option<PathBuf>,
    /// Tried in order; the first label that decodes the file cleanly wins.
    pub encodings: Vec<String>,
    pub placeholder_tokens: Vec<String>,
    pub date_column: String,
    pub numeric_columns: Vec<String>,
    pub dropped_columns: Vec<String>,
    pub team_name_map: BTreeMap<String, String>,
    pub min_balls: u32,
    pub top_n: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            deliveries_path: PathBuf::from("data/matches.csv"),
            matches_path: None,
            output_dir: PathBuf::from("data/out"),
            workbook_path: None,
            encodings: vec!["utf-8".to_string(), "windows-1252".to_string()],
            placeholder_tokens: to_strings(DEFAULT_PLACEHOLDER_TOKENS),
            date_column: "date".to_string(),
            numeric_columns: to_strings(DEFAULT_NUMERIC_COLUMNS),
            dropped_columns: to_strings(DEFAULT_DROPPED_COLUMNS),
            team_name_map: DEFAULT_TEAM_NAMES
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            min_balls: DEFAULT_MIN_BALLS,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read pipeline config {}", path.display()))?;
        serde_json::from_str::<Self>(&raw)
            .with_context(|| format!("parse pipeline config {}", path.display()))
    }

    /// Defaults, then the optional JSON file named by `CRICKET_CONFIG`, then env overrides.
    pub fn from_env() -> Result<Self> {
        let mut cfg = match env_path("CRICKET_CONFIG") {
            Some(path) => Self::from_json_file(&path)?,
            None => Self::default(),
        };
        cfg.apply_env();
        Ok(cfg)
    }

    /// Binary resolution order: defaults, JSON file (`--config` wins over
    /// `CRICKET_CONFIG`), environment, then command-line flags.
    pub fn from_env_and_args() -> Result<Self> {
        let mut cfg = match args::path_arg("--config").or_else(|| env_path("CRICKET_CONFIG")) {
            Some(path) => Self::from_json_file(&path)?,
            None => Self::default(),
        };
        cfg.apply_env();
        cfg.apply_args();
        Ok(cfg)
    }

    pub fn apply_args(&mut self) {
        if let Some(path) = args::path_arg("--deliveries") {
            self.deliveries_path = path;
        }
        if let Some(path) = args::path_arg("--matches") {
            self.matches_path = Some(path);
        }
        if let Some(path) = args::path_arg("--out") {
            self.output_dir = path;
        }
        if let Some(path) = args::path_arg("--workbook") {
            self.workbook_path = Some(path);
        }
        if let Some(n) = args::u32_arg("--min-balls") {
            self.min_balls = n;
        }
        if let Some(n) = args::usize_arg("--top-n") {
            self.top_n = n.max(1);
        }
    }

    pub fn apply_env(&mut self) {
        if let Some(path) = env_path("CRICKET_DELIVERIES_PATH") {
            self.deliveries_path = path;
        }
        if let Some(path) = env_path("CRICKET_MATCHES_PATH") {
            self.matches_path = Some(path);
        }
        if let Some(path) = env_path("CRICKET_OUTPUT_DIR") {
            self.output_dir = path;
        }
        if let Some(path) = env_path("CRICKET_WORKBOOK_PATH") {
            self.workbook_path = Some(path);
        }
        if let Some(n) = env_parse::<u32>("CRICKET_MIN_BALLS") {
            self.min_balls = n;
        }
        if let Some(n) = env_parse::<usize>("CRICKET_TOP_N") {
            self.top_n = n.max(1);
        }
    }

    pub fn advanced_dir(&self) -> PathBuf {
        self.output_dir.join(crate::export::ADVANCED_DIR)
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    let raw = env::var(key).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(PathBuf::from(trimmed))
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok()?.trim().parse::<T>().ok()
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
