use crate::error::{PipelineError, PipelineResult};

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn ratio(num: f64, den: f64, metric: &'static str) -> PipelineResult<f64> {
    if den == 0.0 {
        return Err(PipelineError::DivisionUndefined { metric });
    }
    Ok(num / den)
}

/// Runs per 100 balls faced; 0 when no balls were faced.
pub fn strike_rate(runs: u32, balls: u32) -> f64 {
    ratio(runs as f64, balls as f64, "strike_rate")
        .map(|r| round2(r * 100.0))
        .unwrap_or(0.0)
}

/// Runs per dismissal; a not-out innings reports its raw runs.
pub fn batting_average(runs: u32, outs: u32) -> f64 {
    ratio(runs as f64, outs as f64, "batting_average")
        .map(round2)
        .unwrap_or(runs as f64)
}

/// Runs conceded per six balls; 0 when nothing was bowled.
pub fn bowling_economy(runs_conceded: u32, balls_bowled: u32) -> f64 {
    ratio(runs_conceded as f64, balls_bowled as f64, "bowling_economy")
        .map(|r| round2(r * 6.0))
        .unwrap_or(0.0)
}

/// Runs conceded per wicket; without a wicket the raw runs conceded.
pub fn bowling_average(runs_conceded: u32, wickets: u32) -> f64 {
    ratio(runs_conceded as f64, wickets as f64, "bowling_average")
        .map(round2)
        .unwrap_or(runs_conceded as f64)
}

/// Runs per over, `None` when no legal balls were bowled.
pub fn runs_per_over(runs: f64, balls: f64) -> Option<f64> {
    ratio(runs, balls / 6.0, "runs_per_over").ok()
}

pub fn percentage(part: u32, whole: u32) -> f64 {
    ratio(part as f64, whole as f64, "percentage")
        .map(|r| round2(r * 100.0))
        .unwrap_or(0.0)
}
