use std::path::PathBuf;

use thiserror::Error;

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input file missing, unreadable, or not decodable under any configured encoding.
    #[error("failed to load {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    /// A column a stage depends on is absent from its input table.
    #[error("{stage}: required column `{column}` is missing")]
    Schema { stage: &'static str, column: String },

    /// A value failed type coercion. Callers recover with the column's fallback.
    #[error("cannot parse `{value}` as {expected}")]
    Parse { value: String, expected: &'static str },

    #[error("season label `{0}` has no parseable start year")]
    SeasonParse(String),

    /// Denominator of a derived metric is zero. Callers recover with the metric's fallback.
    #[error("{metric} is undefined for a zero denominator")]
    DivisionUndefined { metric: &'static str },

    /// A stage table read back from disk holds a row that does not decode.
    #[error("{stage}: row {row} does not decode: {reason}")]
    Decode {
        stage: &'static str,
        row: usize,
        reason: String,
    },

    #[error("failed to write {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },
}

impl PipelineError {
    pub fn schema(stage: &'static str, column: impl Into<String>) -> Self {
        Self::Schema {
            stage,
            column: column.into(),
        }
    }

    pub fn load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Load {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Write {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Fatal errors abort the run; the rest are recovered where they are raised.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::Parse { .. } | Self::SeasonParse(_) | Self::DivisionUndefined { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::PipelineError;

    #[test]
    fn schema_error_names_stage_and_column() {
        let err = PipelineError::schema("rollup", "season");
        assert_eq!(err.to_string(), "rollup: required column `season` is missing");
        assert!(err.is_fatal());
    }

    #[test]
    fn recoverable_errors_are_not_fatal() {
        assert!(!PipelineError::SeasonParse("abc".into()).is_fatal());
        assert!(!PipelineError::DivisionUndefined { metric: "economy" }.is_fatal());
    }
}
