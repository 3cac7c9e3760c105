use thiserror::Error;

/// Everything that can go wrong while building a detector or running it.
///
/// Failures from the file and table layers (`io`, `csv`, `serde_json`,
/// `arrow`, `parquet`) are carried through unchanged.
#[derive(Debug, Error)]
pub enum FaultError {
    #[error("unsupported data source type: {0}")]
    UnsupportedSource(String),

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("row {row} has {got} values, expected {expected}")]
    ShapeMismatch {
        row: usize,
        got: usize,
        expected: usize,
    },

    #[error("column '{column}' has {got} values but '{reference}' has {expected}")]
    RaggedColumns {
        column: String,
        got: usize,
        reference: String,
        expected: usize,
    },

    #[error("row {row}, column '{column}': '{value}' is not a number")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("column '{column}' has unsupported type {data_type}")]
    UnsupportedColumnType { column: String, data_type: String },

    #[error("invalid model artifact: {0}")]
    InvalidModel(String),

    #[error("prediction {index} is not finite ({value})")]
    NonFinitePrediction { index: usize, value: f64 },

    #[error("model returned {got} predictions for {expected} rows")]
    PredictionCountMismatch { got: usize, expected: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
}

pub type Result<T> = std::result::Result<T, FaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_lists_each_name() {
        let err = FaultError::MissingColumns(vec!["vp2".into(), "vp3".into()]);
        assert_eq!(err.to_string(), "missing required columns: vp2, vp3");
    }

    #[test]
    fn io_errors_pass_through_unchanged() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: FaultError = io.into();
        assert_eq!(err.to_string(), "no such file");
    }
}
