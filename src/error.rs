// Error type shared by the chart builders, the profiler and the backend

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("All input sequences must have the same length ({details})")]
    LengthMismatch { details: String },

    #[error("Cannot create {0} with no data")]
    EmptyData(&'static str),

    #[error("The provided table is empty")]
    EmptyTable,

    #[error("The table must have at least {required} columns (found {found})")]
    NotEnoughColumns { required: usize, found: usize },

    #[error("'{0}' is not a supported chart type")]
    UnknownChart(String),

    #[error("Invalid mode '{given}'. Use {expected}")]
    UnknownMode { given: String, expected: &'static str },

    #[error("Column '{name}' not found. Available columns: {available}")]
    ColumnNotFound { name: String, available: String },

    #[error("Column '{name}' must be {expected}")]
    ColumnType { name: String, expected: &'static str },

    #[error("Render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChartError>;

/// Fail unless every named sequence has the same length.
pub fn ensure_same_len(lengths: &[(&str, usize)]) -> Result<()> {
    let Some((_, first)) = lengths.first() else {
        return Ok(());
    };
    if lengths.iter().all(|(_, len)| len == first) {
        return Ok(());
    }
    let details = lengths
        .iter()
        .map(|(name, len)| format!("{}: {}", name, len))
        .collect::<Vec<_>>()
        .join(", ");
    Err(ChartError::LengthMismatch { details })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_same_len_ok() {
        assert!(ensure_same_len(&[("categories", 3), ("values", 3)]).is_ok());
        assert!(ensure_same_len(&[]).is_ok());
    }

    #[test]
    fn test_ensure_same_len_mismatch_message() {
        let err = ensure_same_len(&[("categories", 3), ("values", 2)]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("same length"));
        assert!(msg.contains("categories: 3"));
        assert!(msg.contains("values: 2"));
    }
}
