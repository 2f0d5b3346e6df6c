//! Error handling
//!
//! One taxonomy for the whole pipeline. A missing model is NOT an error:
//! loaders and the scorer return `Ok(None)` for that case.

use thiserror::Error;

pub type TriageResult<T> = Result<T, TriageError>;

#[derive(Debug, Error)]
pub enum TriageError {
    // Data errors
    #[error("Alert table is empty")]
    EmptyTable,

    #[error("Required column missing: {0}")]
    MissingColumn(String),

    #[error("Invalid label at row {row}: {value}")]
    InvalidLabel { row: usize, value: String },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    // Artifact errors
    #[error("Transform mismatch: model expects {expected} features, transform produced {actual}")]
    TransformMismatch { expected: usize, actual: usize },

    #[error(
        "Feature layout mismatch: expected v{expected_version} ({expected_hash:08x}), got v{actual_version} ({actual_hash:08x})"
    )]
    LayoutMismatch {
        expected_version: u8,
        expected_hash: u32,
        actual_version: u8,
        actual_hash: u32,
    },

    #[error("Artifact error: {0}")]
    Artifact(String),

    // Generic errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TriageError {
    /// Malformed or incomplete input data, as opposed to storage/config failures
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            TriageError::EmptyTable
                | TriageError::MissingColumn(_)
                | TriageError::InvalidLabel { .. }
                | TriageError::MalformedInput(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_error_family() {
        assert!(TriageError::EmptyTable.is_data_error());
        assert!(TriageError::MissingColumn("is_threat".into()).is_data_error());
        assert!(!TriageError::Artifact("bad checksum".into()).is_data_error());
        assert!(!TriageError::TransformMismatch { expected: 3, actual: 4 }.is_data_error());
    }

    #[test]
    fn test_display() {
        let err = TriageError::MissingColumn("timestamp".into());
        assert_eq!(err.to_string(), "Required column missing: timestamp");
    }
}
