//! Feature Bundle - co-indexed numeric / categorical / text blocks
//!
//! Every block has exactly one entry per input row, in input order.

use serde::{Deserialize, Serialize};

use super::layout::{CATEGORICAL_COLUMNS, CATEGORICAL_COUNT, NUMERIC_COLUMNS, NUMERIC_COUNT};

/// Numeric features of one row, ordered as `NUMERIC_COLUMNS`
pub type NumericRow = [f64; NUMERIC_COUNT];

/// Categorical features of one row, ordered as `CATEGORICAL_COLUMNS`
pub type CategoricalRow = [String; CATEGORICAL_COUNT];

/// Output of feature engineering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureBundle {
    pub numeric: Vec<NumericRow>,
    pub categorical: Vec<CategoricalRow>,
    pub text: Vec<String>,
    /// Present only in training mode
    pub labels: Option<Vec<u8>>,
}

impl FeatureBundle {
    pub fn with_capacity(rows: usize) -> Self {
        Self {
            numeric: Vec::with_capacity(rows),
            categorical: Vec::with_capacity(rows),
            text: Vec::with_capacity(rows),
            labels: None,
        }
    }

    pub fn len(&self) -> usize {
        self.numeric.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numeric.is_empty()
    }

    /// True when no row carries any text
    pub fn text_is_blank(&self) -> bool {
        self.text.iter().all(|t| t.trim().is_empty())
    }

    /// JSON view of one row for debug logging
    pub fn row_log_entry(&self, row: usize) -> Option<serde_json::Value> {
        let numeric = self.numeric.get(row)?;
        let categorical = self.categorical.get(row)?;
        Some(serde_json::json!({
            "numeric": NUMERIC_COLUMNS.iter()
                .zip(numeric.iter())
                .map(|(name, value)| (name.to_string(), *value))
                .collect::<std::collections::BTreeMap<_, _>>(),
            "categorical": CATEGORICAL_COLUMNS.iter()
                .zip(categorical.iter())
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect::<std::collections::BTreeMap<_, _>>(),
            "text": self.text.get(row),
            "label": self.labels.as_ref().and_then(|l| l.get(row)),
        }))
    }
}
