//! One-Hot Encoder - fixed vocabulary per categorical column
//!
//! Values not seen at fit time encode to all zeros for that column.
//! The encoding width is fixed at fit time and never grows.

use serde::{Deserialize, Serialize};

use crate::logic::features::layout::CATEGORICAL_COUNT;
use crate::logic::features::CategoricalRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// Sorted, de-duplicated categories per column
    pub categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    pub fn fit(rows: &[CategoricalRow]) -> Self {
        let categories = (0..CATEGORICAL_COUNT)
            .map(|col| {
                let mut values: Vec<String> = rows.iter().map(|r| r[col].clone()).collect();
                values.sort();
                values.dedup();
                values
            })
            .collect();

        Self { categories }
    }

    /// Total number of output columns
    pub fn width(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    /// Position of `value` within column `col`'s block, if known
    pub fn category_index(&self, col: usize, value: &str) -> Option<usize> {
        self.categories
            .get(col)?
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }

    /// Write the encoded row into `out` (length `width()`, pre-zeroed)
    pub fn encode_into(&self, row: &CategoricalRow, out: &mut [f64]) {
        let mut offset = 0;
        for (col, values) in self.categories.iter().enumerate() {
            if let Some(idx) = row.get(col).and_then(|v| self.category_index(col, v)) {
                out[offset + idx] = 1.0;
            }
            offset += values.len();
        }
    }
}
