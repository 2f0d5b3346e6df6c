//! Standard Scaler - zero mean, unit variance per numeric column
//!
//! Statistics are learned once at fit time and never recomputed on apply.

use serde::{Deserialize, Serialize};

use crate::logic::features::layout::NUMERIC_COUNT;
use crate::logic::features::NumericRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: [f64; NUMERIC_COUNT],
    /// Population std; constant columns keep scale 1
    pub scale: [f64; NUMERIC_COUNT],
    pub samples: usize,
}

impl StandardScaler {
    pub fn fit(rows: &[NumericRow]) -> Self {
        let n = rows.len().max(1) as f64;
        let mut mean = [0.0; NUMERIC_COUNT];
        let mut variance = [0.0; NUMERIC_COUNT];

        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in mean.iter_mut() {
            *m /= n;
        }

        for row in rows {
            for i in 0..NUMERIC_COUNT {
                variance[i] += (row[i] - mean[i]).powi(2);
            }
        }

        let scale = variance.map(|v| {
            let std = (v / n).sqrt();
            if std > f64::EPSILON { std } else { 1.0 }
        });

        Self { mean, scale, samples: rows.len() }
    }

    /// Write the standardized row into `out` (length NUMERIC_COUNT)
    pub fn transform_into(&self, row: &NumericRow, out: &mut [f64]) {
        for i in 0..NUMERIC_COUNT {
            out[i] = (row[i] - self.mean[i]) / self.scale[i];
        }
    }

    pub fn width(&self) -> usize {
        NUMERIC_COUNT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_statistics() {
        let rows = vec![[0.0, 1.0, 2.0], [2.0, 1.0, 4.0]];
        let scaler = StandardScaler::fit(&rows);

        assert_eq!(scaler.mean, [1.0, 1.0, 3.0]);
        assert_eq!(scaler.scale, [1.0, 1.0, 1.0]);
        assert_eq!(scaler.samples, 2);

        let mut out = [0.0; 3];
        scaler.transform_into(&rows[0], &mut out);
        assert_eq!(out, [-1.0, 0.0, -1.0]);
    }

    #[test]
    fn test_apply_uses_stored_statistics() {
        let scaler = StandardScaler::fit(&[[0.0, 0.0, 0.0], [4.0, 0.0, 10.0]]);

        let mut out = [0.0; 3];
        scaler.transform_into(&[6.0, 5.0, 5.0], &mut out);
        // mean 2, std 2 for column 0
        assert_eq!(out[0], 2.0);
        // constant column: scale 1
        assert_eq!(out[1], 5.0);
        assert_eq!(out[2], 0.0);
    }
}
