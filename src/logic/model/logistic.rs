//! Logistic Regression - L2-regularised, full-batch gradient descent
//!
//! Persisted as a plain weight vector + bias. Training has no random
//! component, so the seed is ignored.

use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::classifier::{base_log_odds, check_training_input, sigmoid, Classifier};
use crate::error::{TriageError, TriageResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticParams {
    pub learning_rate: f64,
    pub epochs: usize,
    /// L2 penalty on weights (bias is not penalised)
    pub l2: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.5,
            epochs: 500,
            l2: 1e-3,
        }
    }
}

impl LogisticParams {
    pub fn validate(&self) -> TriageResult<()> {
        if self.epochs == 0 {
            return Err(TriageError::Config("epochs must be positive".into()));
        }
        if !(self.learning_rate > 0.0) || self.l2 < 0.0 {
            return Err(TriageError::Config(format!(
                "invalid logistic params: learning_rate {}, l2 {}",
                self.learning_rate, self.l2
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: Vec<f64>,
    pub bias: f64,
    pub params: LogisticParams,
}

impl Classifier for LogisticModel {
    type Params = LogisticParams;

    fn fit(
        params: &LogisticParams,
        features: ArrayView2<'_, f64>,
        labels: &[u8],
        _seed: u64,
    ) -> TriageResult<Self> {
        check_training_input(features, labels)?;
        params.validate()?;

        let n = features.nrows() as f64;
        let y: Array1<f64> = labels.iter().map(|&l| f64::from(l)).collect();
        let mut w = Array1::<f64>::zeros(features.ncols());
        let mut b = base_log_odds(labels);

        for _ in 0..params.epochs {
            let z = features.dot(&w) + b;
            let residual = z.mapv(sigmoid) - &y;

            let grad_w = features.t().dot(&residual) / n + &w * params.l2;
            let grad_b = residual.sum() / n;

            w.scaled_add(-params.learning_rate, &grad_w);
            b -= params.learning_rate * grad_b;
        }

        log::debug!("Logistic fit: {} weights, bias {:.4}", w.len(), b);

        Ok(Self {
            weights: w.to_vec(),
            bias: b,
            params: params.clone(),
        })
    }

    fn predict_proba(&self, features: ArrayView2<'_, f64>) -> Vec<f64> {
        let w = Array1::from(self.weights.clone());
        features
            .dot(&w)
            .iter()
            .map(|z| sigmoid(z + self.bias))
            .collect()
    }

    fn n_features(&self) -> usize {
        self.weights.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_separable() {
        let x = array![[-2.0, 0.0], [-1.0, 1.0], [1.0, 0.0], [2.0, 1.0]];
        let y = [0, 0, 1, 1];
        let model = LogisticModel::fit(&LogisticParams::default(), x.view(), &y, 0).unwrap();

        let probs = model.predict_proba(x.view());
        assert!(probs[0] < 0.5 && probs[1] < 0.5);
        assert!(probs[2] > 0.5 && probs[3] > 0.5);
        assert!(model.weights[0] > 0.0);
        assert_eq!(model.n_features(), 2);
    }

    #[test]
    fn test_single_class_predicts_low() {
        let x = array![[1.0], [2.0]];
        let model = LogisticModel::fit(&LogisticParams::default(), x.view(), &[0, 0], 0).unwrap();
        assert!(model.predict_proba(x.view()).iter().all(|&p| p < 0.01));
    }

    #[test]
    fn test_deterministic() {
        let x = array![[0.5, 1.0], [1.5, -1.0], [-0.5, 0.3]];
        let y = [1, 0, 1];
        let a = LogisticModel::fit(&LogisticParams::default(), x.view(), &y, 1).unwrap();
        let b = LogisticModel::fit(&LogisticParams::default(), x.view(), &y, 2).unwrap();
        assert_eq!(a, b);
    }
}
