//! Classifier Interface - backend selection + persisted model
//!
//! Backends are chosen by configuration, never by runtime type checks.
//! `TrainedModel` is what gets written to `model.json`.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use super::boosting::{BoostedTrees, BoostingParams};
use super::logistic::{LogisticModel, LogisticParams};
use crate::error::{TriageError, TriageResult};

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Binary classifier over a dense feature matrix
pub trait Classifier: Sized {
    type Params;

    /// Fit on `features` (rows × columns) and labels in {0, 1}.
    /// Deterministic for a fixed `seed`.
    fn fit(
        params: &Self::Params,
        features: ArrayView2<'_, f64>,
        labels: &[u8],
        seed: u64,
    ) -> TriageResult<Self>;

    /// Probability of the positive class, one per row
    fn predict_proba(&self, features: ArrayView2<'_, f64>) -> Vec<f64>;

    /// Column count the model was fit on
    fn n_features(&self) -> usize;
}

/// Numerically stable logistic function
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let ez = z.exp();
        ez / (1.0 + ez)
    }
}

/// Log-odds of the positive rate, clamped away from 0 and 1
pub fn base_log_odds(labels: &[u8]) -> f64 {
    let positives = labels.iter().filter(|&&y| y == 1).count() as f64;
    let rate = (positives / labels.len().max(1) as f64).clamp(1e-6, 1.0 - 1e-6);
    (rate / (1.0 - rate)).ln()
}

/// Shared input checks for every backend
pub fn check_training_input(features: ArrayView2<'_, f64>, labels: &[u8]) -> TriageResult<()> {
    if features.nrows() == 0 {
        return Err(TriageError::EmptyTable);
    }
    if features.nrows() != labels.len() {
        return Err(TriageError::MalformedInput(format!(
            "{} feature rows but {} labels",
            features.nrows(),
            labels.len()
        )));
    }
    if let Some((row, value)) = labels.iter().enumerate().find(|(_, &y)| y > 1) {
        return Err(TriageError::InvalidLabel { row, value: value.to_string() });
    }
    Ok(())
}

// ============================================================================
// BACKEND CONFIG
// ============================================================================

/// Which classifier to train, with its hyper-parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    BoostedTrees(BoostingParams),
    Logistic(LogisticParams),
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::BoostedTrees(BoostingParams::default())
    }
}

impl BackendConfig {
    /// Backend by name with default parameters
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "boosted_trees" | "xgboost" | "gbt" => Some(BackendConfig::BoostedTrees(BoostingParams::default())),
            "logistic" | "logreg" => Some(BackendConfig::Logistic(LogisticParams::default())),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BackendConfig::BoostedTrees(_) => "boosted_trees",
            BackendConfig::Logistic(_) => "logistic",
        }
    }

    pub fn validate(&self) -> TriageResult<()> {
        match self {
            BackendConfig::BoostedTrees(p) => p.validate(),
            BackendConfig::Logistic(p) => p.validate(),
        }
    }
}

// ============================================================================
// TRAINED MODEL
// ============================================================================

/// A fitted classifier of any backend; immutable once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainedModel {
    BoostedTrees(BoostedTrees),
    Logistic(LogisticModel),
}

impl TrainedModel {
    pub fn fit(
        backend: &BackendConfig,
        features: ArrayView2<'_, f64>,
        labels: &[u8],
        seed: u64,
    ) -> TriageResult<Self> {
        let model = match backend {
            BackendConfig::BoostedTrees(params) => {
                TrainedModel::BoostedTrees(BoostedTrees::fit(params, features, labels, seed)?)
            }
            BackendConfig::Logistic(params) => {
                TrainedModel::Logistic(LogisticModel::fit(params, features, labels, seed)?)
            }
        };
        Ok(model)
    }

    pub fn predict_proba(&self, features: ArrayView2<'_, f64>) -> Vec<f64> {
        match self {
            TrainedModel::BoostedTrees(m) => m.predict_proba(features),
            TrainedModel::Logistic(m) => m.predict_proba(features),
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            TrainedModel::BoostedTrees(m) => m.n_features(),
            TrainedModel::Logistic(m) => m.n_features(),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            TrainedModel::BoostedTrees(_) => "boosted_trees",
            TrainedModel::Logistic(_) => "logistic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_backend_from_name() {
        assert_eq!(BackendConfig::from_name("xgboost").map(|b| b.name()), Some("boosted_trees"));
        assert_eq!(BackendConfig::from_name(" Logistic ").map(|b| b.name()), Some("logistic"));
        assert!(BackendConfig::from_name("svm").is_none());
    }

    #[test]
    fn test_backend_config_json() {
        let backend: BackendConfig =
            serde_json::from_str(r#"{"kind": "boosted_trees", "n_trees": 50}"#).unwrap();
        match backend {
            BackendConfig::BoostedTrees(p) => {
                assert_eq!(p.n_trees, 50);
                assert_eq!(p.max_depth, 6);
            }
            other => panic!("unexpected backend {:?}", other),
        }
    }

    #[test]
    fn test_trained_model_round_trip() {
        let x = array![[0.0], [1.0], [0.0], [1.0]];
        let backend = BackendConfig::Logistic(LogisticParams::default());
        let model = TrainedModel::fit(&backend, x.view(), &[0, 1, 0, 1], 42).unwrap();

        let json = serde_json::to_string(&model).unwrap();
        assert!(json.contains(r#""kind":"logistic""#));
        let restored: TrainedModel = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.predict_proba(x.view()), model.predict_proba(x.view()));
        assert_eq!(restored.n_features(), 1);
    }

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(40.0) > 0.999_999);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!((base_log_odds(&[0, 1])).abs() < 1e-12);
    }
}
