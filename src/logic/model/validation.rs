//! Cross-Validation - stratified k-fold diagnostics
//!
//! Diagnostic only: results are logged and reported, they never gate training.

use ndarray::{ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::classifier::{BackendConfig, TrainedModel};
use crate::error::TriageResult;

// ============================================================================
// METRICS
// ============================================================================

/// Mean and population standard deviation over folds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub std: f64,
}

impl MetricSummary {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self { mean: 0.0, std: 0.0 };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self { mean, std: variance.sqrt() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvReport {
    pub folds: usize,
    pub accuracy: MetricSummary,
    pub f1: MetricSummary,
}

pub fn accuracy(truth: &[u8], predicted: &[u8]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    correct as f64 / truth.len() as f64
}

/// F1 of the positive class; 0 when precision + recall is undefined
pub fn f1_score(truth: &[u8], predicted: &[u8]) -> f64 {
    let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
    for (&t, &p) in truth.iter().zip(predicted) {
        match (t, p) {
            (1, 1) => tp += 1,
            (0, 1) => fp += 1,
            (1, 0) => fn_ += 1,
            _ => {}
        }
    }
    let denom = 2 * tp + fp + fn_;
    if denom == 0 { 0.0 } else { (2 * tp) as f64 / denom as f64 }
}

// ============================================================================
// FOLDS
// ============================================================================

/// Number of usable folds: min(requested, minority class count).
/// None when there are fewer than 2 classes or fewer than 2 folds.
pub fn effective_folds(labels: &[u8], requested: usize) -> Option<usize> {
    let positives = labels.iter().filter(|&&y| y == 1).count();
    let negatives = labels.len() - positives;
    let k = requested.min(positives).min(negatives);
    (k >= 2).then_some(k)
}

/// Test-row indices per fold. Each class is shuffled with `seed` and
/// dealt round-robin, so every fold holds both classes.
pub fn stratified_folds(labels: &[u8], k: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut folds = vec![Vec::new(); k];

    for class in [0u8, 1u8] {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &y)| y == class)
            .map(|(i, _)| i)
            .collect();
        members.shuffle(&mut rng);
        for (i, row) in members.into_iter().enumerate() {
            folds[i % k].push(row);
        }
    }

    for fold in folds.iter_mut() {
        fold.sort_unstable();
    }
    folds
}

// ============================================================================
// CROSS-VALIDATE
// ============================================================================

/// Run stratified k-fold CV. `Ok(None)` when the labels cannot be validated
/// (single class or too few minority rows).
pub fn cross_validate(
    backend: &BackendConfig,
    features: ArrayView2<'_, f64>,
    labels: &[u8],
    requested_folds: usize,
    seed: u64,
    threshold: f64,
) -> TriageResult<Option<CvReport>> {
    let Some(k) = effective_folds(labels, requested_folds) else {
        log::warn!("Only one class (or too few minority rows) in labels, skipping cross-validation");
        return Ok(None);
    };
    if k < requested_folds {
        log::warn!("Reducing CV folds from {} to {} (minority class size)", requested_folds, k);
    }

    let folds = stratified_folds(labels, k, seed);
    let mut accuracies = Vec::with_capacity(k);
    let mut f1s = Vec::with_capacity(k);

    for (fold_idx, test_rows) in folds.iter().enumerate() {
        let mut in_test = vec![false; labels.len()];
        for &r in test_rows {
            in_test[r] = true;
        }
        let train_rows: Vec<usize> = (0..labels.len()).filter(|&r| !in_test[r]).collect();

        let x_train = features.select(Axis(0), &train_rows);
        let y_train: Vec<u8> = train_rows.iter().map(|&r| labels[r]).collect();
        let x_test = features.select(Axis(0), test_rows);
        let y_test: Vec<u8> = test_rows.iter().map(|&r| labels[r]).collect();

        let model = TrainedModel::fit(backend, x_train.view(), &y_train, seed)?;
        let predicted: Vec<u8> = model
            .predict_proba(x_test.view())
            .into_iter()
            .map(|p| u8::from(p >= threshold))
            .collect();

        let acc = accuracy(&y_test, &predicted);
        let f1 = f1_score(&y_test, &predicted);
        log::debug!("CV fold {}/{}: accuracy {:.4}, f1 {:.4}", fold_idx + 1, k, acc, f1);
        accuracies.push(acc);
        f1s.push(f1);
    }

    let report = CvReport {
        folds: k,
        accuracy: MetricSummary::from_values(&accuracies),
        f1: MetricSummary::from_values(&f1s),
    };

    log::info!(
        "CV ({} folds): accuracy {:.4} ± {:.4}, f1 {:.4} ± {:.4}",
        report.folds,
        report.accuracy.mean,
        report.accuracy.std,
        report.f1.mean,
        report.f1.std
    );

    Ok(Some(report))
}
