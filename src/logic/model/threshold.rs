//! Decision Threshold Configuration
//!
//! Quản lý ngưỡng quyết định threat / benign.
//! Configured value, optionally overridden by a `threshold.json` sidecar
//! stored next to the trained model.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DECISION_THRESHOLD, THRESHOLD_FILE};
use crate::error::TriageResult;

/// Where the active threshold came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdSource {
    Config,
    Sidecar,
}

/// On-disk sidecar format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdFile {
    pub threshold: f64,
}

/// Active decision threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionThreshold {
    /// Probability at or above which a row is a threat (0.0 - 1.0)
    pub value: f64,
    pub source: ThresholdSource,
}

impl Default for DecisionThreshold {
    fn default() -> Self {
        Self::new(DEFAULT_DECISION_THRESHOLD)
    }
}

impl DecisionThreshold {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            source: ThresholdSource::Config,
        }
    }

    /// Configured value unless a valid sidecar exists in `model_dir`
    pub fn resolve(model_dir: &Path, configured: f64) -> Self {
        match load_sidecar(model_dir) {
            Some(value) => {
                log::info!("Using stored decision threshold {:.3}", value);
                Self { value, source: ThresholdSource::Sidecar }
            }
            None => Self::new(configured),
        }
    }

    /// Check if probability crosses the threshold
    pub fn is_threat(&self, probability: f64) -> bool {
        probability >= self.value
    }

    pub fn predict(&self, probabilities: &[f64]) -> Vec<u8> {
        probabilities.iter().map(|&p| u8::from(self.is_threat(p))).collect()
    }
}

pub fn is_valid_threshold(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

/// Read the sidecar; None when missing, unreadable or out of range
pub fn load_sidecar(model_dir: &Path) -> Option<f64> {
    let path = model_dir.join(THRESHOLD_FILE);
    if !path.exists() {
        return None;
    }

    let parsed = std::fs::read(&path)
        .map_err(|e| e.to_string())
        .and_then(|data| serde_json::from_slice::<ThresholdFile>(&data).map_err(|e| e.to_string()));

    match parsed {
        Ok(file) if is_valid_threshold(file.threshold) => Some(file.threshold),
        Ok(file) => {
            log::warn!(
                "Ignoring stored threshold {} (must be within [0, 1]), keeping configured value",
                file.threshold
            );
            None
        }
        Err(e) => {
            log::warn!("Failed to read {}: {}", path.display(), e);
            None
        }
    }
}

pub fn save_sidecar(model_dir: &Path, value: f64) -> TriageResult<()> {
    std::fs::create_dir_all(model_dir)?;
    let data = serde_json::to_vec_pretty(&ThresholdFile { threshold: value })?;
    std::fs::write(model_dir.join(THRESHOLD_FILE), data)?;
    Ok(())
}
