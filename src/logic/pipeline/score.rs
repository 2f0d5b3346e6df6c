//! Scoring Pipeline
//!
//! Artifacts are loaded once and shared read-only. "No model" is an explicit
//! `Ok(None)`, never a zero score.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{TriageError, TriageResult};
use crate::logic::alert::AlertTable;
use crate::logic::artifacts::{ArtifactManifest, ArtifactSet, ArtifactStore};
use crate::logic::config::TriageConfig;
use crate::logic::features::engineer;
use crate::logic::model::{DecisionThreshold, TrainedModel};
use crate::logic::transform::FittedTransform;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Row-aligned scores for one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchScores {
    pub predictions: Vec<u8>,
    pub probabilities: Vec<f64>,
}

impl BatchScores {
    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    pub fn threat_count(&self) -> usize {
        self.predictions.iter().filter(|&&p| p == 1).count()
    }
}

/// Everything needed to score; immutable after load
#[derive(Debug)]
pub struct LoadedModel {
    pub manifest: ArtifactManifest,
    pub transform: FittedTransform,
    pub model: TrainedModel,
    pub threshold: DecisionThreshold,
}

impl LoadedModel {
    pub fn from_set(set: ArtifactSet, threshold: DecisionThreshold) -> Self {
        Self {
            manifest: set.manifest,
            transform: set.transform,
            model: set.model,
            threshold,
        }
    }

    /// Score a non-empty table with this model
    pub fn score(&self, table: &AlertTable) -> TriageResult<BatchScores> {
        let bundle = engineer(table, false)?;
        let matrix = self.transform.apply_bundle(&bundle)?;

        if matrix.ncols() != self.model.n_features() {
            return Err(TriageError::TransformMismatch {
                expected: self.model.n_features(),
                actual: matrix.ncols(),
            });
        }

        let probabilities = self.model.predict_proba(matrix.view());
        let predictions = self.threshold.predict(&probabilities);

        Ok(BatchScores { predictions, probabilities })
    }
}

/// Model status for health reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub model_loaded: bool,
    pub run_id: Option<String>,
    pub backend: Option<String>,
    pub feature_width: Option<usize>,
    pub threshold: Option<DecisionThreshold>,
}

// ============================================================================
// SCORER
// ============================================================================

pub struct Scorer {
    store: ArtifactStore,
    configured_threshold: f64,
    loaded: RwLock<Option<Arc<LoadedModel>>>,
}

impl Scorer {
    /// Scorer with nothing loaded yet
    pub fn new(config: &TriageConfig) -> Self {
        Self {
            store: ArtifactStore::new(config.model_dir.clone()),
            configured_threshold: config.decision_threshold,
            loaded: RwLock::new(None),
        }
    }

    /// Build and load artifacts from `config.model_dir`
    pub fn load(config: &TriageConfig) -> Self {
        let scorer = Self::new(config);
        scorer.reload();
        scorer
    }

    /// (Re)load artifacts. Returns whether a model is now available.
    /// Corrupt or inconsistent artifacts are logged and treated as absent.
    pub fn reload(&self) -> bool {
        let loaded = match self.store.load() {
            Ok(Some(set)) => {
                let threshold = DecisionThreshold::resolve(self.store.dir(), self.configured_threshold);
                Some(Arc::new(LoadedModel::from_set(set, threshold)))
            }
            Ok(None) => None,
            Err(e) => {
                log::error!("Failed to load artifacts from {}: {}", self.store.dir().display(), e);
                None
            }
        };

        let available = loaded.is_some();
        *self.loaded.write() = loaded;
        available
    }

    pub fn is_available(&self) -> bool {
        self.loaded.read().is_some()
    }

    /// Current model, if any
    pub fn current(&self) -> Option<Arc<LoadedModel>> {
        self.loaded.read().clone()
    }

    pub fn status(&self) -> ModelStatus {
        match self.current() {
            Some(m) => ModelStatus {
                model_loaded: true,
                run_id: Some(m.manifest.run_id.to_string()),
                backend: Some(m.manifest.backend.clone()),
                feature_width: Some(m.manifest.feature_width),
                threshold: Some(m.threshold),
            },
            None => ModelStatus {
                model_loaded: false,
                run_id: None,
                backend: None,
                feature_width: None,
                threshold: None,
            },
        }
    }

    /// `Ok(None)` when no model is available; `EmptyTable` for an empty table
    pub fn score(&self, table: &AlertTable) -> TriageResult<Option<BatchScores>> {
        if table.is_empty() {
            return Err(TriageError::EmptyTable);
        }

        let Some(loaded) = self.current() else {
            log::warn!("Scoring unavailable: no trained model loaded");
            return Ok(None);
        };

        let scores = loaded.score(table)?;
        log::info!("Scored {} rows: {} threats", scores.len(), scores.threat_count());
        Ok(Some(scores))
    }
}
