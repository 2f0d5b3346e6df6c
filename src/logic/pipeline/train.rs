//! Training Pipeline
//!
//! table → auto-label → engineer → fit transform → CV (diagnostic) → final fit.
//! Everything is built in memory; artifacts are written only after the whole
//! run succeeded.

use serde::{Deserialize, Serialize};

use crate::error::{TriageError, TriageResult};
use crate::logic::alert::AlertTable;
use crate::logic::artifacts::{ArtifactManifest, ArtifactStore};
use crate::logic::config::TriageConfig;
use crate::logic::features::engineer;
use crate::logic::features::layout::{LABEL_COLUMN, TIMESTAMP_FIELD};
use crate::logic::labeling::{AutoLabeler, LabelSummary};
use crate::logic::model::{cross_validate, CvReport, TrainedModel};
use crate::logic::transform::FittedTransform;

/// Columns a training table must carry
pub const REQUIRED_TRAINING_COLUMNS: &[&str] = &[TIMESTAMP_FIELD];

/// What a training run reports besides the artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingDiagnostics {
    pub rows: usize,
    pub threats: usize,
    pub threat_ratio: f64,
    pub feature_width: usize,
    pub text_vocab_size: usize,
    pub backend: String,
    /// None when CV was skipped (single class)
    pub cv: Option<CvReport>,
    /// Present when labels came from the auto-labeler
    pub labeling: Option<LabelSummary>,
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub transform: FittedTransform,
    pub model: TrainedModel,
    pub diagnostics: TrainingDiagnostics,
}

/// Where training labels come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelSource {
    /// Auto-label a copy of the table
    #[default]
    Auto,
    /// Use the `is_threat` column already in the table
    Existing,
}

pub struct Trainer<'a> {
    config: &'a TriageConfig,
    labels: LabelSource,
}

impl<'a> Trainer<'a> {
    pub fn new(config: &'a TriageConfig) -> Self {
        Self { config, labels: LabelSource::default() }
    }

    pub fn with_labels(mut self, labels: LabelSource) -> Self {
        self.labels = labels;
        self
    }

    /// Train with the configured label source
    pub fn run(&self, table: &AlertTable) -> TriageResult<TrainingOutcome> {
        match self.labels {
            LabelSource::Auto => self.train(table),
            LabelSource::Existing => self.train_labeled(table),
        }
    }

    /// Auto-label a copy of `table`, then train on those labels
    pub fn train(&self, table: &AlertTable) -> TriageResult<TrainingOutcome> {
        check_required(table)?;

        let mut labeled = table.clone();
        let summary = AutoLabeler::new(self.config)?.label(&mut labeled);
        self.fit(&labeled, Some(summary))
    }

    /// Train on labels already present in `is_threat`
    pub fn train_labeled(&self, table: &AlertTable) -> TriageResult<TrainingOutcome> {
        check_required(table)?;
        self.fit(table, None)
    }

    /// Train, then persist. Nothing is written if any step fails.
    pub fn train_and_save(
        &self,
        table: &AlertTable,
        store: &ArtifactStore,
    ) -> TriageResult<(TrainingOutcome, ArtifactManifest)> {
        let outcome = self.run(table).map_err(|e| {
            log::error!("Training failed, no artifacts written: {}", e);
            e
        })?;
        let manifest = store.save(&outcome.transform, &outcome.model).map_err(|e| {
            log::error!("Failed to save artifacts to {}: {}", store.dir().display(), e);
            e
        })?;
        Ok((outcome, manifest))
    }

    fn fit(&self, table: &AlertTable, labeling: Option<LabelSummary>) -> TriageResult<TrainingOutcome> {
        let bundle = engineer(table, true)?;
        let labels = bundle
            .labels
            .clone()
            .ok_or_else(|| TriageError::MissingColumn(LABEL_COLUMN.to_string()))?;

        let rows = labels.len();
        let threats = labels.iter().filter(|&&y| y == 1).count();
        let threat_ratio = threats as f64 / rows as f64;
        log::info!(
            "Data shape: {} rows. Threat ratio: {}/{} ({:.2}%)",
            rows,
            threats,
            rows,
            threat_ratio * 100.0
        );
        if threats == 0 {
            log::warn!("No threat samples in training data, model will only learn the benign class");
        }

        log::info!("Transforming features...");
        let transform = FittedTransform::fit_bundle(&bundle, self.config.text_vocab_cap)?;
        let matrix = transform.apply_bundle(&bundle)?;

        log::info!("Running cross-validation...");
        let cv = cross_validate(
            &self.config.backend,
            matrix.view(),
            &labels,
            self.config.cv_folds,
            self.config.random_seed,
            self.config.decision_threshold,
        )?;

        log::info!("Fitting final model ({})...", self.config.backend.name());
        let model = TrainedModel::fit(&self.config.backend, matrix.view(), &labels, self.config.random_seed)?;

        let diagnostics = TrainingDiagnostics {
            rows,
            threats,
            threat_ratio,
            feature_width: transform.width(),
            text_vocab_size: transform.text_width(),
            backend: model.backend_name().to_string(),
            cv,
            labeling,
        };

        log::info!("Training complete: {} features", diagnostics.feature_width);

        Ok(TrainingOutcome { transform, model, diagnostics })
    }
}

fn check_required(table: &AlertTable) -> TriageResult<()> {
    if table.is_empty() {
        return Err(TriageError::EmptyTable);
    }
    match table.missing_columns(REQUIRED_TRAINING_COLUMNS).first() {
        Some(column) => Err(TriageError::MissingColumn(column.to_string())),
        None => Ok(()),
    }
}
