//! Triage Configuration
//!
//! Built once at process start, then passed by reference into every component.
//! Precedence: defaults < JSON config file < environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{TriageError, TriageResult};
use crate::logic::model::BackendConfig;

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    /// Rule level at or above which the labeler adds the level weight
    pub rule_level_threshold: i64,

    /// Case-insensitive keywords searched in alert free text
    pub keyword_indicators: Vec<String>,

    /// Signed weight added when `rule.id` matches exactly
    pub rule_id_overrides: BTreeMap<String, f64>,

    /// Max TF-IDF vocabulary size
    pub text_vocab_cap: usize,

    /// Cross-validation folds (diagnostics only)
    pub cv_folds: usize,

    /// Probability cut for a positive prediction
    pub decision_threshold: f64,

    /// Seed for CV shuffling and row subsampling
    pub random_seed: u64,

    /// Classifier backend and its hyper-parameters
    pub backend: BackendConfig,

    /// Where trained artifacts live
    pub model_dir: PathBuf,

    /// Rule level that forces an alert regardless of the model
    pub alert_level_threshold: i64,

    /// Max notices per scored batch
    pub max_notifications_per_batch: usize,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            rule_level_threshold: constants::DEFAULT_RULE_LEVEL_THRESHOLD,
            keyword_indicators: constants::DEFAULT_KEYWORD_INDICATORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rule_id_overrides: BTreeMap::new(),
            text_vocab_cap: constants::DEFAULT_TEXT_VOCAB_CAP,
            cv_folds: constants::DEFAULT_CV_FOLDS,
            decision_threshold: constants::DEFAULT_DECISION_THRESHOLD,
            random_seed: constants::DEFAULT_RANDOM_SEED,
            backend: BackendConfig::default(),
            model_dir: constants::default_model_dir(),
            alert_level_threshold: constants::DEFAULT_ALERT_LEVEL_THRESHOLD,
            max_notifications_per_batch: constants::DEFAULT_MAX_NOTIFICATIONS,
        }
    }
}

impl TriageConfig {
    /// Load from an optional JSON file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> TriageResult<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file; missing keys fall back to defaults
    pub fn from_file(path: &Path) -> TriageResult<Self> {
        let data = std::fs::read(path)?;
        let config: TriageConfig = serde_json::from_slice(&data)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Override selected fields from `TRIAGE_*` environment variables
    pub fn apply_env(&mut self) {
        if std::env::var("TRIAGE_MODEL_DIR").is_ok() {
            self.model_dir = constants::get_model_dir();
        }
        if let Some(threshold) = constants::get_decision_threshold() {
            self.decision_threshold = threshold;
        }
        if let Some(seed) = constants::get_random_seed() {
            self.random_seed = seed;
        }
        if let Some(name) = constants::get_backend() {
            match BackendConfig::from_name(&name) {
                Some(backend) => self.backend = backend,
                None => log::warn!("Unknown TRIAGE_BACKEND '{}', keeping {}", name, self.backend.name()),
            }
        }
    }

    pub fn validate(&self) -> TriageResult<()> {
        if self.cv_folds < 2 {
            return Err(TriageError::Config(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if self.text_vocab_cap == 0 {
            return Err(TriageError::Config("text_vocab_cap must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.decision_threshold) {
            return Err(TriageError::Config(format!(
                "decision_threshold must be within [0, 1], got {}",
                self.decision_threshold
            )));
        }
        self.backend.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TriageConfig::default();
        assert_eq!(config.rule_level_threshold, 10);
        assert_eq!(config.text_vocab_cap, 1000);
        assert_eq!(config.cv_folds, 5);
        assert_eq!(config.decision_threshold, 0.5);
        assert!(config.keyword_indicators.iter().any(|k| k == "mimikatz"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triage.json");
        std::fs::write(
            &path,
            r#"{"rule_level_threshold": 7, "rule_id_overrides": {"5710": 1.0}}"#,
        )
        .unwrap();

        let config = TriageConfig::from_file(&path).unwrap();
        assert_eq!(config.rule_level_threshold, 7);
        assert_eq!(config.rule_id_overrides.get("5710"), Some(&1.0));
        assert_eq!(config.cv_folds, 5);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = TriageConfig { cv_folds: 1, ..Default::default() };
        assert!(matches!(config.validate(), Err(TriageError::Config(_))));

        let config = TriageConfig { decision_threshold: 1.5, ..Default::default() };
        assert!(config.validate().is_err());

        let config = TriageConfig { text_vocab_cap: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }
}
