//! Fitted Transform State - scaler + encoder + vectorizer
//!
//! Created only by training; read-only once loaded. Output columns are
//! `[scaled numeric | one-hot categorical | tf-idf text]`, always in that order.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::onehot::OneHotEncoder;
use super::scaler::StandardScaler;
use super::tfidf::TfidfVectorizer;
use crate::error::{TriageError, TriageResult};
use crate::logic::features::layout::{layout_hash, validate_layout, FEATURE_VERSION};
use crate::logic::features::{CategoricalRow, FeatureBundle, NumericRow};

/// Combined feature matrix, one row per alert
pub type FeatureMatrix = Array2<f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTransform {
    pub feature_version: u8,
    pub layout_hash: u32,
    pub scaler: StandardScaler,
    pub encoder: OneHotEncoder,
    /// None when the training corpus had no text; apply then emits zero text columns
    pub vectorizer: Option<TfidfVectorizer>,
}

impl FittedTransform {
    /// Learn scaler statistics, categorical vocabularies and the text vocabulary
    pub fn fit(
        numeric: &[NumericRow],
        categorical: &[CategoricalRow],
        text: &[String],
        vocab_cap: usize,
    ) -> TriageResult<Self> {
        check_aligned(numeric, categorical, text)?;
        if numeric.is_empty() {
            return Err(TriageError::EmptyTable);
        }

        let vectorizer = if text.iter().all(|t| t.trim().is_empty()) {
            None
        } else {
            TfidfVectorizer::fit(text, vocab_cap)
        };
        if vectorizer.is_none() {
            log::warn!("No text data found for TF-IDF, text block will be empty");
        }

        let fitted = Self {
            feature_version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            scaler: StandardScaler::fit(numeric),
            encoder: OneHotEncoder::fit(categorical),
            vectorizer,
        };

        log::info!(
            "Fitted transform: {} numeric + {} categorical + {} text columns",
            fitted.scaler.width(),
            fitted.encoder.width(),
            fitted.text_width()
        );

        Ok(fitted)
    }

    pub fn fit_bundle(bundle: &FeatureBundle, vocab_cap: usize) -> TriageResult<Self> {
        Self::fit(&bundle.numeric, &bundle.categorical, &bundle.text, vocab_cap)
    }

    /// Columns from numeric + categorical
    pub fn tabular_width(&self) -> usize {
        self.scaler.width() + self.encoder.width()
    }

    /// Columns from text; 0 when no vectorizer was fit
    pub fn text_width(&self) -> usize {
        self.vectorizer.as_ref().map_or(0, TfidfVectorizer::width)
    }

    /// Total width of the combined matrix
    pub fn width(&self) -> usize {
        self.tabular_width() + self.text_width()
    }

    /// Apply the stored transform; never refits, never widens
    pub fn apply(
        &self,
        numeric: &[NumericRow],
        categorical: &[CategoricalRow],
        text: &[String],
    ) -> TriageResult<FeatureMatrix> {
        check_aligned(numeric, categorical, text)?;

        let rows = numeric.len();
        let width = self.width();
        let numeric_end = self.scaler.width();
        let tabular_end = self.tabular_width();
        let mut data = vec![0.0; rows * width];

        for (i, out) in data.chunks_mut(width).enumerate() {
            self.scaler.transform_into(&numeric[i], &mut out[..numeric_end]);
            self.encoder.encode_into(&categorical[i], &mut out[numeric_end..tabular_end]);
            if let Some(vectorizer) = &self.vectorizer {
                vectorizer.transform_into(&text[i], &mut out[tabular_end..]);
            }
        }

        Array2::from_shape_vec((rows, width), data)
            .map_err(|e| TriageError::Artifact(format!("Feature matrix shape error: {}", e)))
    }

    pub fn apply_bundle(&self, bundle: &FeatureBundle) -> TriageResult<FeatureMatrix> {
        self.apply(&bundle.numeric, &bundle.categorical, &bundle.text)
    }

    /// Check the persisted layout against the running build
    pub fn validate(&self) -> TriageResult<()> {
        validate_layout(self.feature_version, self.layout_hash)
    }
}

fn check_aligned(
    numeric: &[NumericRow],
    categorical: &[CategoricalRow],
    text: &[String],
) -> TriageResult<()> {
    if numeric.len() != categorical.len() || numeric.len() != text.len() {
        return Err(TriageError::MalformedInput(format!(
            "feature blocks are not aligned: {} numeric, {} categorical, {} text rows",
            numeric.len(),
            categorical.len(),
            text.len()
        )));
    }
    Ok(())
}
