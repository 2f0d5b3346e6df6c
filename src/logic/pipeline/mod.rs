//! Pipeline Module - train / score orchestration
//!
//! Single-threaded per call: one table in, one result out.

pub mod train;
pub mod score;

#[cfg(test)]
mod tests;

pub use score::{BatchScores, LoadedModel, ModelStatus, Scorer};
pub use train::{LabelSource, Trainer, TrainingDiagnostics, TrainingOutcome, REQUIRED_TRAINING_COLUMNS};
