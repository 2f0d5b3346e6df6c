//! Model Module - Classifier Training & Scoring
//!
//! Tách logic model khỏi feature engineering.
//! Backend được chọn qua config, dễ swap.

pub mod classifier;
pub mod boosting;
pub mod logistic;
pub mod validation;
pub mod threshold;

// Re-export common types
pub use boosting::{BoostedTrees, BoostingParams};
pub use classifier::{BackendConfig, Classifier, TrainedModel};
pub use logistic::{LogisticModel, LogisticParams};
pub use threshold::{DecisionThreshold, ThresholdSource};
pub use validation::{cross_validate, CvReport, MetricSummary};
