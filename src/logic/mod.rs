//! Logic Module - Business Logic & Pipeline
//!
//! Chứa toàn bộ pipeline: nhãn, đặc trưng, biến đổi, mô hình, chấm điểm.
//!
//! ## Architecture
//! - `alert/` - Flattened alert records and tables
//! - `labeling/` - Heuristic training labels
//! - `features/` - Feature layout and engineering
//! - `transform/` - Scaler, one-hot, TF-IDF (fit once, apply many)
//! - `model/` - Classifier backends, CV, decision threshold
//! - `artifacts/` - Persisted transform + model with manifest
//! - `pipeline/` - Train / score orchestration
//! - `triage/` - Alert decision and notification

pub mod config;

pub mod alert;
pub mod labeling;
pub mod features;
pub mod transform;
pub mod model;
pub mod artifacts;
pub mod pipeline;
pub mod triage;
