//! Features Module - Feature Engineering
//!
//! Tách logic trích xuất features khỏi transform và model.
//! `layout` is the single source of truth for column sets; `engineer` turns an
//! alert table into a `FeatureBundle` identically for training and inference.

pub mod layout;
pub mod time;
pub mod bundle;
pub mod engineer;


// Re-export common types
pub use bundle::{CategoricalRow, FeatureBundle, NumericRow};
pub use engineer::{engineer, engineer_row, row_text, set_label, RowFeatures};
pub use layout::{LayoutInfo, FEATURE_VERSION, layout_hash};
