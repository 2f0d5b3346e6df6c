//! Labeling Module - heuristic training labels
//!
//! Chỉ dùng khi huấn luyện (training). Never called on the inference path.
//!
//! ## Structure
//! - `rules`: rule set, keyword matcher, text-column detection
//! - `labeler`: additive threat score and the 0/1 label

pub mod rules;
pub mod labeler;

#[cfg(test)]
mod tests;

pub use labeler::{AutoLabeler, LabelBreakdown, LabelOutcome, LabelSummary};
pub use rules::{is_text_column, KeywordMatcher, LabelRules};
