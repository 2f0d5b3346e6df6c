//! Labeling Rules & Weights
//!
//! Định nghĩa các rule cho gán nhãn tự động.
//! KHÔNG chứa logic gán nhãn - chỉ rule set và keyword matcher.

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};

use crate::error::{TriageError, TriageResult};
use crate::logic::config::TriageConfig;
use crate::logic::features::layout::TEXT_FIELDS;

/// Column-name fragments that mark a field as free text worth keyword scanning
pub const TEXT_COLUMN_MARKERS: &[&str] = &["image", "command", "eventdata", "msg", "message"];

/// True if a flattened field name looks like free text.
/// The feature engineer's text fields (`full_log` among them) always count.
pub fn is_text_column(name: &str) -> bool {
    TEXT_FIELDS.contains(&name) || TEXT_COLUMN_MARKERS.iter().any(|m| name.contains(m))
}

// ============================================================================
// RULE SET
// ============================================================================

#[derive(Debug, Clone)]
pub struct LabelRules {
    pub rule_level_threshold: f64,
    pub rule_id_overrides: BTreeMap<String, f64>,
    pub keywords: KeywordMatcher,
}

impl LabelRules {
    pub fn from_config(config: &TriageConfig) -> TriageResult<Self> {
        Ok(Self {
            rule_level_threshold: config.rule_level_threshold as f64,
            rule_id_overrides: config.rule_id_overrides.clone(),
            keywords: KeywordMatcher::new(&config.keyword_indicators)?,
        })
    }

    /// Override weight for a rule id, 0 when not listed
    pub fn override_weight(&self, rule_id: Option<&str>) -> f64 {
        rule_id
            .and_then(|id| self.rule_id_overrides.get(id))
            .copied()
            .unwrap_or(0.0)
    }
}

// ============================================================================
// KEYWORD MATCHER
// ============================================================================

/// Case-insensitive literal search for any of the configured keywords
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    pattern: Option<Regex>,
}

impl KeywordMatcher {
    pub fn new(keywords: &[String]) -> TriageResult<Self> {
        let alternatives: Vec<String> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { pattern: None });
        }

        let pattern = RegexBuilder::new(&alternatives.join("|"))
            .case_insensitive(true)
            .build()
            .map_err(|e| TriageError::Config(format!("Invalid keyword list: {}", e)))?;

        Ok(Self { pattern: Some(pattern) })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(text))
    }

    /// First keyword found, for log reasons
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.pattern.as_ref()?.find(text).map(|m| m.as_str())
    }
}
