//! Auto-Labeler - weak threat labels for training data
//!
//! Additive heuristic over rule level, rule-id overrides, keyword hits and
//! source-IP rarity. The IP term is relative to the table being labeled, so
//! the same alert can get a different label in a different batch.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::rules::{is_text_column, LabelRules};
use crate::constants::{
    KEYWORD_WEIGHT, LABEL_SCORE_CUTOFF, LEVEL_WEIGHT, RARE_IP_FREQUENCY, RARE_IP_WEIGHT,
};
use crate::error::TriageResult;
use crate::logic::alert::{AlertRecord, AlertTable, FieldValue};
use crate::logic::config::TriageConfig;
use crate::logic::features::layout::{SCORE_COLUMN, UNKNOWN_CATEGORY};
use crate::logic::features::set_label;

const SRCIP_FIELD: &str = "data.srcip";

// ============================================================================
// TYPES
// ============================================================================

/// How a row's threat score was accumulated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelBreakdown {
    pub level_contribution: f64,
    pub override_contribution: f64,
    pub keyword_contribution: f64,
    pub rare_ip_contribution: f64,
}

impl LabelBreakdown {
    pub fn total(&self) -> f64 {
        self.level_contribution
            + self.override_contribution
            + self.keyword_contribution
            + self.rare_ip_contribution
    }
}

/// Heuristic outcome for one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelOutcome {
    pub score: f64,
    pub label: u8,
    pub breakdown: LabelBreakdown,
}

/// Batch-level counts for logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelSummary {
    pub rows: usize,
    pub threats: usize,
    pub keyword_hits: usize,
    pub rare_ips: usize,
}

// ============================================================================
// LABELER
// ============================================================================

pub struct AutoLabeler {
    rules: LabelRules,
}

impl AutoLabeler {
    pub fn new(config: &TriageConfig) -> TriageResult<Self> {
        Ok(Self { rules: LabelRules::from_config(config)? })
    }

    /// Score every row; deterministic for a given table
    pub fn score_table(&self, table: &AlertTable) -> Vec<LabelOutcome> {
        let text_columns: Vec<&str> = table
            .columns()
            .into_iter()
            .filter(|c| is_text_column(c))
            .collect();
        let ip_frequency = srcip_frequencies(table);

        table
            .iter()
            .map(|record| {
                let breakdown = self.score_row(record, &text_columns, &ip_frequency);
                let score = breakdown.total();
                LabelOutcome {
                    score,
                    label: u8::from(score >= LABEL_SCORE_CUTOFF),
                    breakdown,
                }
            })
            .collect()
    }

    /// Write `is_threat` and `is_threat_score` into every row
    pub fn label(&self, table: &mut AlertTable) -> LabelSummary {
        let outcomes = self.score_table(table);

        for (record, outcome) in table.rows_mut().iter_mut().zip(&outcomes) {
            record.insert(SCORE_COLUMN, FieldValue::Number(outcome.score));
            set_label(record, outcome.label);
        }

        let summary = LabelSummary {
            rows: outcomes.len(),
            threats: outcomes.iter().filter(|o| o.label == 1).count(),
            keyword_hits: outcomes.iter().filter(|o| o.breakdown.keyword_contribution > 0.0).count(),
            rare_ips: outcomes.iter().filter(|o| o.breakdown.rare_ip_contribution > 0.0).count(),
        };

        log::info!(
            "Auto-labeling: {} threats in {} rows ({} keyword hits, {} rare IPs)",
            summary.threats,
            summary.rows,
            summary.keyword_hits,
            summary.rare_ips
        );

        summary
    }

    fn score_row(
        &self,
        record: &AlertRecord,
        text_columns: &[&str],
        ip_frequency: &HashMap<String, f64>,
    ) -> LabelBreakdown {
        let mut breakdown = LabelBreakdown::default();

        // 1. Rule level
        if record.number_or("rule.level", 0.0) >= self.rules.rule_level_threshold {
            breakdown.level_contribution = LEVEL_WEIGHT;
        }

        // 2. Rule-id override
        breakdown.override_contribution =
            self.rules.override_weight(record.text("rule.id").as_deref());

        // 3. Keywords in free text
        let combined = text_columns
            .iter()
            .filter_map(|c| record.text(c))
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(keyword) = self.rules.keywords.find(&combined) {
            log::debug!("Keyword '{}' matched", keyword);
            breakdown.keyword_contribution = KEYWORD_WEIGHT;
        }

        // 4. Rare source IP
        let ip = record.text_or(SRCIP_FIELD, UNKNOWN_CATEGORY);
        let freq = ip_frequency.get(&ip).copied().unwrap_or(0.0);
        if freq < RARE_IP_FREQUENCY {
            breakdown.rare_ip_contribution = RARE_IP_WEIGHT;
        }

        breakdown
    }
}

/// Share of rows per source IP; missing IPs count as "unknown"
fn srcip_frequencies(table: &AlertTable) -> HashMap<String, f64> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in table {
        *counts.entry(record.text_or(SRCIP_FIELD, UNKNOWN_CATEGORY)).or_default() += 1;
    }

    let total = table.len().max(1) as f64;
    counts
        .into_iter()
        .map(|(ip, count)| (ip, count as f64 / total))
        .collect()
}
