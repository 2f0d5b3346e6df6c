//! Triage Decision - model verdict + rule-level override
//!
//! A row alerts when the model predicts a threat OR its rule level reaches
//! the force-alert level. Notices go out for at most N alerted rows per batch.

use serde::{Deserialize, Serialize};

use super::notifier::{Notifier, ThreatNotice};
use crate::error::{TriageError, TriageResult};
use crate::logic::alert::{AlertRecord, AlertTable};
use crate::logic::config::TriageConfig;
use crate::logic::pipeline::BatchScores;

/// Level above which a low model score is suspicious
const LOW_SCORE_WARN_LEVEL: f64 = 5.0;
const LOW_SCORE_WARN_PROBABILITY: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertReason {
    Model,
    RuleLevel,
    ModelAndRuleLevel,
}

/// Outcome for one scored row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowVerdict {
    pub row: usize,
    pub prediction: u8,
    pub probability: f64,
    pub rule_level: f64,
    pub alert: bool,
    pub reason: Option<AlertReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageReport {
    pub verdicts: Vec<RowVerdict>,
    pub alerts: usize,
    pub notices_sent: usize,
}

#[derive(Debug, Clone)]
pub struct TriagePolicy {
    pub alert_level_threshold: f64,
    pub max_notifications: usize,
}

impl TriagePolicy {
    pub fn from_config(config: &TriageConfig) -> Self {
        Self {
            alert_level_threshold: config.alert_level_threshold as f64,
            max_notifications: config.max_notifications_per_batch,
        }
    }

    /// Verdict for one row
    pub fn decide(&self, row: usize, record: &AlertRecord, prediction: u8, probability: f64) -> RowVerdict {
        let rule_level = record.number_or("rule.level", 0.0);
        let by_model = prediction == 1;
        let by_level = rule_level >= self.alert_level_threshold;

        let reason = match (by_model, by_level) {
            (true, true) => Some(AlertReason::ModelAndRuleLevel),
            (true, false) => Some(AlertReason::Model),
            (false, true) => Some(AlertReason::RuleLevel),
            (false, false) => None,
        };

        if reason.is_some() {
            log::info!(
                "THREAT DETECTED | row {} | score {:.4} | level {}",
                row,
                probability,
                rule_level
            );
        } else {
            log::debug!("SAFE | row {} | score {:.4} | level {}", row, probability, rule_level);
            if rule_level > LOW_SCORE_WARN_LEVEL && probability < LOW_SCORE_WARN_PROBABILITY {
                log::warn!(
                    "Row {}: rule level {} but model score {:.4}, check text field mapping",
                    row,
                    rule_level,
                    probability
                );
            }
        }

        RowVerdict {
            row,
            prediction,
            probability,
            rule_level,
            alert: reason.is_some(),
            reason,
        }
    }

    /// Decide every row and notify for the first alerted ones
    pub fn triage(
        &self,
        table: &AlertTable,
        scores: &BatchScores,
        notifier: &dyn Notifier,
    ) -> TriageResult<TriageReport> {
        if table.len() != scores.len() || scores.probabilities.len() != scores.len() {
            return Err(TriageError::MalformedInput(format!(
                "{} rows but {} scores",
                table.len(),
                scores.len()
            )));
        }

        let verdicts: Vec<RowVerdict> = table
            .iter()
            .enumerate()
            .map(|(i, record)| self.decide(i, record, scores.predictions[i], scores.probabilities[i]))
            .collect();

        let alerted: Vec<&RowVerdict> = verdicts.iter().filter(|v| v.alert).collect();
        if alerted.len() > self.max_notifications {
            log::info!(
                "{} alerts in batch, notifying for the first {}",
                alerted.len(),
                self.max_notifications
            );
        }

        let mut notices_sent = 0;
        for verdict in alerted.iter().take(self.max_notifications) {
            let notice = ThreatNotice::from_row(&table.rows()[verdict.row], verdict);
            match notifier.notify(&notice) {
                Ok(()) => notices_sent += 1,
                Err(e) => log::error!("Failed to deliver notice for row {}: {}", verdict.row, e),
            }
        }

        Ok(TriageReport {
            alerts: alerted.len(),
            verdicts,
            notices_sent,
        })
    }
}
