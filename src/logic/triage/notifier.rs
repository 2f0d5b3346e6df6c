//! Notifier - delivery seam for threat notices
//!
//! Delivery channels (chat, mail, ticketing) live outside this crate and
//! implement `Notifier`. `LogNotifier` writes notices to the log.

use serde::{Deserialize, Serialize};

use super::decision::RowVerdict;
use crate::constants::NOTICE_TEXT_LIMIT;
use crate::error::TriageResult;
use crate::logic::alert::AlertRecord;
use crate::logic::features::row_text;

/// What a delivery channel receives for one alerted row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatNotice {
    pub row: usize,
    pub agent: String,
    pub rule_level: f64,
    pub probability: f64,
    pub srcip: Option<String>,
    /// Alert text, cut to `NOTICE_TEXT_LIMIT` characters
    pub text: String,
}

impl ThreatNotice {
    pub fn from_row(record: &AlertRecord, verdict: &RowVerdict) -> Self {
        Self {
            row: verdict.row,
            agent: record.text_or("agent.name", "Unknown"),
            rule_level: verdict.rule_level,
            probability: verdict.probability,
            srcip: record.text("data.srcip"),
            text: truncate_text(&row_text(record), NOTICE_TEXT_LIMIT),
        }
    }
}

/// First `limit` characters, with "..." appended when cut
pub fn truncate_text(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &ThreatNotice) -> TriageResult<()>;
}

/// Writes notices to the log at warn level
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &ThreatNotice) -> TriageResult<()> {
        log::warn!(
            "AI DETECTED THREAT (score {:.2}) | agent {} | level {} | srcip {} | log: {}",
            notice.probability,
            notice.agent,
            notice.rule_level,
            notice.srcip.as_deref().unwrap_or("-"),
            notice.text
        );
        Ok(())
    }
}
