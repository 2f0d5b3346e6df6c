//! Feature Layout - column sets shared by training and scoring
//!
//! Any change to a column list below needs a `FEATURE_VERSION` bump.
//!
//! Fitted transforms persist the version and hash; a mismatch at load time
//! means the artifact was built against a different schema.

use crc32fast::Hasher;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{TriageError, TriageResult};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Bump on any column add, removal or reorder
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Source field holding the alert time
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Numeric block, in column order. Always present, missing → 0
pub const NUMERIC_COLUMNS: &[&str] = &[
    "hour",       // 0: hour of day (0-23) from timestamp
    "weekday",    // 1: day of week, Monday = 0
    "rule.level", // 2: rule severity
];

/// Categorical block, in column order. Always present, missing → "unknown"
pub const CATEGORICAL_COLUMNS: &[&str] = &[
    "rule.id",
    "agent.name",
    "data.srcip",
];

/// Free-text sources, joined in this order
pub const TEXT_FIELDS: &[&str] = &[
    "data.win.eventdata.image",
    "data.command",
    "message",
    "full_log",
    "data.win.eventdata.commandLine",
];

/// Training label column (0 = benign, 1 = threat)
pub const LABEL_COLUMN: &str = "is_threat";

/// Heuristic threat score written next to the label
pub const SCORE_COLUMN: &str = "is_threat_score";

/// Placeholder for absent categorical values
pub const UNKNOWN_CATEGORY: &str = "unknown";

pub const NUMERIC_COUNT: usize = 3;
pub const CATEGORICAL_COUNT: usize = 3;

// ============================================================================
// LAYOUT HASH
// ============================================================================

static LAYOUT_HASH: Lazy<u32> = Lazy::new(|| {
    let mut crc = Hasher::new();
    crc.update(&[FEATURE_VERSION]);
    for group in [NUMERIC_COLUMNS, CATEGORICAL_COLUMNS, TEXT_FIELDS] {
        for name in group {
            crc.update(name.as_bytes());
            crc.update(&[0]);
        }
        crc.update(&[0xff]);
    }
    crc.finalize()
});

/// CRC32 over the version and every column name, group by group
pub fn layout_hash() -> u32 {
    *LAYOUT_HASH
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Layout as reported by /health and written to logs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub text_fields: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        let owned = |cols: &[&str]| cols.iter().map(|s| s.to_string()).collect();
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            numeric_columns: owned(NUMERIC_COLUMNS),
            categorical_columns: owned(CATEGORICAL_COLUMNS),
            text_fields: owned(TEXT_FIELDS),
        }
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Validate that a persisted artifact matches the current layout
pub fn validate_layout(version: u8, hash: u32) -> TriageResult<()> {
    let current_hash = layout_hash();

    if version != FEATURE_VERSION || hash != current_hash {
        return Err(TriageError::LayoutMismatch {
            expected_version: FEATURE_VERSION,
            expected_hash: current_hash,
            actual_version: version,
            actual_hash: hash,
        });
    }

    Ok(())
}

/// Index of a numeric column by name
pub fn numeric_index(name: &str) -> Option<usize> {
    NUMERIC_COLUMNS.iter().position(|&n| n == name)
}

/// Index of a categorical column by name
pub fn categorical_index(name: &str) -> Option<usize> {
    CATEGORICAL_COLUMNS.iter().position(|&n| n == name)
}

// ============================================================================
// TESTS
// ============================================================================
