//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! `TriageConfig::default()` reads from here; nothing else should hard-code these.

use std::path::PathBuf;

/// App name
pub const APP_NAME: &str = "alert-triage";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================
// Auto-labeling
// ============================================

/// Rule level at or above which an alert counts toward a threat label
pub const DEFAULT_RULE_LEVEL_THRESHOLD: i64 = 10;

/// Keywords that mark an alert's free text as suspicious
pub const DEFAULT_KEYWORD_INDICATORS: &[&str] = &[
    "mimikatz", "metasploit", "cobalt", "shadow",
    "net user", "net localgroup", "whoami",
    "powershell", "cmd.exe", "rundll32", "wmic",
    "suspicious", "credential", "hacker", "attack", "malware",
    "bypass", "downloadstring",
];

/// Heuristic weights
pub const LEVEL_WEIGHT: f64 = 0.5;
pub const KEYWORD_WEIGHT: f64 = 0.7;
pub const RARE_IP_WEIGHT: f64 = 0.2;

/// Source IPs seen in less than this share of a table are "rare"
pub const RARE_IP_FREQUENCY: f64 = 0.001;

/// Accumulated threat score at which the label flips to 1
pub const LABEL_SCORE_CUTOFF: f64 = 0.5;

// ============================================
// Transform / training
// ============================================

/// Max TF-IDF vocabulary size
pub const DEFAULT_TEXT_VOCAB_CAP: usize = 1000;

/// Cross-validation folds
pub const DEFAULT_CV_FOLDS: usize = 5;

/// Seed for every randomised step (CV shuffle, subsampling)
pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// Probability at or above which a row is predicted as a threat
pub const DEFAULT_DECISION_THRESHOLD: f64 = 0.5;

// ============================================
// Triage
// ============================================

/// Rule level that forces an alert regardless of the model
pub const DEFAULT_ALERT_LEVEL_THRESHOLD: i64 = 10;

/// Max notices handed to the notifier per batch
pub const DEFAULT_MAX_NOTIFICATIONS: usize = 5;

/// Max characters of alert text carried in a notice
pub const NOTICE_TEXT_LIMIT: usize = 100;

// ============================================
// Server
// ============================================

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

// ============================================
// Artifact file names
// ============================================

pub const TRANSFORM_FILE: &str = "transform.json";
pub const MODEL_FILE: &str = "model.json";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const THRESHOLD_FILE: &str = "threshold.json";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Default directory for trained artifacts
pub fn default_model_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("models")
}

/// Get model directory from environment or use default
pub fn get_model_dir() -> PathBuf {
    std::env::var("TRIAGE_MODEL_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_model_dir())
}

/// Get decision threshold from environment, if set and parseable
pub fn get_decision_threshold() -> Option<f64> {
    std::env::var("TRIAGE_DECISION_THRESHOLD")
        .ok()
        .and_then(|s| s.parse().ok())
}

/// Get random seed from environment, if set and parseable
pub fn get_random_seed() -> Option<u64> {
    std::env::var("TRIAGE_RANDOM_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
}

/// Get classifier backend name from environment
pub fn get_backend() -> Option<String> {
    std::env::var("TRIAGE_BACKEND").ok()
}
