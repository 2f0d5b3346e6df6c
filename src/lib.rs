//! Alert Triage - threat scoring for SIEM alerts
//!
//! ```text
//! alerts ──► auto-label ──► engineer ──► transform ──► classifier
//!                                            │              │
//!                                      artifacts/ ◄─────────┘
//!                                            │
//! alerts ──► engineer ──► apply transform ──► score ──► triage ──► notify
//! ```
//!
//! Training runs offline from the CLI. Scoring runs from the CLI or behind
//! the HTTP API, against whatever artifacts were last saved.

pub mod constants;
pub mod error;
pub mod logic;
pub mod api;

pub use error::{TriageError, TriageResult};
pub use logic::alert::{AlertRecord, AlertTable};
pub use logic::config::TriageConfig;
pub use logic::pipeline::{BatchScores, Scorer, Trainer};
