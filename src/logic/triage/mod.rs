//! Triage Module - alert decision & notification
//!
//! Quyết định cảnh báo sau khi chấm điểm, gửi thông báo qua `Notifier`.

pub mod decision;
pub mod notifier;


pub use decision::{AlertReason, RowVerdict, TriagePolicy, TriageReport};
pub use notifier::{truncate_text, LogNotifier, Notifier, ThreatNotice};
