//! Faults Module
//!
//! Rule-based fault analysis over a session and its logs. This is the
//! always-available path; the classifier in `model` is optional on top.
//!
//! ## Structure
//! - `types`: Severity, FaultReport, SessionAnalysis
//! - `rules`: Thresholds, confidences, recommendation text
//! - `analyzer`: Rule evaluation
//! - `log_analysis`: Per-log power stability, sync and anomaly verdicts
//!
//! ## Usage
//! ```ignore
//! use crate::logic::faults::analyze;
//!
//! for report in analyze(&session, &logs) {
//!     println!("[{}] {}: {}", report.severity, report.reason, report.description);
//! }
//! ```

pub mod types;
pub mod rules;
pub mod analyzer;
pub mod log_analysis;

#[cfg(test)]
mod tests;

pub use types::{FaultReport, SessionAnalysis, Severity};
pub use rules::RuleThresholds;
pub use analyzer::{analyze, analyze_all, analyze_all_at, analyze_with_thresholds};
pub use log_analysis::{analyze_log, analyze_log_at, summarize_logs_at, LogAnalysis, LogStatus, LogSummary};
