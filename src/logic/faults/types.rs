//! Fault Types
//!
//! Data structures only. Rule logic lives in `analyzer`.

use serde::{Deserialize, Serialize};

use super::log_analysis::LogSummary;

// ============================================================================
// SEVERITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// FAULT REPORT
// ============================================================================

/// Human-readable finding from one triggered rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultReport {
    pub severity: Severity,
    pub reason: String,
    pub description: String,
    pub recommendations: Vec<String>,
    /// 0-100
    pub confidence: u8,
}

impl FaultReport {
    pub fn new(
        severity: Severity,
        reason: &str,
        description: impl Into<String>,
        recommendations: &[&str],
        confidence: u8,
    ) -> Self {
        Self {
            severity,
            reason: reason.to_string(),
            description: description.into(),
            recommendations: recommendations.iter().map(|r| r.to_string()).collect(),
            confidence: confidence.min(100),
        }
    }
}

/// Reports for one session, in session order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAnalysis {
    pub session_id: String,
    pub reports: Vec<FaultReport>,
    /// Per-log anomaly counts for the session's logs
    #[serde(default)]
    pub log_summary: LogSummary,
}

impl SessionAnalysis {
    pub fn has_faults(&self) -> bool {
        !self.reports.is_empty()
    }

    pub fn max_severity(&self) -> Option<Severity> {
        self.reports.iter().map(|r| r.severity).max()
    }
}
