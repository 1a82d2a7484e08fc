//! Per-Log Analytics
//!
//! Raw-unit checks on single log rows: power stability against the 7 kW
//! nominal output, sync freshness and a normal/anomaly verdict. Works on
//! watts as reported, before any normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::records::{ChargingRecord, ChargingStatus};

/// Nominal output power (W)
pub const NOMINAL_POWER_W: f64 = 7000.0;

/// Deviation from nominal at which stability reaches 0 (W)
pub const MAX_POWER_DEVIATION_W: f64 = 3000.0;

/// Stability below this marks the log anomalous
pub const MIN_POWER_STABILITY: f64 = 0.5;

/// Output above this (W) marks the log anomalous
pub const MAX_EXPECTED_POWER_W: f64 = 10_000.0;

/// |sync_at - created_at| below this many whole minutes counts as in sync
pub const TIME_SYNC_TOLERANCE_MINUTES: i64 = 5;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Normal,
    Anomaly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogAnalysis {
    pub log_id: String,
    /// Start → stop (or `now` while open), whole minutes
    pub duration_minutes: i64,
    /// Wh per minute, 0 when the duration is not positive
    pub consumption_rate: f64,
    /// 1 at nominal power, 0 at or beyond the max deviation or with no reading
    pub power_stability: f64,
    pub has_time_sync: bool,
    pub status: LogStatus,
}

impl LogAnalysis {
    pub fn is_anomaly(&self) -> bool {
        self.status == LogStatus::Anomaly
    }
}

/// Anomaly count over a session's logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LogSummary {
    pub total_logs: usize,
    pub anomalous_logs: usize,
    pub unsynced_logs: usize,
}

impl LogSummary {
    /// Fraction of anomalous logs, 0 for no logs
    pub fn anomaly_rate(&self) -> f64 {
        if self.total_logs == 0 {
            0.0
        } else {
            self.anomalous_logs as f64 / self.total_logs as f64
        }
    }

    pub fn merge(&mut self, other: &LogSummary) {
        self.total_logs += other.total_logs;
        self.anomalous_logs += other.anomalous_logs;
        self.unsynced_logs += other.unsynced_logs;
    }
}

// ============================================================================
// ANALYSIS
// ============================================================================

/// Missing or zero output counts as no reading
pub fn power_stability(output_power: Option<f64>) -> f64 {
    match output_power {
        Some(watts) if watts != 0.0 && !watts.is_nan() => {
            (1.0 - (watts - NOMINAL_POWER_W).abs() / MAX_POWER_DEVIATION_W).max(0.0)
        }
        _ => 0.0,
    }
}

pub fn analyze_log_at(log: &ChargingRecord, now: DateTime<Utc>) -> LogAnalysis {
    let end = log.stopped_at.unwrap_or(now);
    let duration_minutes = (end - log.started_at).num_minutes();
    let consumption_rate = if duration_minutes > 0 {
        log.consumption.unwrap_or(0.0) / duration_minutes as f64
    } else {
        0.0
    };

    let power_stability = power_stability(log.output_power);
    let has_time_sync = (log.sync_at - log.created_at).num_minutes().abs() < TIME_SYNC_TOLERANCE_MINUTES;

    let anomalous = (consumption_rate == 0.0 && log.status == ChargingStatus::Charging)
        || power_stability < MIN_POWER_STABILITY
        || log.output_power.is_some_and(|watts| watts > MAX_EXPECTED_POWER_W)
        || (log.consumption == Some(0.0) && log.status == ChargingStatus::Finished);

    LogAnalysis {
        log_id: log.id.clone(),
        duration_minutes,
        consumption_rate,
        power_stability,
        has_time_sync,
        status: if anomalous { LogStatus::Anomaly } else { LogStatus::Normal },
    }
}

pub fn analyze_log(log: &ChargingRecord) -> LogAnalysis {
    analyze_log_at(log, Utc::now())
}

pub fn summarize_logs_at(logs: &[ChargingRecord], now: DateTime<Utc>) -> LogSummary {
    logs.iter()
        .map(|log| analyze_log_at(log, now))
        .fold(LogSummary::default(), |mut summary, analysis| {
            summary.total_logs += 1;
            summary.anomalous_logs += analysis.is_anomaly() as usize;
            summary.unsynced_logs += (!analysis.has_time_sync) as usize;
            summary
        })
}
