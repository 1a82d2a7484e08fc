//! Rule-Based Fault Analyzer
//!
//! Pure and deterministic: same session + logs in, same reports out,
//! in rule order. Needs no trained model.

use chrono::{DateTime, Utc};

use super::log_analysis::summarize_logs_at;
use super::rules::*;
use super::types::{FaultReport, SessionAnalysis, Severity};
use crate::logic::records::{group_logs_by_session, ChargingRecord, ChargingSession, ChargingStatus};

// ============================================================================
// MAIN ANALYSIS FUNCTION
// ============================================================================

pub fn analyze(session: &ChargingSession, logs: &[ChargingRecord]) -> Vec<FaultReport> {
    analyze_with_thresholds(session, logs, &RuleThresholds::default())
}

pub fn analyze_with_thresholds(
    session: &ChargingSession,
    logs: &[ChargingRecord],
    thresholds: &RuleThresholds,
) -> Vec<FaultReport> {
    let reports: Vec<FaultReport> = [
        check_interruptions(logs),
        check_low_power(logs, thresholds),
        check_slow_charging(session, logs, thresholds),
    ]
    .into_iter()
    .flatten()
    .collect();

    log::debug!("Session {}: {} fault(s)", session.id, reports.len());
    reports
}

/// Run `analyze` per session against its own logs (sorted by `created_at`)
pub fn analyze_all(sessions: &[ChargingSession], logs: &[ChargingRecord]) -> Vec<SessionAnalysis> {
    analyze_all_at(sessions, logs, &RuleThresholds::default(), Utc::now())
}

/// `analyze_all` with explicit thresholds and clock. The clock only closes
/// open logs for the per-log summary; fault reports never depend on it.
pub fn analyze_all_at(
    sessions: &[ChargingSession],
    logs: &[ChargingRecord],
    thresholds: &RuleThresholds,
    now: DateTime<Utc>,
) -> Vec<SessionAnalysis> {
    let groups = group_logs_by_session(logs);

    let results: Vec<SessionAnalysis> = sessions
        .iter()
        .map(|session| {
            let session_logs = groups.get(&session.id).map(Vec::as_slice).unwrap_or(&[]);
            SessionAnalysis {
                session_id: session.id.clone(),
                reports: analyze_with_thresholds(session, session_logs, thresholds),
                log_summary: summarize_logs_at(session_logs, now),
            }
        })
        .collect();

    let flagged = results.iter().filter(|r| r.has_faults()).count();
    log::info!("Analyzed {} session(s), {} with faults", results.len(), flagged);
    results
}

// ============================================================================
// RULES
// ============================================================================

/// A status change into anything other than charging
fn check_interruptions(logs: &[ChargingRecord]) -> Option<FaultReport> {
    let interrupted = logs
        .windows(2)
        .any(|pair| pair[1].status != pair[0].status && pair[1].status != ChargingStatus::Charging);

    interrupted.then(|| {
        FaultReport::new(
            Severity::Medium,
            INTERRUPTION_REASON,
            "Multiple charging status changes detected during session",
            INTERRUPTION_RECOMMENDATIONS,
            INTERRUPTION_CONFIDENCE,
        )
    })
}

fn check_low_power(logs: &[ChargingRecord], thresholds: &RuleThresholds) -> Option<FaultReport> {
    let readings: Vec<f64> = logs.iter().filter_map(|log| log.output_power).collect();
    if readings.is_empty() {
        return None;
    }

    let avg_power = readings.iter().sum::<f64>() / readings.len() as f64;
    (avg_power < thresholds.low_power_kw).then(|| {
        FaultReport::new(
            Severity::High,
            LOW_POWER_REASON,
            format!(
                "Average power output ({:.2} kW) is below expected threshold",
                avg_power
            ),
            LOW_POWER_RECOMMENDATIONS,
            LOW_POWER_CONFIDENCE,
        )
    })
}

/// Silent when the session window is missing or empty
fn check_slow_charging(
    session: &ChargingSession,
    logs: &[ChargingRecord],
    thresholds: &RuleThresholds,
) -> Option<FaultReport> {
    let readings: Vec<f64> = logs.iter().filter_map(|log| log.battery_level).collect();
    let (first, last) = match readings.as_slice() {
        [first, .., last] => (*first, *last),
        _ => return None,
    };

    let hours = session.duration_hours().filter(|h| h.is_finite() && *h > 0.0)?;
    let rate = (last - first) / hours;

    (rate < thresholds.slow_rate_pct_per_hour).then(|| {
        FaultReport::new(
            Severity::Medium,
            SLOW_RATE_REASON,
            format!(
                "Battery charging rate ({:.2}% per hour) is unusually slow",
                rate
            ),
            SLOW_RATE_RECOMMENDATIONS,
            SLOW_RATE_CONFIDENCE,
        )
    })
}
