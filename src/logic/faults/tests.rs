//! Rule analyzer scenarios

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::log_analysis::{power_stability, MIN_POWER_STABILITY};
use super::rules::*;
use super::*;
use crate::logic::records::{ChargingRecord, ChargingSession};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 20, 10, 0, 0).unwrap()
}

fn log_at(index: i64, status: &str) -> ChargingRecord {
    ChargingRecord::new(format!("log-{}", index), "s-1", start(), status)
        .with_created_at(start() + Duration::minutes(5 * index))
}

fn two_hour_session() -> ChargingSession {
    ChargingSession::new("s-1", "finished").with_window(start(), start() + Duration::hours(2))
}

#[test]
fn test_interruption_without_low_power() {
    let logs: Vec<ChargingRecord> = (0..12)
        .map(|i| {
            if i == 5 {
                log_at(i, "Error").with_output_power(0.0)
            } else {
                log_at(i, "Charging").with_output_power(7.4)
            }
        })
        .collect();

    let reports = analyze(&two_hour_session(), &logs);

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].reason, INTERRUPTION_REASON);
    assert_eq!(reports[0].severity, Severity::Medium);
    assert_eq!(reports[0].confidence, 85);
    assert_eq!(reports[0].recommendations.len(), 3);
}

#[test]
fn test_low_power_reported_with_average() {
    let logs: Vec<ChargingRecord> = (0..4)
        .map(|i| log_at(i, "Charging").with_output_power(1.0))
        .collect();

    let reports = analyze(&two_hour_session(), &logs);

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].reason, LOW_POWER_REASON);
    assert_eq!(reports[0].severity, Severity::High);
    assert_eq!(reports[0].confidence, 90);
    assert!(reports[0].description.contains("1.00"));
}

#[test]
fn test_normal_battery_rate_not_reported() {
    let logs = vec![
        log_at(0, "Charging").with_battery_level(20.0),
        log_at(1, "Charging"),
        log_at(2, "Charging").with_battery_level(85.0),
    ];

    let reports = analyze(&two_hour_session(), &logs);
    assert!(reports.is_empty());
}

#[test]
fn test_slow_rate_reported() {
    let logs = vec![
        log_at(0, "Charging").with_battery_level(20.0),
        log_at(1, "Charging").with_battery_level(30.0),
    ];

    let reports = analyze(&two_hour_session(), &logs);

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].reason, SLOW_RATE_REASON);
    assert_eq!(reports[0].confidence, 75);
    assert!(reports[0].description.contains("5.00% per hour"));
}

#[test]
fn test_slow_rate_silent_without_window() {
    let logs = vec![
        log_at(0, "Charging").with_battery_level(20.0),
        log_at(1, "Charging").with_battery_level(21.0),
    ];

    let open = ChargingSession::new("s-1", "charging");
    assert!(analyze(&open, &logs).is_empty());

    let empty = ChargingSession::new("s-1", "finished").with_window(start(), start());
    assert!(analyze(&empty, &logs).is_empty());
}

#[test]
fn test_rules_emitted_in_order() {
    let logs = vec![
        log_at(0, "Charging").with_output_power(1.0).with_battery_level(20.0),
        log_at(1, "Finished").with_output_power(1.0).with_battery_level(22.0),
    ];

    let reports = analyze(&two_hour_session(), &logs);
    let reasons: Vec<&str> = reports.iter().map(|r| r.reason.as_str()).collect();
    assert_eq!(reasons, vec![INTERRUPTION_REASON, LOW_POWER_REASON, SLOW_RATE_REASON]);
}

#[test]
fn test_analyze_is_idempotent() {
    let logs = vec![
        log_at(0, "Charging").with_output_power(2.0).with_battery_level(20.0),
        log_at(1, "Error").with_output_power(0.5).with_battery_level(21.0),
    ];
    let session = two_hour_session();

    assert_eq!(analyze(&session, &logs), analyze(&session, &logs));
}

#[test]
fn test_no_logs_no_reports() {
    assert!(analyze(&two_hour_session(), &[]).is_empty());
}

#[test]
fn test_thresholds_presets() {
    let logs = vec![log_at(0, "Charging").with_output_power(4.0)];
    let session = two_hour_session();

    assert!(analyze(&session, &logs).is_empty());
    let reports = analyze_with_thresholds(&session, &logs, &RuleThresholds::high_sensitivity());
    assert_eq!(reports.len(), 1);
}

#[test]
fn test_analyze_all_groups_logs_per_session() {
    let mut logs = vec![log_at(1, "Error"), log_at(0, "Charging")];
    logs.push(
        ChargingRecord::new("other", "s-2", start(), "Charging").with_output_power(7.4),
    );

    let sessions = vec![two_hour_session(), ChargingSession::new("s-2", "charging")];
    let results = analyze_all(&sessions, &logs);

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].session_id, "s-1");
    // logs re-sorted by created_at before the interruption check
    assert_eq!(results[0].reports.len(), 1);
    assert_eq!(results[0].max_severity(), Some(Severity::Medium));
    assert!(!results[1].has_faults());
}

#[test]
fn test_status_case_only_change_is_not_interruption() {
    // Statuses compare after case folding: "Charging" then "charging" is one status
    let logs = vec![
        log_at(0, "Charging").with_output_power(7.4),
        log_at(1, "charging").with_output_power(7.4),
        log_at(2, "CHARGING").with_output_power(7.4),
    ];
    assert!(analyze(&two_hour_session(), &logs).is_empty());

    let logs = vec![log_at(0, "Charging"), log_at(1, "FINISHED")];
    let reports = analyze(&two_hour_session(), &logs);
    assert_eq!(reports[0].reason, INTERRUPTION_REASON);
}

// ============================================================================
// PER-LOG ANALYTICS
// ============================================================================

fn healthy_log(status: &str) -> ChargingRecord {
    ChargingRecord::new("log-h", "s-1", start(), status)
        .with_stopped_at(start() + Duration::minutes(60))
        .with_consumption(6000.0)
        .with_output_power(7000.0)
}

#[test]
fn test_power_stability_scale() {
    assert_eq!(power_stability(Some(7000.0)), 1.0);
    assert_eq!(power_stability(Some(8500.0)), 0.5);
    assert!((power_stability(Some(5000.0)) - 1.0 / 3.0).abs() < 1e-9);
    assert_eq!(power_stability(Some(11_000.0)), 0.0);
    assert_eq!(power_stability(Some(0.0)), 0.0);
    assert_eq!(power_stability(None), 0.0);
}

#[test]
fn test_healthy_log_is_normal() {
    let analysis = analyze_log_at(&healthy_log("charging"), start());

    assert_eq!(analysis.duration_minutes, 60);
    assert_eq!(analysis.consumption_rate, 100.0);
    assert_eq!(analysis.power_stability, 1.0);
    assert!(analysis.has_time_sync);
    assert_eq!(analysis.status, LogStatus::Normal);
}

#[test]
fn test_charging_without_consumption_is_anomaly() {
    let mut log = healthy_log("charging");
    log.consumption = None;
    assert!(analyze_log_at(&log, start()).is_anomaly());

    // the same flat rate is fine once the session finished
    let mut finished = healthy_log("finished");
    finished.consumption = None;
    assert!(!analyze_log_at(&finished, start()).is_anomaly());
}

#[test]
fn test_unstable_power_is_anomaly() {
    let log = healthy_log("charging").with_output_power(5000.0);
    let analysis = analyze_log_at(&log, start());
    assert!(analysis.power_stability < MIN_POWER_STABILITY);
    assert!(analysis.is_anomaly());

    // exactly at the stability floor stays normal
    let edge = healthy_log("charging").with_output_power(8500.0);
    assert!(!analyze_log_at(&edge, start()).is_anomaly());
}

#[test]
fn test_missing_or_zero_power_is_anomaly() {
    let mut missing = healthy_log("charging");
    missing.output_power = None;
    let analysis = analyze_log_at(&missing, start());
    assert_eq!(analysis.power_stability, 0.0);
    assert!(analysis.is_anomaly());

    let zero = healthy_log("charging").with_output_power(0.0);
    assert_eq!(analyze_log_at(&zero, start()).power_stability, 0.0);
    assert!(analyze_log_at(&zero, start()).is_anomaly());
}

#[test]
fn test_excess_power_is_anomaly() {
    let log = healthy_log("charging").with_output_power(10_500.0);
    assert!(analyze_log_at(&log, start()).is_anomaly());
}

#[test]
fn test_finished_with_zero_consumption_is_anomaly() {
    let log = healthy_log("finished").with_consumption(0.0);
    assert!(analyze_log_at(&log, start()).is_anomaly());
    assert!(!analyze_log_at(&healthy_log("finished"), start()).is_anomaly());
}

#[test]
fn test_time_sync_window() {
    let synced = healthy_log("charging").with_sync_at(start() + Duration::seconds(299));
    assert!(analyze_log_at(&synced, start()).has_time_sync);

    let late = healthy_log("charging").with_sync_at(start() + Duration::minutes(5));
    assert!(!analyze_log_at(&late, start()).has_time_sync);

    let early = healthy_log("charging").with_sync_at(start() - Duration::minutes(6));
    assert!(!analyze_log_at(&early, start()).has_time_sync);
}

#[test]
fn test_open_log_runs_until_clock() {
    let log = ChargingRecord::new("open", "s-1", start(), "charging")
        .with_consumption(3000.0)
        .with_output_power(7200.0);

    let analysis = analyze_log_at(&log, start() + Duration::minutes(30));
    assert_eq!(analysis.duration_minutes, 30);
    assert_eq!(analysis.consumption_rate, 100.0);
    assert!(!analysis.is_anomaly());
}

#[test]
fn test_session_log_summary() {
    let logs = vec![
        healthy_log("charging"),
        healthy_log("charging").with_output_power(12_000.0),
        healthy_log("finished").with_sync_at(start() + Duration::minutes(20)),
    ];
    let results = analyze_all_at(
        &[two_hour_session()],
        &logs,
        &RuleThresholds::default(),
        start(),
    );

    let summary = results[0].log_summary;
    assert_eq!(summary.total_logs, 3);
    assert_eq!(summary.anomalous_logs, 1);
    assert_eq!(summary.unsynced_logs, 1);
    assert!((summary.anomaly_rate() - 1.0 / 3.0).abs() < 1e-9);
    assert_eq!(LogSummary::default().anomaly_rate(), 0.0);
}
