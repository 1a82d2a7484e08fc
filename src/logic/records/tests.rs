use super::*;
use crate::logic::error::FaultError;
use chrono::{Duration, TimeZone, Utc};
use std::path::Path;

const LOGS_JSON: &str = r#"[
  {
    "id": "log-1",
    "created_at": "2024-03-20T10:10:00Z",
    "started_at": "2024-03-20T10:00:00Z",
    "stopped_at": null,
    "sync_at": "2024-03-20T10:10:00Z",
    "external_id": "EXT001",
    "status": "Charging",
    "connector_status": "Connected",
    "consumption": 2000,
    "output_power": 7.4,
    "battery_level": 25,
    "session_id": "s-1",
    "license_plate_number": "ABC123"
  },
  {
    "id": "log-0",
    "created_at": "2024-03-20T10:00:00Z",
    "started_at": "2024-03-20T10:00:00Z",
    "stopped_at": null,
    "sync_at": "2024-03-20T10:00:00Z",
    "external_id": "EXT001",
    "status": "Charging",
    "connector_status": "Connected",
    "consumption": 0,
    "output_power": 7.4,
    "battery_level": 20,
    "session_id": "s-1"
  }
]"#;

const LOGS_CSV: &str = "\
id,created_at,started_at,stopped_at,sync_at,external_id,status,connector_status,consumption,output_power,battery_level,session_id
log-0,2024-03-20T10:00:00Z,2024-03-20T10:00:00Z,,2024-03-20T10:00:00Z,EXT001,Charging,Connected,0,7.4,20,s-1
log-1,2024-03-20 12:00:00,2024-03-20T10:00:00Z,2024-03-20T12:00:00Z,2024-03-20T12:00:00Z,EXT001,Finished,,24000,,85,s-1
";

#[test]
fn test_parse_logs_json() {
    let logs = parse_logs_json(LOGS_JSON).unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].id, "log-1");
    assert_eq!(logs[0].status, ChargingStatus::Charging);
    assert_eq!(logs[0].stopped_at, None);
    assert_eq!(logs[0].output_power, Some(7.4));
    assert_eq!(logs[0].license_plate_number.as_deref(), Some("ABC123"));
}

#[test]
fn test_parse_logs_csv_with_empty_cells() {
    let logs = parse_logs_csv(LOGS_CSV).unwrap();
    assert_eq!(logs.len(), 2);

    assert_eq!(logs[0].stopped_at, None);
    assert_eq!(logs[1].output_power, None);
    assert_eq!(logs[1].connector_status, None);
    assert_eq!(logs[1].status, ChargingStatus::Finished);
    // naive timestamp read as UTC
    assert_eq!(logs[1].created_at, Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap());
}

#[test]
fn test_missing_fields_fail_whole_batch() {
    let input = r#"[
      {"id": "ok", "created_at": "2024-03-20T10:00:00Z", "started_at": "2024-03-20T10:00:00Z",
       "sync_at": "2024-03-20T10:00:00Z", "status": "charging", "session_id": "s"},
      {"id": "bad", "created_at": "2024-03-20T10:00:00Z", "status": "charging", "session_id": "s"}
    ]"#;

    match parse_logs_json(input) {
        Err(FaultError::Validation { context, fields, .. }) => {
            assert!(context.contains("row 1"));
            assert!(context.contains("bad"));
            assert_eq!(fields, vec!["started_at".to_string(), "sync_at".to_string()]);
        }
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[test]
fn test_out_of_range_values_rejected() {
    let input = r#"[
      {"id": "x", "created_at": "2024-03-20T10:00:00Z", "started_at": "2024-03-20T10:00:00Z",
       "sync_at": "2024-03-20T10:00:00Z", "status": "charging", "session_id": "s",
       "battery_level": 140, "consumption": -5}
    ]"#;

    match parse_logs_json(input) {
        Err(FaultError::Validation { fields, .. }) => {
            assert!(fields.contains(&"battery_level".to_string()));
            assert!(fields.contains(&"consumption".to_string()));
        }
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[test]
fn test_invalid_timestamp_rejected() {
    let input = r#"[
      {"id": "x", "created_at": "yesterday", "started_at": "2024-03-20T10:00:00Z",
       "sync_at": "2024-03-20T10:00:00Z", "status": "charging", "session_id": "s"}
    ]"#;
    assert!(matches!(parse_logs_json(input), Err(FaultError::Validation { .. })));
}

#[test]
fn test_empty_batch_is_validation_error() {
    assert!(matches!(parse_logs_json("[]"), Err(FaultError::Validation { .. })));
    assert!(matches!(parse_sessions_csv("id,status\n"), Err(FaultError::Validation { .. })));
}

#[test]
fn test_parse_sessions_derives_duration() {
    let input = r#"[
      {"id": "s-1", "status": "Completed", "started_at": "2024-03-20T10:00:00Z",
       "stopped_at": "2024-03-20T12:00:00Z", "consumption": 25000, "battery_level": 80,
       "car_model": "ignored extra column"}
    ]"#;
    let sessions = parse_sessions_json(input).unwrap();
    assert_eq!(sessions[0].duration_ms, 7_200_000);
    assert_eq!(sessions[0].duration_hours(), Some(2.0));
    assert_eq!(sessions[0].status, ChargingStatus::Other("Completed".to_string()));
}

#[test]
fn test_status_case_insensitive() {
    assert_eq!(ChargingStatus::from("Charging"), ChargingStatus::Charging);
    assert_eq!(ChargingStatus::from(" FINISHED "), ChargingStatus::Finished);
    assert_eq!(ChargingStatus::from("Error").as_str(), "error");
    assert_eq!(ChargingStatus::from("Preparing").as_str(), "Preparing");
}

#[test]
fn test_record_format_from_path() {
    assert_eq!(RecordFormat::from_path(Path::new("logs.CSV")), RecordFormat::Csv);
    assert_eq!(RecordFormat::from_path(Path::new("logs.json")), RecordFormat::Json);
    assert_eq!(RecordFormat::from_path(Path::new("logs")), RecordFormat::Json);
}

#[test]
fn test_group_logs_sorted_by_created_at() {
    let logs = parse_logs_json(LOGS_JSON).unwrap();
    let groups = group_logs_by_session(&logs);
    let group = &groups["s-1"];
    assert_eq!(group[0].id, "log-0");
    assert_eq!(group[1].id, "log-1");

    let selected = logs_for_session(&logs, "s-1");
    assert_eq!(selected[0].id, "log-0");
    assert!(logs_for_session(&logs, "other").is_empty());
}

#[test]
fn test_session_from_logs() {
    let start = Utc.with_ymd_and_hms(2024, 3, 20, 10, 0, 0).unwrap();
    let logs = vec![
        ChargingRecord::new("a", "s", start, "charging")
            .with_battery_level(20.0)
            .with_consumption(100.0),
        ChargingRecord::new("b", "s", start, "finished")
            .with_created_at(start + Duration::minutes(90))
            .with_stopped_at(start + Duration::minutes(90))
            .with_consumption(9000.0),
    ];

    let session = ChargingSession::from_logs("s", &logs).unwrap();
    assert_eq!(session.status, ChargingStatus::Finished);
    assert_eq!(session.started_at, Some(start));
    assert_eq!(session.duration_ms, 90 * 60_000);
    assert_eq!(session.consumption, Some(9000.0));
    // last non-null reading
    assert_eq!(session.battery_level, Some(20.0));

    assert!(ChargingSession::from_logs("empty", &[]).is_none());
}
