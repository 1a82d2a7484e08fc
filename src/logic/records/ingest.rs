//! Ingestion Boundary
//!
//! Parses session/log exports (JSON arrays or CSV with headers) into typed
//! records. Validation is all-or-nothing: the first invalid row fails the
//! whole batch with the row, the record id and the offending field set.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use super::types::{ChargingRecord, ChargingSession, ChargingStatus};
use crate::logic::error::{FaultError, FaultResult};

// ============================================================================
// FORMAT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Json,
    Csv,
}

impl RecordFormat {
    /// Pick the format from a file extension (`.csv` → CSV, anything else → JSON)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => RecordFormat::Csv,
            _ => RecordFormat::Json,
        }
    }
}

// ============================================================================
// RAW ROWS (pre-validation)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLogRow {
    id: Option<String>,
    created_at: Option<String>,
    started_at: Option<String>,
    stopped_at: Option<String>,
    sync_at: Option<String>,
    external_id: Option<String>,
    status: Option<String>,
    raw_status: Option<String>,
    connector_status: Option<String>,
    raw_connector_status: Option<String>,
    consumption: Option<f64>,
    output_power: Option<f64>,
    battery_level: Option<f64>,
    license_plate_number: Option<String>,
    car_model: Option<String>,
    session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSessionRow {
    id: Option<String>,
    status: Option<String>,
    started_at: Option<String>,
    stopped_at: Option<String>,
    consumption: Option<f64>,
    battery_level: Option<f64>,
    /// Milliseconds
    duration: Option<f64>,
}

// ============================================================================
// ROW VALIDATOR
// ============================================================================

/// Collects every offending field of one row before failing
#[derive(Default)]
struct RowValidator {
    fields: Vec<String>,
    reasons: Vec<String>,
}

impl RowValidator {
    fn reject(&mut self, field: &str, reason: &str) {
        self.fields.push(field.to_string());
        self.reasons.push(format!("{} {}", field, reason));
    }

    fn text(&mut self, field: &str, value: Option<String>) -> String {
        match value {
            Some(v) if !v.trim().is_empty() => v,
            _ => {
                self.reject(field, "is missing");
                String::new()
            }
        }
    }

    fn timestamp(&mut self, field: &str, value: Option<String>) -> DateTime<Utc> {
        match non_empty(value) {
            None => {
                self.reject(field, "is missing");
                DateTime::<Utc>::default()
            }
            Some(raw) => self.parse_timestamp(field, &raw).unwrap_or_default(),
        }
    }

    fn optional_timestamp(&mut self, field: &str, value: Option<String>) -> Option<DateTime<Utc>> {
        non_empty(value).and_then(|raw| self.parse_timestamp(field, &raw))
    }

    fn parse_timestamp(&mut self, field: &str, raw: &str) -> Option<DateTime<Utc>> {
        match parse_timestamp(raw) {
            Some(ts) => Some(ts),
            None => {
                self.reject(field, "is not a valid timestamp");
                None
            }
        }
    }

    fn measurement(&mut self, field: &str, value: Option<f64>, min: f64, max: f64) -> Option<f64> {
        match value {
            Some(v) if !v.is_finite() => {
                self.reject(field, "is not a finite number");
                None
            }
            Some(v) if v < min || v > max => {
                self.reject(field, "is out of range");
                None
            }
            other => other,
        }
    }

    fn finish(self, context: String) -> FaultResult<()> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(FaultError::validation(context, self.fields, self.reasons.join("; ")))
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// RFC 3339 first, then naive `YYYY-MM-DD[T ]HH:MM:SS[.fff]` read as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn row_context(kind: &str, index: usize, id: Option<&str>) -> String {
    match id {
        Some(id) if !id.trim().is_empty() => format!("{} row {} (id {})", kind, index, id),
        _ => format!("{} row {}", kind, index),
    }
}

// ============================================================================
// LOG VALIDATION
// ============================================================================

fn validate_log(row: RawLogRow, index: usize) -> FaultResult<ChargingRecord> {
    let context = row_context("log", index, row.id.as_deref());
    let mut v = RowValidator::default();

    let id = v.text("id", row.id);
    let created_at = v.timestamp("created_at", row.created_at);
    let started_at = v.timestamp("started_at", row.started_at);
    let stopped_at = v.optional_timestamp("stopped_at", row.stopped_at);
    let sync_at = v.timestamp("sync_at", row.sync_at);
    let status = v.text("status", row.status);
    let session_id = v.text("session_id", row.session_id);
    let consumption = v.measurement("consumption", row.consumption, 0.0, f64::MAX);
    let output_power = v.measurement("output_power", row.output_power, f64::MIN, f64::MAX);
    let battery_level = v.measurement("battery_level", row.battery_level, 0.0, 100.0);

    v.finish(context)?;

    Ok(ChargingRecord {
        id,
        created_at,
        started_at,
        stopped_at,
        sync_at,
        external_id: row.external_id.unwrap_or_default(),
        status: ChargingStatus::from(status),
        connector_status: non_empty(row.connector_status),
        consumption,
        output_power,
        battery_level,
        session_id,
        raw_status: non_empty(row.raw_status),
        raw_connector_status: non_empty(row.raw_connector_status),
        license_plate_number: non_empty(row.license_plate_number),
        car_model: non_empty(row.car_model),
    })
}

fn validate_logs(rows: Vec<RawLogRow>) -> FaultResult<Vec<ChargingRecord>> {
    if rows.is_empty() {
        return Err(FaultError::validation("logs", Vec::new(), "no log records"));
    }
    let records = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| validate_log(row, i))
        .collect::<FaultResult<Vec<_>>>()?;

    log::debug!("Validated {} log records", records.len());
    Ok(records)
}

// ============================================================================
// SESSION VALIDATION
// ============================================================================

fn validate_session(row: RawSessionRow, index: usize) -> FaultResult<ChargingSession> {
    let context = row_context("session", index, row.id.as_deref());
    let mut v = RowValidator::default();

    let id = v.text("id", row.id);
    let status = v.text("status", row.status);
    let started_at = v.optional_timestamp("started_at", row.started_at);
    let stopped_at = v.optional_timestamp("stopped_at", row.stopped_at);
    let consumption = v.measurement("consumption", row.consumption, 0.0, f64::MAX);
    let battery_level = v.measurement("battery_level", row.battery_level, 0.0, 100.0);
    let duration = v.measurement("duration", row.duration, 0.0, f64::MAX);

    v.finish(context)?;

    let duration_ms = match (duration, started_at, stopped_at) {
        (Some(ms), _, _) => ms as i64,
        (None, Some(start), Some(stop)) => (stop - start).num_milliseconds().max(0),
        _ => 0,
    };

    Ok(ChargingSession {
        id,
        status: ChargingStatus::from(status),
        started_at,
        stopped_at,
        battery_level,
        consumption,
        duration_ms,
    })
}

fn validate_sessions(rows: Vec<RawSessionRow>) -> FaultResult<Vec<ChargingSession>> {
    if rows.is_empty() {
        return Err(FaultError::validation("sessions", Vec::new(), "no session records"));
    }
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| validate_session(row, i))
        .collect()
}

// ============================================================================
// PUBLIC PARSERS
// ============================================================================

pub fn parse_logs_json(input: &str) -> FaultResult<Vec<ChargingRecord>> {
    let rows: Vec<RawLogRow> = serde_json::from_str(input)
        .map_err(|e| FaultError::validation("logs JSON", Vec::new(), e.to_string()))?;
    validate_logs(rows)
}

pub fn parse_logs_csv(input: &str) -> FaultResult<Vec<ChargingRecord>> {
    validate_logs(read_csv(input, "logs CSV")?)
}

pub fn parse_sessions_json(input: &str) -> FaultResult<Vec<ChargingSession>> {
    let rows: Vec<RawSessionRow> = serde_json::from_str(input)
        .map_err(|e| FaultError::validation("sessions JSON", Vec::new(), e.to_string()))?;
    validate_sessions(rows)
}

pub fn parse_sessions_csv(input: &str) -> FaultResult<Vec<ChargingSession>> {
    validate_sessions(read_csv(input, "sessions CSV")?)
}

pub fn parse_logs(input: &str, format: RecordFormat) -> FaultResult<Vec<ChargingRecord>> {
    match format {
        RecordFormat::Json => parse_logs_json(input),
        RecordFormat::Csv => parse_logs_csv(input),
    }
}

pub fn parse_sessions(input: &str, format: RecordFormat) -> FaultResult<Vec<ChargingSession>> {
    match format {
        RecordFormat::Json => parse_sessions_json(input),
        RecordFormat::Csv => parse_sessions_csv(input),
    }
}

fn read_csv<T: for<'de> Deserialize<'de>>(input: &str, context: &str) -> FaultResult<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input.as_bytes());

    reader
        .deserialize::<T>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| FaultError::validation(context, Vec::new(), e.to_string()))
}
