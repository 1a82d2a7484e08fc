//! Records Module - Typed Charging Telemetry
//!
//! Session and log records, the ingestion boundary (CSV/JSON with
//! all-or-nothing validation) and per-session aggregation.

pub mod types;
pub mod ingest;
pub mod session;

#[cfg(test)]
mod tests;

pub use types::{ChargingRecord, ChargingSession, ChargingStatus};
pub use ingest::{
    parse_logs, parse_logs_csv, parse_logs_json, parse_sessions, parse_sessions_csv,
    parse_sessions_json, parse_timestamp, RecordFormat,
};
pub use session::{group_logs_by_session, logs_for_session};
