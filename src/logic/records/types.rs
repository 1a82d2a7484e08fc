//! Record Types
//!
//! Typed charging telemetry. Optional fields are explicit `Option`s,
//! validated once at the ingestion boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// CHARGING STATUS
// ============================================================================

/// Session / log status. Parsed case-insensitively; unknown values kept raw.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChargingStatus {
    Charging,
    Finished,
    Error,
    Other(String),
}

impl ChargingStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ChargingStatus::Charging => "charging",
            ChargingStatus::Finished => "finished",
            ChargingStatus::Error => "error",
            ChargingStatus::Other(raw) => raw.as_str(),
        }
    }
}

impl From<String> for ChargingStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "charging" => ChargingStatus::Charging,
            "finished" => ChargingStatus::Finished,
            "error" => ChargingStatus::Error,
            _ => ChargingStatus::Other(raw),
        }
    }
}

impl From<&str> for ChargingStatus {
    fn from(raw: &str) -> Self {
        ChargingStatus::from(raw.to_string())
    }
}

impl From<ChargingStatus> for String {
    fn from(status: ChargingStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for ChargingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// CHARGING RECORD (one log row)
// ============================================================================

/// One telemetry sample within a session. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargingRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub sync_at: DateTime<Utc>,
    pub external_id: String,
    pub status: ChargingStatus,
    pub connector_status: Option<String>,
    /// Cumulative energy delivered (Wh)
    pub consumption: Option<f64>,
    /// Instantaneous output power (W)
    pub output_power: Option<f64>,
    /// State of charge (0-100)
    pub battery_level: Option<f64>,
    pub session_id: String,

    // Descriptive fields, carried through untouched
    #[serde(default)]
    pub raw_status: Option<String>,
    #[serde(default)]
    pub raw_connector_status: Option<String>,
    #[serde(default)]
    pub license_plate_number: Option<String>,
    #[serde(default)]
    pub car_model: Option<String>,
}

impl ChargingRecord {
    /// Minimal record; `created_at` and `sync_at` default to `started_at`
    pub fn new(
        id: impl Into<String>,
        session_id: impl Into<String>,
        started_at: DateTime<Utc>,
        status: impl Into<ChargingStatus>,
    ) -> Self {
        Self {
            id: id.into(),
            created_at: started_at,
            started_at,
            stopped_at: None,
            sync_at: started_at,
            external_id: String::new(),
            status: status.into(),
            connector_status: None,
            consumption: None,
            output_power: None,
            battery_level: None,
            session_id: session_id.into(),
            raw_status: None,
            raw_connector_status: None,
            license_plate_number: None,
            car_model: None,
        }
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    pub fn with_stopped_at(mut self, at: DateTime<Utc>) -> Self {
        self.stopped_at = Some(at);
        self
    }

    pub fn with_sync_at(mut self, at: DateTime<Utc>) -> Self {
        self.sync_at = at;
        self
    }

    pub fn with_consumption(mut self, wh: f64) -> Self {
        self.consumption = Some(wh);
        self
    }

    pub fn with_output_power(mut self, watts: f64) -> Self {
        self.output_power = Some(watts);
        self
    }

    pub fn with_battery_level(mut self, level: f64) -> Self {
        self.battery_level = Some(level);
        self
    }

    /// Exact (fractional) minutes between session start and sync
    pub fn sync_delay_minutes_exact(&self) -> f64 {
        (self.sync_at - self.started_at).num_milliseconds() as f64 / 60_000.0
    }
}

// ============================================================================
// CHARGING SESSION (aggregate)
// ============================================================================

/// Aggregate over one charging episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargingSession {
    pub id: String,
    pub status: ChargingStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
    /// Final state of charge (0-100)
    pub battery_level: Option<f64>,
    /// Total energy delivered (Wh)
    pub consumption: Option<f64>,
    pub duration_ms: i64,
}

impl ChargingSession {
    pub fn new(id: impl Into<String>, status: impl Into<ChargingStatus>) -> Self {
        Self {
            id: id.into(),
            status: status.into(),
            started_at: None,
            stopped_at: None,
            battery_level: None,
            consumption: None,
            duration_ms: 0,
        }
    }

    /// Set start/stop and the derived duration
    pub fn with_window(mut self, started_at: DateTime<Utc>, stopped_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self.stopped_at = Some(stopped_at);
        self.duration_ms = (stopped_at - started_at).num_milliseconds().max(0);
        self
    }

    /// Hours between start and stop; `None` when either bound is missing
    pub fn duration_hours(&self) -> Option<f64> {
        match (self.started_at, self.stopped_at) {
            (Some(start), Some(stop)) => Some((stop - start).num_milliseconds() as f64 / 3_600_000.0),
            _ => None,
        }
    }
}
