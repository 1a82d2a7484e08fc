//! Heuristic Labels
//!
//! Training targets are multi-hot: every category whose heuristic fires
//! gets a 1. Evaluation uses a single priority-ordered class instead
//! (see `primary_category`); the two are intentionally kept separate.

use serde::{Deserialize, Serialize};

use crate::logic::records::{ChargingRecord, ChargingStatus};

// ============================================================================
// CATEGORIES
// ============================================================================

pub const LABEL_COUNT: usize = 4;

pub type LabelVector = [f32; LABEL_COUNT];

/// Output channel order of the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultCategory {
    ConsumptionAnomaly,
    PowerInstability,
    SyncDelay,
    SessionInterruption,
}

impl FaultCategory {
    pub const ALL: [FaultCategory; LABEL_COUNT] = [
        FaultCategory::ConsumptionAnomaly,
        FaultCategory::PowerInstability,
        FaultCategory::SyncDelay,
        FaultCategory::SessionInterruption,
    ];

    pub fn index(&self) -> usize {
        match self {
            FaultCategory::ConsumptionAnomaly => 0,
            FaultCategory::PowerInstability => 1,
            FaultCategory::SyncDelay => 2,
            FaultCategory::SessionInterruption => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FaultCategory::ConsumptionAnomaly => "consumption_anomaly",
            FaultCategory::PowerInstability => "power_instability",
            FaultCategory::SyncDelay => "sync_delay",
            FaultCategory::SessionInterruption => "session_interruption",
        }
    }
}

impl std::fmt::Display for FaultCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// THRESHOLDS
// ============================================================================

/// Consumption above this (Wh) is anomalous
pub const HIGH_CONSUMPTION_WH: f64 = 5000.0;

/// A finished session below this (Wh) is anomalous
pub const MIN_FINISHED_CONSUMPTION_WH: f64 = 10.0;

pub const NOMINAL_POWER_W: f64 = 7000.0;
pub const POWER_TOLERANCE_W: f64 = 1000.0;

/// Start → sync delay above this (minutes) is anomalous
pub const MAX_SYNC_DELAY_MINUTES: f64 = 30.0;

// ============================================================================
// HEURISTICS
// ============================================================================
// Null consumption never compares: every condition on it is false.

fn consumption_is_zero(record: &ChargingRecord) -> bool {
    record.consumption == Some(0.0)
}

pub fn is_consumption_anomaly(record: &ChargingRecord) -> bool {
    let consumption = record.consumption;
    (record.status == ChargingStatus::Charging && consumption_is_zero(record))
        || consumption.is_some_and(|c| c > HIGH_CONSUMPTION_WH)
        || (record.status == ChargingStatus::Finished
            && consumption.is_some_and(|c| c < MIN_FINISHED_CONSUMPTION_WH))
}

pub fn is_power_instability(record: &ChargingRecord) -> bool {
    record
        .output_power
        .is_some_and(|p| (p - NOMINAL_POWER_W).abs() > POWER_TOLERANCE_W)
}

/// Exact fractional minutes, not truncated
pub fn is_sync_delay(record: &ChargingRecord) -> bool {
    record.sync_delay_minutes_exact() > MAX_SYNC_DELAY_MINUTES
}

pub fn is_session_interruption(record: &ChargingRecord) -> bool {
    record.status == ChargingStatus::Charging
        && record.stopped_at.is_some()
        && consumption_is_zero(record)
}

/// Multi-hot training target
pub fn derive_labels(record: &ChargingRecord) -> LabelVector {
    let flag = |hit: bool| if hit { 1.0 } else { 0.0 };
    [
        flag(is_consumption_anomaly(record)),
        flag(is_power_instability(record)),
        flag(is_sync_delay(record)),
        flag(is_session_interruption(record)),
    ]
}

// ============================================================================
// EVALUATION CLASS
// ============================================================================

/// Single label for evaluation, first match wins.
///
/// Narrower than the training heuristics: only the charging-with-zero
/// consumption case counts as a consumption anomaly, a zero power reading
/// is treated as absent, and an interruption only needs a stop time.
pub fn primary_category(record: &ChargingRecord) -> Option<FaultCategory> {
    let charging = record.status == ChargingStatus::Charging;

    if charging && consumption_is_zero(record) {
        return Some(FaultCategory::ConsumptionAnomaly);
    }
    if record
        .output_power
        .is_some_and(|p| p != 0.0 && (p - NOMINAL_POWER_W).abs() > POWER_TOLERANCE_W)
    {
        return Some(FaultCategory::PowerInstability);
    }
    if is_sync_delay(record) {
        return Some(FaultCategory::SyncDelay);
    }
    if charging && record.stopped_at.is_some() {
        return Some(FaultCategory::SessionInterruption);
    }
    None
}

/// Class index compared against the predicted arg-max; "none" shares index 0
pub fn actual_class_index(record: &ChargingRecord) -> usize {
    primary_category(record).map_or(0, |category| category.index())
}
