//! Feature Layout - Charging feature schema
//!
//! The order of `Feature::ALL` is the order of every vector the model sees.
//! Any add, remove or reorder bumps `FEATURE_VERSION`; saved models carry
//! the version and a CRC32 of the names and are refused on mismatch.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const FEATURE_VERSION: u8 = 1;

pub const FEATURE_COUNT: usize = 5;

// ============================================================================
// FEATURES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Wh per minute, scaled from [0, 100]
    ConsumptionRate = 0,
    /// Output power / 10 kW, not clamped above
    Power = 1,
    /// Session minutes, scaled from [0, 240]
    Duration = 2,
    /// Start → sync minutes, scaled from [0, 60]
    SyncDelay = 3,
    /// State of charge / 100, 0.5 when unknown
    BatteryLevel = 4,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::ConsumptionRate,
        Feature::Power,
        Feature::Duration,
        Feature::SyncDelay,
        Feature::BatteryLevel,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        FEATURE_LAYOUT[self.index()]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

pub const FEATURE_LAYOUT: [&str; FEATURE_COUNT] = [
    "consumption_rate",
    "power_normalized",
    "duration_normalized",
    "sync_delay_normalized",
    "battery_level",
];

pub const IDX_CONSUMPTION_RATE: usize = Feature::ConsumptionRate as usize;
pub const IDX_POWER: usize = Feature::Power as usize;
pub const IDX_DURATION: usize = Feature::Duration as usize;
pub const IDX_SYNC_DELAY: usize = Feature::SyncDelay as usize;
pub const IDX_BATTERY_LEVEL: usize = Feature::BatteryLevel as usize;

/// CRC32 of the version byte and the NUL-terminated names
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);
    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(b"\0");
    }
    hasher.finalize()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Layout stamp stored alongside a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("feature layout mismatch: built for v{found_version} ({found_hash:08x}), this build uses v{expected_version} ({expected_hash:08x})")]
pub struct LayoutMismatchError {
    pub found_version: u8,
    pub found_hash: u32,
    pub expected_version: u8,
    pub expected_hash: u32,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_names: FEATURE_LAYOUT.iter().map(|name| name.to_string()).collect(),
        }
    }

    /// Ok when this stamp matches the layout compiled into this build
    pub fn check(&self) -> Result<(), LayoutMismatchError> {
        let expected_hash = layout_hash();
        if self.version == FEATURE_VERSION && self.hash == expected_hash {
            Ok(())
        } else {
            Err(LayoutMismatchError {
                found_version: self.version,
                found_hash: self.hash,
                expected_version: FEATURE_VERSION,
                expected_hash,
            })
        }
    }
}
