//! Fault Rules & Thresholds
//!
//! Constants, static recommendation text and tunable thresholds.
//! No analysis logic here.

use serde::{Deserialize, Serialize};

// ============================================================================
// THRESHOLDS (Constants)
// ============================================================================

/// Mean output power below this (kW) = Low Power Output
pub const LOW_POWER_THRESHOLD_KW: f64 = 3.0;

/// Battery gain below this (% per hour) = Slow Charging Rate
pub const SLOW_RATE_THRESHOLD_PCT_PER_HOUR: f64 = 10.0;

// ============================================================================
// CONFIDENCE
// ============================================================================

pub const INTERRUPTION_CONFIDENCE: u8 = 85;
pub const LOW_POWER_CONFIDENCE: u8 = 90;
pub const SLOW_RATE_CONFIDENCE: u8 = 75;

// ============================================================================
// REPORT TEXT
// ============================================================================

pub const INTERRUPTION_REASON: &str = "Charging Interruptions";
pub const LOW_POWER_REASON: &str = "Low Power Output";
pub const SLOW_RATE_REASON: &str = "Slow Charging Rate";

pub const INTERRUPTION_RECOMMENDATIONS: &[&str] = &[
    "Inspect charging equipment for malfunctions",
    "Check vehicle charging system",
    "Review power supply stability",
];

pub const LOW_POWER_RECOMMENDATIONS: &[&str] = &[
    "Check charger specifications",
    "Verify grid connection capacity",
    "Inspect for voltage drops",
];

pub const SLOW_RATE_RECOMMENDATIONS: &[&str] = &[
    "Check vehicle charging settings",
    "Verify charger-vehicle compatibility",
    "Inspect for thermal throttling",
];

// ============================================================================
// CONFIGURABLE THRESHOLDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleThresholds {
    pub low_power_kw: f64,
    pub slow_rate_pct_per_hour: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            low_power_kw: LOW_POWER_THRESHOLD_KW,
            slow_rate_pct_per_hour: SLOW_RATE_THRESHOLD_PCT_PER_HOUR,
        }
    }
}

impl RuleThresholds {
    /// Flags marginal sessions too
    pub fn high_sensitivity() -> Self {
        Self {
            low_power_kw: 5.0,
            slow_rate_pct_per_hour: 15.0,
        }
    }

    /// Only clearly broken sessions
    pub fn low_sensitivity() -> Self {
        Self {
            low_power_kw: 1.5,
            slow_rate_pct_per_hour: 5.0,
        }
    }
}
