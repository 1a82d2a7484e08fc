//! Energy Feature Extraction
//!
//! Consumption rate, output power and state of charge.

use super::layout::Feature;
use super::normalizer::{sanitize, scale_to_unit};
use super::vector::{FeatureExtractor, FeatureVector};
use crate::logic::records::ChargingRecord;

/// Consumption rate scale upper bound (Wh per minute)
pub const MAX_CONSUMPTION_RATE: f64 = 100.0;

/// Output power divisor (W)
pub const POWER_SCALE: f64 = 10_000.0;

/// Stand-in for an unknown state of charge
pub const UNKNOWN_BATTERY_LEVEL: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnergyFeatures {
    /// Null consumption counts as 0
    pub consumption_wh: f64,
    pub duration_minutes: i64,
    pub output_power_w: Option<f64>,
    pub battery_level: Option<f64>,
}

impl EnergyFeatures {
    pub fn from_record(record: &ChargingRecord, duration_minutes: i64) -> Self {
        Self {
            consumption_wh: record.consumption.unwrap_or(0.0),
            duration_minutes,
            output_power_w: record.output_power,
            battery_level: record.battery_level,
        }
    }

    /// Wh per minute; 0 for an empty duration
    pub fn consumption_rate(&self) -> f64 {
        if self.duration_minutes > 0 {
            self.consumption_wh / self.duration_minutes as f64
        } else {
            0.0
        }
    }

    /// Not clamped above: values > 1 signal instability downstream
    pub fn power_normalized(&self) -> f32 {
        match self.output_power_w {
            Some(watts) => sanitize((watts / POWER_SCALE).max(0.0) as f32),
            None => 0.0,
        }
    }

    pub fn battery_normalized(&self) -> f32 {
        match self.battery_level {
            Some(level) => scale_to_unit(level, 0.0, 100.0),
            None => UNKNOWN_BATTERY_LEVEL,
        }
    }
}

impl FeatureExtractor for EnergyFeatures {
    fn extract(&self, vector: &mut FeatureVector) {
        vector.set_feature(
            Feature::ConsumptionRate,
            scale_to_unit(self.consumption_rate(), 0.0, MAX_CONSUMPTION_RATE),
        );
        vector.set_feature(Feature::Power, self.power_normalized());
        vector.set_feature(Feature::BatteryLevel, self.battery_normalized());
    }
}
