//! Record Normalizer
//!
//! `ChargingRecord` → 5-component `FeatureVector`. Every component except
//! power lands in [0, 1]; nothing non-finite ever leaves this module.

use chrono::{DateTime, Utc};

use super::energy::EnergyFeatures;
use super::timing::TimingFeatures;
use super::vector::{FeatureExtractor, FeatureVector};
use crate::logic::records::ChargingRecord;

/// Linear scale from [min, max] to [0, 1], clamped. NaN maps to 0.
pub fn scale_to_unit(value: f64, min: f64, max: f64) -> f32 {
    if value.is_nan() || max <= min {
        return 0.0;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0) as f32
}

/// Replace non-finite values with 0
pub fn sanitize(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Normalize against the wall clock (open sessions run until "now")
pub fn normalize(record: &ChargingRecord) -> FeatureVector {
    normalize_at(record, Utc::now())
}

/// Normalize with an explicit clock
pub fn normalize_at(record: &ChargingRecord, now: DateTime<Utc>) -> FeatureVector {
    let timing = TimingFeatures::from_record_at(record, now);
    let energy = EnergyFeatures::from_record(record, timing.duration_minutes);

    let mut vector = FeatureVector::new();
    energy.extract(&mut vector);
    timing.extract(&mut vector);

    for value in vector.values.iter_mut() {
        *value = sanitize(*value);
    }
    log::trace!("Record {}: {}", record.id, vector.describe());
    vector
}

/// Normalize a batch against one shared clock reading
pub fn normalize_all_at(records: &[ChargingRecord], now: DateTime<Utc>) -> Vec<FeatureVector> {
    records.iter().map(|record| normalize_at(record, now)).collect()
}
