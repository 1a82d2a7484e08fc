//! Timing Feature Extraction
//!
//! Session duration and start → sync delay, both in whole minutes.

use chrono::{DateTime, Utc};

use super::layout::Feature;
use super::normalizer::scale_to_unit;
use super::vector::{FeatureExtractor, FeatureVector};
use crate::logic::records::ChargingRecord;

/// Duration scale upper bound (minutes)
pub const MAX_DURATION_MINUTES: f64 = 240.0;

/// Sync delay scale upper bound (minutes)
pub const MAX_SYNC_DELAY_MINUTES: f64 = 60.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimingFeatures {
    /// Start → stop (or `now` while open), truncated, never negative
    pub duration_minutes: i64,
    /// Start → sync, truncated, never negative
    pub sync_delay_minutes: i64,
}

impl TimingFeatures {
    pub fn from_record_at(record: &ChargingRecord, now: DateTime<Utc>) -> Self {
        let end = record.stopped_at.unwrap_or(now);
        Self {
            duration_minutes: (end - record.started_at).num_minutes().max(0),
            sync_delay_minutes: (record.sync_at - record.started_at).num_minutes().max(0),
        }
    }
}

impl FeatureExtractor for TimingFeatures {
    fn extract(&self, vector: &mut FeatureVector) {
        vector.set_feature(
            Feature::Duration,
            scale_to_unit(self.duration_minutes as f64, 0.0, MAX_DURATION_MINUTES),
        );
        vector.set_feature(
            Feature::SyncDelay,
            scale_to_unit(self.sync_delay_minutes as f64, 0.0, MAX_SYNC_DELAY_MINUTES),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_open_session_uses_now() {
        let start = Utc.with_ymd_and_hms(2024, 3, 20, 10, 0, 0).unwrap();
        let record = ChargingRecord::new("l", "s", start, "charging");

        let timing = TimingFeatures::from_record_at(&record, start + Duration::seconds(150));
        assert_eq!(timing.duration_minutes, 2);
    }

    #[test]
    fn test_negative_spans_clamp_to_zero() {
        let start = Utc.with_ymd_and_hms(2024, 3, 20, 10, 0, 0).unwrap();
        let record = ChargingRecord::new("l", "s", start, "finished")
            .with_stopped_at(start - Duration::minutes(5))
            .with_sync_at(start - Duration::minutes(3));

        let timing = TimingFeatures::from_record_at(&record, start);
        assert_eq!(timing.duration_minutes, 0);
        assert_eq!(timing.sync_delay_minutes, 0);
    }
}
