//! Prediction Thresholds & Interpretation
//!
//! Each output channel is read as an independent probability and compared
//! against the alert threshold, even though the head is a softmax.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::dataset::{FaultCategory, LABEL_COUNT};
use crate::logic::faults::Severity;
use crate::logic::records::ChargingRecord;

/// Threshold configuration for classifier alerts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionThreshold {
    /// Channel must exceed this to produce a prediction
    pub alert: f32,
    /// Above this = high severity
    pub high: f32,
    /// Above this = medium severity, otherwise low
    pub medium: f32,
}

impl Default for PredictionThreshold {
    fn default() -> Self {
        Self {
            alert: 0.7,
            high: 0.9,
            medium: 0.8,
        }
    }
}

impl PredictionThreshold {
    /// High sensitivity (lower alert threshold)
    pub fn high_sensitivity() -> Self {
        Self {
            alert: 0.5,
            ..Default::default()
        }
    }

    /// Low sensitivity (higher alert threshold)
    pub fn low_sensitivity() -> Self {
        Self {
            alert: 0.85,
            ..Default::default()
        }
    }

    pub fn severity(&self, probability: f32) -> Severity {
        if probability > self.high {
            Severity::High
        } else if probability > self.medium {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// One classifier finding for a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultPrediction {
    pub category: FaultCategory,
    pub severity: Severity,
    pub probability: f32,
    pub message: String,
    pub session_id: String,
    pub detected_at: DateTime<Utc>,
}

/// Turn one output row into predictions, in channel order
pub fn interpret(
    probabilities: &[f32; LABEL_COUNT],
    record: &ChargingRecord,
    threshold: &PredictionThreshold,
    detected_at: DateTime<Utc>,
) -> Vec<FaultPrediction> {
    FaultCategory::ALL
        .iter()
        .zip(probabilities.iter())
        .filter(|(_, probability)| **probability > threshold.alert)
        .map(|(&category, &probability)| FaultPrediction {
            category,
            severity: threshold.severity(probability),
            probability,
            message: message_for(category, record),
            session_id: record.session_id.clone(),
            detected_at,
        })
        .collect()
}

fn message_for(category: FaultCategory, record: &ChargingRecord) -> String {
    match category {
        FaultCategory::ConsumptionAnomaly => format!(
            "Unusual consumption pattern detected: {}",
            display_reading(record.consumption, "Wh")
        ),
        FaultCategory::PowerInstability => format!(
            "Power instability detected: {}",
            display_reading(record.output_power, "W")
        ),
        FaultCategory::SyncDelay => "Significant delay in session synchronization".to_string(),
        FaultCategory::SessionInterruption => "Unexpected session interruption detected".to_string(),
    }
}

fn display_reading(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{}{}", v, unit),
        None => "no reading".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> ChargingRecord {
        let start = Utc.with_ymd_and_hms(2024, 3, 20, 10, 0, 0).unwrap();
        ChargingRecord::new("l", "s-9", start, "charging")
            .with_consumption(0.0)
            .with_output_power(9500.0)
    }

    #[test]
    fn test_severity_bands() {
        let t = PredictionThreshold::default();
        assert_eq!(t.severity(0.95), Severity::High);
        assert_eq!(t.severity(0.85), Severity::Medium);
        assert_eq!(t.severity(0.75), Severity::Low);
        assert_eq!(t.severity(0.9), Severity::Medium);
    }

    #[test]
    fn test_interpret_channels_independently() {
        let now = Utc::now();
        let predictions = interpret(
            &[0.95, 0.71, 0.7, 0.1],
            &record(),
            &PredictionThreshold::default(),
            now,
        );

        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].category, FaultCategory::ConsumptionAnomaly);
        assert_eq!(predictions[0].severity, Severity::High);
        assert_eq!(predictions[0].message, "Unusual consumption pattern detected: 0Wh");
        assert_eq!(predictions[1].category, FaultCategory::PowerInstability);
        assert_eq!(predictions[1].severity, Severity::Low);
        assert_eq!(predictions[1].message, "Power instability detected: 9500W");
        assert_eq!(predictions[1].session_id, "s-9");
    }

    #[test]
    fn test_nothing_above_threshold() {
        let predictions = interpret(
            &[0.25, 0.25, 0.25, 0.25],
            &record(),
            &PredictionThreshold::default(),
            Utc::now(),
        );
        assert!(predictions.is_empty());
    }
}
