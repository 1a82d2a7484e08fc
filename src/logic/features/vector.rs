//! Feature Vector - Model input for one charging record
//!
//! Fixed-size vector stamped with the layout it was built under.

use serde::{Deserialize, Serialize};

use super::layout::{Feature, LayoutInfo, LayoutMismatchError, FEATURE_COUNT, FEATURE_VERSION, layout_hash};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub version: u8,
    pub layout_hash: u32,
    /// Indexed by `Feature`
    pub values: [f32; FEATURE_COUNT],
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::from([0.0; FEATURE_COUNT])
    }
}

impl From<[f32; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f32; FEATURE_COUNT]) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_array(&self) -> &[f32; FEATURE_COUNT] {
        &self.values
    }

    pub fn feature(&self, feature: Feature) -> f32 {
        self.values[feature.index()]
    }

    pub fn set_feature(&mut self, feature: Feature, value: f32) {
        self.values[feature.index()] = value;
    }

    pub fn check_layout(&self) -> Result<(), LayoutMismatchError> {
        LayoutInfo {
            version: self.version,
            hash: self.layout_hash,
            feature_names: Vec::new(),
        }
        .check()
    }

    /// Every value finite and non-negative; all but power at most 1
    pub fn is_model_ready(&self) -> bool {
        Feature::ALL.iter().all(|&feature| {
            let value = self.feature(feature);
            value.is_finite() && value >= 0.0 && (feature == Feature::Power || value <= 1.0)
        })
    }

    /// `name=value` pairs for debug logs
    pub fn describe(&self) -> String {
        Feature::ALL
            .iter()
            .map(|&feature| format!("{}={:.3}", feature.name(), self.feature(feature)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Writes the features one concern owns into the vector
pub trait FeatureExtractor {
    fn extract(&self, vector: &mut FeatureVector);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_vector_is_stamped() {
        let vector = FeatureVector::new();
        assert_eq!(vector.values, [0.0; FEATURE_COUNT]);
        assert!(vector.check_layout().is_ok());
    }

    #[test]
    fn test_foreign_stamp_detected() {
        let mut vector = FeatureVector::new();
        vector.layout_hash ^= 1;
        assert!(vector.check_layout().is_err());
    }

    #[test]
    fn test_named_access() {
        let mut vector = FeatureVector::from([0.1, 0.2, 0.3, 0.4, 0.5]);
        assert_eq!(vector.feature(Feature::Duration), 0.3);
        vector.set_feature(Feature::SyncDelay, 0.9);
        assert_eq!(vector.values[3], 0.9);
        assert!(vector.describe().starts_with("consumption_rate=0.100"));
    }

    #[test]
    fn test_model_ready_allows_power_above_one() {
        assert!(FeatureVector::from([0.1, 1.6, 0.3, 0.4, 0.5]).is_model_ready());
        assert!(!FeatureVector::from([1.1, 0.2, 0.3, 0.4, 0.5]).is_model_ready());
        assert!(!FeatureVector::from([0.1, f32::NAN, 0.3, 0.4, 0.5]).is_model_ready());
    }
}
