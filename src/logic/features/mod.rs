//! Features Module - Feature Extraction Engine
//!
//! Turns charging records into the fixed 5-feature model input.
//! Each extractor owns a slice of the layout; the normalizer composes them.

pub mod layout;
pub mod vector;
pub mod timing;
pub mod energy;
pub mod normalizer;


// Re-export common types
pub use layout::{Feature, LayoutInfo, LayoutMismatchError, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION};
pub use vector::{FeatureExtractor, FeatureVector};
pub use normalizer::{normalize, normalize_all_at, normalize_at};
