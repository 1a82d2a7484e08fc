//! Dataset Builder
//!
//! Stacks normalized records into `ndarray` batches. Row order follows
//! record order; it matters for windowed sequences.

use chrono::{DateTime, Utc};
use ndarray::{s, Array2, Array3};

use super::labels::{derive_labels, LABEL_COUNT};
use crate::logic::features::{normalize_all_at, FeatureVector, FEATURE_COUNT};
use crate::logic::records::ChargingRecord;

/// Default window length for sequence mode
pub const DEFAULT_WINDOW: usize = 5;

// ============================================================================
// DATASET
// ============================================================================

/// Row-aligned inputs and targets.
///
/// Classification: `n × 5` features, `n × 4` multi-hot labels.
/// Sequence: `n × (L·5)` flattened windows, `n × 5` next-step targets.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub inputs: Array2<f32>,
    pub labels: Array2<f32>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.inputs.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of validation rows for a split fraction
    pub fn validation_len(&self, validation_split: f32) -> usize {
        let split = validation_split.clamp(0.0, 1.0) as f64;
        ((self.len() as f64) * split).floor() as usize
    }

    /// `(train, validation)`; the validation set is the trailing rows
    pub fn split(&self, validation_split: f32) -> (Dataset, Dataset) {
        let cut = self.len() - self.validation_len(validation_split);
        (
            Dataset {
                inputs: self.inputs.slice(s![..cut, ..]).to_owned(),
                labels: self.labels.slice(s![..cut, ..]).to_owned(),
            },
            Dataset {
                inputs: self.inputs.slice(s![cut.., ..]).to_owned(),
                labels: self.labels.slice(s![cut.., ..]).to_owned(),
            },
        )
    }
}

pub fn build(records: &[ChargingRecord]) -> Dataset {
    build_at(records, Utc::now())
}

pub fn build_at(records: &[ChargingRecord], now: DateTime<Utc>) -> Dataset {
    let vectors = normalize_all_at(records, now);
    let labels: Vec<_> = records.iter().map(derive_labels).collect();

    log::debug!("Built dataset: {} rows", records.len());

    Dataset {
        inputs: stack_vectors(&vectors),
        labels: Array2::from_shape_fn((labels.len(), LABEL_COUNT), |(i, j)| labels[i][j]),
    }
}

fn stack_vectors(vectors: &[FeatureVector]) -> Array2<f32> {
    Array2::from_shape_fn((vectors.len(), FEATURE_COUNT), |(i, j)| vectors[i].values[j])
}

// ============================================================================
// SEQUENCES
// ============================================================================

/// Overlapping windows of consecutive feature vectors
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceDataset {
    /// `windows × L × 5`
    pub inputs: Array3<f32>,
    /// `windows × 5`
    pub targets: Array2<f32>,
}

impl SequenceDataset {
    pub fn len(&self) -> usize {
        self.inputs.shape()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn window(&self) -> usize {
        self.inputs.shape()[1]
    }

    /// Windows flattened row-major to `windows × (L·5)`
    pub fn flattened(&self) -> Array2<f32> {
        let width = self.window() * FEATURE_COUNT;
        Array2::from_shape_fn((self.len(), width), |(i, k)| {
            self.inputs[[i, k / FEATURE_COUNT, k % FEATURE_COUNT]]
        })
    }

    pub fn to_dataset(&self) -> Dataset {
        Dataset {
            inputs: self.flattened(),
            labels: self.targets.clone(),
        }
    }
}

pub fn build_sequences(records: &[ChargingRecord], window: usize) -> SequenceDataset {
    build_sequences_at(records, window, Utc::now())
}

/// Target is the vector right after the window, or the last vector
/// when the window ends at the final record. Fewer than `window`
/// records yields no windows.
pub fn build_sequences_at(
    records: &[ChargingRecord],
    window: usize,
    now: DateTime<Utc>,
) -> SequenceDataset {
    let vectors = normalize_all_at(records, now);
    let n = vectors.len();
    let count = if window == 0 || n < window { 0 } else { n - window + 1 };

    let inputs = Array3::from_shape_fn((count, window, FEATURE_COUNT), |(i, t, j)| {
        vectors[i + t].values[j]
    });
    let targets = Array2::from_shape_fn((count, FEATURE_COUNT), |(i, j)| {
        let target = if i + window < n { i + window } else { n - 1 };
        vectors[target].values[j]
    });

    log::debug!("Built {} sequence window(s) of length {}", count, window);
    SequenceDataset { inputs, targets }
}
