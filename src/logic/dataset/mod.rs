//! Dataset Module - Training Data Preparation
//!
//! Normalized feature batches plus heuristic labels for supervised
//! training, and overlapping windows for the sequence model.

pub mod labels;
pub mod builder;


pub use labels::{
    actual_class_index, derive_labels, primary_category, FaultCategory, LabelVector, LABEL_COUNT,
};
pub use builder::{
    build, build_at, build_sequences, build_sequences_at, Dataset, SequenceDataset, DEFAULT_WINDOW,
};
