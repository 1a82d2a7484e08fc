//! Logic Module - Business Logic & Engines
//!
//! Detection engines for charging telemetry: ingestion, features, rule-based
//! analyzer, dataset builder, classifier, metrics and model storage.

pub mod error;
pub mod config;

// Records & features
pub mod records;
pub mod features;

// Detection paths
pub mod faults;
pub mod dataset;
pub mod model;
pub mod metrics;

// Persistence
pub mod store;
