//! EV Charging Fault Detection - Core Library
//!
//! Ingests charging session telemetry and flags faulty sessions through two
//! independent paths:
//!
//! ```text
//! raw records ──► normalizer ──┬──► rule-based analyzer ──► FaultReport[]
//!                              │
//!                              └──► dataset builder ──► classifier ──► metrics / predictions
//! ```
//!
//! - `logic/records` - typed records, CSV/JSON ingestion, session aggregation
//! - `logic/features` - fixed 5-feature layout and record normalization
//! - `logic/faults` - heuristic fault analyzer (no model required)
//! - `logic/dataset` - heuristic labels, training batches, sequence windows
//! - `logic/model` - dense network, training lifecycle, persistence envelope
//! - `logic/metrics` - accuracy / precision / recall / F1
//! - `logic/store` - named model blob stores (file, SQLite, memory)
//! - `api` - request/response commands used by the CLI

pub mod api;
pub mod constants;
pub mod logic;

pub use logic::error::{FaultError, FaultResult};
