//! Error taxonomy for the fault detection core
//!
//! Every failure aborts the current pass. Variants carry enough context
//! (record, field set, epoch) to diagnose the problem at the call site.

use thiserror::Error;

pub type FaultResult<T> = Result<T, FaultError>;

#[derive(Debug, Error)]
pub enum FaultError {
    /// Malformed or missing input records
    #[error("validation failed for {context}: {reason} [fields: {}]", .fields.join(", "))]
    Validation {
        context: String,
        fields: Vec<String>,
        reason: String,
    },

    /// Operation invoked before `initialize()`
    #[error("classifier not initialized: call initialize() before {0}")]
    Initialization(String),

    /// F1 requested while precision + recall == 0
    #[error("F1 score undefined: precision {precision} + recall {recall} == 0")]
    MetricsUndefined { precision: f32, recall: f32 },

    /// Numeric failure while fitting
    #[error("training failed at epoch {epoch}: {reason}")]
    Training { epoch: usize, reason: String },

    /// Cooperative cancellation observed between epochs
    #[error("training cancelled after {epoch} completed epoch(s)")]
    Cancelled { epoch: usize },

    /// Save/load failure (missing, corrupt or incompatible blob)
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Operation not available for the configured model mode
    #[error("{operation} is not supported in {mode} mode")]
    UnsupportedMode { operation: &'static str, mode: String },
}

impl FaultError {
    pub fn validation(
        context: impl Into<String>,
        fields: Vec<String>,
        reason: impl Into<String>,
    ) -> Self {
        FaultError::Validation {
            context: context.into(),
            fields,
            reason: reason.into(),
        }
    }

    /// Stable machine-readable kind, used by the command layer
    pub fn kind(&self) -> &'static str {
        match self {
            FaultError::Validation { .. } => "validation_error",
            FaultError::Initialization(_) => "initialization_error",
            FaultError::MetricsUndefined { .. } => "metrics_undefined_error",
            FaultError::Training { .. } => "training_error",
            FaultError::Cancelled { .. } => "training_cancelled",
            FaultError::Persistence(_) => "persistence_error",
            FaultError::UnsupportedMode { .. } => "unsupported_mode",
        }
    }
}

impl From<std::io::Error> for FaultError {
    fn from(err: std::io::Error) -> Self {
        FaultError::Persistence(format!("IO Error: {}", err))
    }
}

impl From<rusqlite::Error> for FaultError {
    fn from(err: rusqlite::Error) -> Self {
        FaultError::Persistence(format!("SQLite Error: {}", err))
    }
}

/// Only model blobs go through `?` on serde_json; record parsing maps
/// its own errors to `Validation`
impl From<serde_json::Error> for FaultError {
    fn from(err: serde_json::Error) -> Self {
        FaultError::Persistence(format!("Serialization Error: {}", err))
    }
}

impl From<csv::Error> for FaultError {
    fn from(err: csv::Error) -> Self {
        FaultError::validation("CSV input", Vec::new(), err.to_string())
    }
}
