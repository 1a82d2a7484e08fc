//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Environment overrides are read in `logic::config`.

use std::path::PathBuf;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "EV Fault Core";

/// Directory name under the local data dir
pub const DATA_DIR_NAME: &str = "ev-fault";

/// Sub-directory holding saved model blobs (file store)
pub const MODEL_DIR_NAME: &str = "models";

/// SQLite file holding saved model blobs (sqlite store)
pub const MODEL_DB_FILE: &str = "models.db";

/// Model name used when the caller does not pick one
pub const DEFAULT_MODEL_NAME: &str = "charging-fault-model";

/// Default training epochs
pub const DEFAULT_EPOCHS: usize = 50;

/// Default mini-batch size
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Default fraction of records held out for validation
pub const DEFAULT_VALIDATION_SPLIT: f32 = 0.2;

/// Epochs without a val_loss improvement before training stops, when enabled
pub const DEFAULT_EARLY_STOPPING_PATIENCE: usize = 5;

/// Fixed optimizer learning rate
pub const LEARNING_RATE: f32 = 0.001;

// ============================================
// Helper functions
// ============================================

/// Base data directory (`<local data dir>/ev-fault`)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}

/// Default directory for saved models
pub fn get_default_model_dir() -> PathBuf {
    get_data_dir().join(MODEL_DIR_NAME)
}
