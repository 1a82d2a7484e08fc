//! Engine Configuration
//!
//! Training, model and engine settings. Every struct has a `Default`
//! matching the documented defaults; `EngineConfig::from_env` layers
//! environment overrides on top.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    get_default_model_dir, DEFAULT_BATCH_SIZE, DEFAULT_EARLY_STOPPING_PATIENCE, DEFAULT_EPOCHS,
    DEFAULT_VALIDATION_SPLIT, LEARNING_RATE,
};
use crate::logic::dataset::DEFAULT_WINDOW;
use crate::logic::error::{FaultError, FaultResult};

// ============================================================================
// TRAINING CONFIG
// ============================================================================

/// Options recognized by `FaultClassifier::train`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    /// Trailing fraction of the dataset held out for validation
    pub validation_split: f32,
    /// Stop after this many epochs without a val_loss improvement and
    /// restore the best epoch's weights. Needs a validation split.
    pub early_stopping_patience: Option<usize>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: DEFAULT_EPOCHS,
            batch_size: DEFAULT_BATCH_SIZE,
            validation_split: DEFAULT_VALIDATION_SPLIT,
            early_stopping_patience: None,
        }
    }
}

impl TrainingConfig {
    /// Early stopping with the default patience
    pub fn with_early_stopping(mut self) -> Self {
        self.early_stopping_patience = Some(DEFAULT_EARLY_STOPPING_PATIENCE);
        self
    }

    pub fn validated(self) -> FaultResult<Self> {
        let mut fields = Vec::new();
        if self.epochs == 0 {
            fields.push("epochs".to_string());
        }
        if self.batch_size == 0 {
            fields.push("batch_size".to_string());
        }
        if !self.validation_split.is_finite() || !(0.0..1.0).contains(&self.validation_split) {
            fields.push("validation_split".to_string());
        }
        if self.early_stopping_patience == Some(0) {
            fields.push("early_stopping_patience".to_string());
        }

        if fields.is_empty() {
            Ok(self)
        } else {
            Err(FaultError::validation(
                "training config",
                fields,
                "epochs, batch_size and early_stopping_patience must be >= 1, validation_split must be in [0, 1)",
            ))
        }
    }
}

// ============================================================================
// MODEL CONFIG
// ============================================================================

/// Output head / training objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelMode {
    /// 4-way softmax over fault categories, categorical cross-entropy
    Classification,
    /// Flattened window in, next feature vector out, mean squared error
    Sequence,
}

impl ModelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelMode::Classification => "classification",
            ModelMode::Sequence => "sequence",
        }
    }
}

impl std::fmt::Display for ModelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Network topology and optimizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub mode: ModelMode,
    /// First hidden stage width (12..=64)
    pub hidden_units: usize,
    /// Second, narrower hidden stage width
    pub second_units: usize,
    /// Dropout after the first hidden stage (0 disables it)
    pub dropout_rate: f32,
    /// L2 penalty on hidden-stage kernels
    pub l2: f32,
    pub learning_rate: f32,
    /// Window length, sequence mode only
    pub window: usize,
    /// Seed for weight init, dropout masks and shuffling
    pub seed: Option<u64>,
}

pub const MIN_HIDDEN_UNITS: usize = 12;
pub const MAX_HIDDEN_UNITS: usize = 64;

impl Default for ModelConfig {
    fn default() -> Self {
        Self::classification()
    }
}

impl ModelConfig {
    /// Dense 12 → dropout → dense 8 → softmax 4
    pub fn classification() -> Self {
        Self {
            mode: ModelMode::Classification,
            hidden_units: 12,
            second_units: 8,
            dropout_rate: 0.2,
            l2: 0.01,
            learning_rate: LEARNING_RATE,
            window: DEFAULT_WINDOW,
            seed: None,
        }
    }

    /// Dense 64 → dropout → dense 16 → linear 5 over flattened windows
    pub fn sequence() -> Self {
        Self {
            mode: ModelMode::Sequence,
            hidden_units: 64,
            second_units: 16,
            ..Self::classification()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validated(&self) -> FaultResult<()> {
        let mut fields = Vec::new();
        if !(MIN_HIDDEN_UNITS..=MAX_HIDDEN_UNITS).contains(&self.hidden_units) {
            fields.push("hidden_units".to_string());
        }
        if self.second_units == 0 || self.second_units > self.hidden_units {
            fields.push("second_units".to_string());
        }
        if !self.dropout_rate.is_finite() || !(0.0..1.0).contains(&self.dropout_rate) {
            fields.push("dropout_rate".to_string());
        }
        if !self.l2.is_finite() || self.l2 < 0.0 {
            fields.push("l2".to_string());
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            fields.push("learning_rate".to_string());
        }
        if self.mode == ModelMode::Sequence && self.window == 0 {
            fields.push("window".to_string());
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(FaultError::validation(
                "model config",
                fields,
                "invalid network topology",
            ))
        }
    }
}

// ============================================================================
// ENGINE CONFIG
// ============================================================================

/// Backend for the named model blob store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    File,
    Sqlite,
}

impl FromStr for StoreBackend {
    type Err = FaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StoreBackend::File),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => Err(FaultError::validation(
                "engine config",
                vec!["EV_FAULT_STORE".to_string()],
                format!("unknown store backend '{}'", other),
            )),
        }
    }
}

/// Process-level configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub model_dir: PathBuf,
    pub store_backend: StoreBackend,
    pub training: TrainingConfig,
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_dir: get_default_model_dir(),
            store_backend: StoreBackend::File,
            training: TrainingConfig::default(),
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> FaultResult<Self> {
        let defaults = Self::default();

        let store_backend = match env::var("EV_FAULT_STORE") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.store_backend,
        };

        Ok(Self {
            model_dir: env::var("EV_FAULT_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            store_backend,
            training: TrainingConfig {
                epochs: env_or("EV_FAULT_EPOCHS", defaults.training.epochs),
                batch_size: env_or("EV_FAULT_BATCH_SIZE", defaults.training.batch_size),
                validation_split: env_or(
                    "EV_FAULT_VALIDATION_SPLIT",
                    defaults.training.validation_split,
                ),
                early_stopping_patience: env::var("EV_FAULT_PATIENCE")
                    .ok()
                    .and_then(|s| s.parse().ok()),
            },
            seed: env::var("EV_FAULT_SEED").ok().and_then(|s| s.parse().ok()),
        })
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("Ignoring unparseable {}={:?}, using default", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_training_config() {
        let config = TrainingConfig::default();
        assert_eq!(config.epochs, 50);
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.validation_split, 0.2);
        assert_eq!(config.early_stopping_patience, None);
        assert!(config.clone().validated().is_ok());
        assert_eq!(config.with_early_stopping().early_stopping_patience, Some(5));
    }

    #[test]
    fn test_partial_training_config_uses_defaults() {
        let config: TrainingConfig = serde_json::from_str(r#"{"epochs": 5}"#).unwrap();
        assert_eq!(config.epochs, 5);
        assert_eq!(config.batch_size, 32);
    }

    #[test]
    fn test_invalid_training_config_names_fields() {
        let config = TrainingConfig {
            epochs: 0,
            batch_size: 8,
            validation_split: 1.5,
            ..Default::default()
        };
        match config.validated() {
            Err(FaultError::Validation { fields, .. }) => {
                assert_eq!(fields, vec!["epochs".to_string(), "validation_split".to_string()]);
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_model_presets() {
        let cls = ModelConfig::classification();
        assert_eq!(cls.hidden_units, 12);
        assert_eq!(cls.second_units, 8);
        assert!(cls.validated().is_ok());

        let seq = ModelConfig::sequence();
        assert_eq!(seq.mode, ModelMode::Sequence);
        assert_eq!(seq.hidden_units, 64);
        assert_eq!(seq.window, 5);
        assert!(seq.validated().is_ok());
    }

    #[test]
    fn test_hidden_units_out_of_range() {
        let config = ModelConfig {
            hidden_units: 128,
            ..ModelConfig::classification()
        };
        assert!(config.validated().is_err());
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("SQLite".parse::<StoreBackend>().unwrap(), StoreBackend::Sqlite);
        assert_eq!("file".parse::<StoreBackend>().unwrap(), StoreBackend::File);
        assert!("s3".parse::<StoreBackend>().is_err());
    }
}
