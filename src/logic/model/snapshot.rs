//! Model Snapshot - Persisted topology and weights
//!
//! Blob layout: JSON envelope `{checksum, payload}` where `payload` is the
//! JSON-encoded `ModelSnapshot` and `checksum` its hex SHA-256. Optimizer
//! state is not persisted; `load` compiles a fresh optimizer.

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::network::{Activation, DenseLayer, Dropout, Network};
use crate::logic::config::ModelConfig;
use crate::logic::error::{FaultError, FaultResult};
use crate::logic::features::LayoutInfo;

pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSnapshot {
    pub inputs: usize,
    pub units: usize,
    pub activation: Activation,
    pub l2: f32,
    /// Row-major `inputs × units`
    pub weights: Vec<f32>,
    pub bias: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub format_version: u32,
    pub model_id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub config: ModelConfig,
    pub layout: LayoutInfo,
    pub dropout: Option<Dropout>,
    pub layers: Vec<LayerSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    checksum: String,
    payload: String,
}

fn checksum(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

impl ModelSnapshot {
    pub fn capture(config: &ModelConfig, network: &Network) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            model_id: Uuid::new_v4(),
            saved_at: Utc::now(),
            config: config.clone(),
            layout: LayoutInfo::current(),
            dropout: network.dropout,
            layers: network
                .layers
                .iter()
                .map(|layer| LayerSnapshot {
                    inputs: layer.inputs(),
                    units: layer.units(),
                    activation: layer.activation,
                    l2: layer.l2,
                    weights: layer.weights.iter().copied().collect(),
                    bias: layer.bias.to_vec(),
                })
                .collect(),
        }
    }

    /// Rebuild the network, checking every layer's shape
    pub fn restore(&self) -> FaultResult<Network> {
        if self.layers.is_empty() {
            return Err(FaultError::Persistence("snapshot has no layers".to_string()));
        }

        let mut layers: Vec<DenseLayer> = Vec::with_capacity(self.layers.len());
        for (index, snap) in self.layers.iter().enumerate() {
            if let Some(previous) = layers.last().map(DenseLayer::units) {
                if previous != snap.inputs {
                    return Err(FaultError::Persistence(format!(
                        "layer {} expects {} inputs, previous layer has {} units",
                        index, snap.inputs, previous
                    )));
                }
            }
            if snap.bias.len() != snap.units {
                return Err(FaultError::Persistence(format!(
                    "layer {} bias has {} values, expected {}",
                    index,
                    snap.bias.len(),
                    snap.units
                )));
            }
            let weights = Array2::from_shape_vec((snap.inputs, snap.units), snap.weights.clone())
                .map_err(|e| FaultError::Persistence(format!("layer {} weights: {}", index, e)))?;

            layers.push(DenseLayer {
                weights,
                bias: Array1::from(snap.bias.clone()),
                activation: snap.activation,
                l2: snap.l2,
            });
        }

        Ok(Network {
            layers,
            dropout: self.dropout,
        })
    }

    pub fn to_bytes(&self) -> FaultResult<Vec<u8>> {
        let payload = serde_json::to_string(self)?;
        let envelope = Envelope {
            checksum: checksum(&payload),
            payload,
        };
        Ok(serde_json::to_vec(&envelope)?)
    }

    /// Decode and verify checksum, format version and feature layout
    pub fn from_bytes(bytes: &[u8]) -> FaultResult<Self> {
        let envelope: Envelope = serde_json::from_slice(bytes)
            .map_err(|e| FaultError::Persistence(format!("corrupt model blob: {}", e)))?;

        if checksum(&envelope.payload) != envelope.checksum {
            return Err(FaultError::Persistence("model blob checksum mismatch".to_string()));
        }

        let snapshot: ModelSnapshot = serde_json::from_str(&envelope.payload)
            .map_err(|e| FaultError::Persistence(format!("corrupt model payload: {}", e)))?;

        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(FaultError::Persistence(format!(
                "unsupported snapshot format v{}",
                snapshot.format_version
            )));
        }

        snapshot
            .layout
            .check()
            .map_err(|e| FaultError::Persistence(e.to_string()))?;

        Ok(snapshot)
    }
}
