//! Fault Classifier - Lifecycle manager
//!
//! Owns the network, its optimizer and loss. Lifecycle:
//!
//! ```text
//! Uninitialized ──initialize──▶ Ready ──train──▶ Trained ◀──▶ Evaluated
//!                                  └────load────▶ Trained
//! ```
//!
//! Every operation before `initialize()` fails with `Initialization` and
//! changes nothing. A failed or cancelled `train` restores the weights it
//! started from.

use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::buffer::{BufferStatus, BufferTracker};
use super::loss::{argmax_rows, categorical_accuracy, mean_absolute_error, LossKind};
use super::network::{Activation, DenseLayer, Dropout, Network};
use super::optimizer::Adam;
use super::prediction::{interpret, FaultPrediction, PredictionThreshold};
use super::progress::{CancellationToken, EarlyStopping, EpochProgress, LogProgressSink, ProgressSink};
use super::snapshot::ModelSnapshot;
use crate::logic::config::{ModelConfig, ModelMode, TrainingConfig};
use crate::logic::dataset::{self, actual_class_index, Dataset, LABEL_COUNT};
use crate::logic::error::{FaultError, FaultResult};
use crate::logic::features::{normalize, FEATURE_COUNT};
use crate::logic::metrics::{self, EvaluationMetrics};
use crate::logic::records::ChargingRecord;
use crate::logic::store::ModelStore;

/// Default reconstruction-error threshold for sequence anomalies
pub const DEFAULT_SEQUENCE_THRESHOLD: f32 = 0.1;

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierState {
    Uninitialized,
    Ready,
    Trained,
    Evaluated,
}

impl ClassifierState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierState::Uninitialized => "uninitialized",
            ClassifierState::Ready => "ready",
            ClassifierState::Trained => "trained",
            ClassifierState::Evaluated => "evaluated",
        }
    }
}

/// Result of a completed `train` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub epochs_completed: usize,
    pub final_loss: f32,
    pub final_accuracy: Option<f32>,
    pub final_val_loss: Option<f32>,
    pub final_val_accuracy: Option<f32>,
    /// Sequence mode only
    pub final_mae: Option<f32>,
    pub final_val_mae: Option<f32>,
    /// Set when early stopping ended the run and the weights of
    /// `best_epoch` were restored
    pub stopped_early: bool,
    /// Lowest-val_loss epoch seen while early stopping was active
    pub best_epoch: Option<usize>,
    pub best_val_loss: Option<f32>,
    pub training_rows: usize,
    pub validation_rows: usize,
    pub history: Vec<EpochProgress>,
}

/// Network with the optimizer and loss it trains with
#[derive(Debug, Clone)]
struct CompiledModel {
    network: Network,
    optimizer: Adam,
    loss: LossKind,
}

impl CompiledModel {
    fn compile(network: Network, config: &ModelConfig) -> Self {
        let loss = match config.mode {
            ModelMode::Classification => LossKind::CategoricalCrossEntropy,
            ModelMode::Sequence => LossKind::MeanSquaredError,
        };
        Self {
            optimizer: Adam::new(config.learning_rate, &network),
            network,
            loss,
        }
    }
}

// ============================================================================
// TOPOLOGY
// ============================================================================

fn input_dim(config: &ModelConfig) -> usize {
    match config.mode {
        ModelMode::Classification => FEATURE_COUNT,
        ModelMode::Sequence => config.window * FEATURE_COUNT,
    }
}

fn output_spec(mode: ModelMode) -> (usize, Activation) {
    match mode {
        ModelMode::Classification => (LABEL_COUNT, Activation::Softmax),
        ModelMode::Sequence => (FEATURE_COUNT, Activation::Linear),
    }
}

/// Dense(hidden, ReLU, L2) → Dropout → Dense(second, ReLU) → head
fn build_network(config: &ModelConfig, rng: &mut StdRng) -> Network {
    let (outputs, head) = output_spec(config.mode);
    let second_l2 = match config.mode {
        ModelMode::Classification => config.l2,
        ModelMode::Sequence => 0.0,
    };

    Network {
        layers: vec![
            DenseLayer::glorot(input_dim(config), config.hidden_units, Activation::Relu, config.l2, rng),
            DenseLayer::glorot(config.hidden_units, config.second_units, Activation::Relu, second_l2, rng),
            DenseLayer::glorot(config.second_units, outputs, head, 0.0, rng),
        ],
        dropout: (config.dropout_rate > 0.0).then_some(Dropout {
            after_layer: 0,
            rate: config.dropout_rate,
        }),
    }
}

fn check_topology(network: &Network, config: &ModelConfig) -> FaultResult<()> {
    let (outputs, head) = output_spec(config.mode);
    let head_matches = network.layers.last().map(|l| l.activation) == Some(head);

    if network.input_dim() != input_dim(config) || network.output_dim() != outputs || !head_matches {
        return Err(FaultError::Persistence(format!(
            "stored {} network is {}→{}, expected {}→{}",
            config.mode,
            network.input_dim(),
            network.output_dim(),
            input_dim(config),
            outputs
        )));
    }
    Ok(())
}

// ============================================================================
// CLASSIFIER
// ============================================================================

pub struct FaultClassifier {
    config: ModelConfig,
    state: ClassifierState,
    model: Option<CompiledModel>,
    threshold: PredictionThreshold,
    buffers: BufferTracker,
    rng: StdRng,
}

impl FaultClassifier {
    pub fn new(config: ModelConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            state: ClassifierState::Uninitialized,
            model: None,
            threshold: PredictionThreshold::default(),
            buffers: BufferTracker::new(),
            rng,
        }
    }

    pub fn with_threshold(mut self, threshold: PredictionThreshold) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn state(&self) -> ClassifierState {
        self.state
    }

    pub fn mode(&self) -> ModelMode {
        self.config.mode
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.live()
    }

    pub fn buffer_status(&self) -> BufferStatus {
        self.buffers.status()
    }

    pub fn network(&self) -> Option<&Network> {
        self.model.as_ref().map(|m| &m.network)
    }

    #[cfg(test)]
    pub(crate) fn network_mut(&mut self) -> Option<&mut Network> {
        self.model.as_mut().map(|m| &mut m.network)
    }

    fn require_model(&self, operation: &str) -> FaultResult<&CompiledModel> {
        self.model
            .as_ref()
            .ok_or_else(|| FaultError::Initialization(operation.to_string()))
    }

    fn require_mode(&self, mode: ModelMode, operation: &'static str) -> FaultResult<()> {
        if self.config.mode != mode {
            return Err(FaultError::UnsupportedMode {
                operation,
                mode: self.config.mode.to_string(),
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // initialize
    // ------------------------------------------------------------------------

    /// Build and compile the network for the configured mode
    pub fn initialize(&mut self) -> FaultResult<()> {
        self.config.validated()?;

        let network = build_network(&self.config, &mut self.rng);
        log::info!(
            "Classifier initialized: {} mode, {} parameters",
            self.config.mode,
            network.parameter_count()
        );

        self.model = Some(CompiledModel::compile(network, &self.config));
        self.state = ClassifierState::Ready;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // train
    // ------------------------------------------------------------------------

    /// Train with progress written to the log
    pub async fn train(
        &mut self,
        records: &[ChargingRecord],
        config: Option<TrainingConfig>,
    ) -> FaultResult<TrainingSummary> {
        let mut sink = LogProgressSink;
        self.train_with(records, config.unwrap_or_default(), &mut sink, &CancellationToken::new())
            .await
    }

    pub async fn train_with<S: ProgressSink + ?Sized>(
        &mut self,
        records: &[ChargingRecord],
        config: TrainingConfig,
        sink: &mut S,
        cancel: &CancellationToken,
    ) -> FaultResult<TrainingSummary> {
        self.require_model("train")?;
        let config = config.validated()?;

        let dataset = match self.config.mode {
            ModelMode::Classification => dataset::build(records),
            ModelMode::Sequence => dataset::build_sequences(records, self.config.window).to_dataset(),
        };
        if dataset.is_empty() {
            return Err(FaultError::validation(
                "training records",
                Vec::new(),
                format!("no {} training rows from {} record(s)", self.config.mode, records.len()),
            ));
        }

        let (train, validation) = dataset.split(config.validation_split);
        log::info!(
            "Training {} model: {} rows ({} validation), {} epochs, batch size {}",
            self.config.mode,
            train.len(),
            validation.len(),
            config.epochs,
            config.batch_size
        );

        let backup = self.model.clone();
        let result = self.fit(train, validation, &config, sink, cancel).await;

        match &result {
            Ok(summary) => {
                self.state = ClassifierState::Trained;
                log::info!(
                    "Training complete: {} epochs, loss = {:.4}{}",
                    summary.epochs_completed,
                    summary.final_loss,
                    summary
                        .final_accuracy
                        .map(|acc| format!(", accuracy = {:.2}%", acc * 100.0))
                        .unwrap_or_default()
                );
            }
            Err(e) => {
                self.model = backup;
                log::warn!("Training aborted, weights restored: {}", e);
            }
        }
        result
    }

    async fn fit<S: ProgressSink + ?Sized>(
        &mut self,
        train: Dataset,
        validation: Dataset,
        config: &TrainingConfig,
        sink: &mut S,
        cancel: &CancellationToken,
    ) -> FaultResult<TrainingSummary> {
        let Self {
            model,
            rng,
            buffers,
            config: model_config,
            ..
        } = self;
        let model = model
            .as_mut()
            .ok_or_else(|| FaultError::Initialization("train".to_string()))?;
        let classification = model_config.mode == ModelMode::Classification;

        let training_rows = train.len();
        let validation_rows = validation.len();
        let train_inputs = buffers.track(train.inputs);
        let train_labels = buffers.track(train.labels);
        let val_inputs = buffers.track(validation.inputs);
        let val_labels = buffers.track(validation.labels);

        let mut indices: Vec<usize> = (0..training_rows).collect();
        let mut history = Vec::with_capacity(config.epochs);

        let mut early_stopping = match config.early_stopping_patience {
            Some(patience) if validation_rows > 0 => Some(EarlyStopping::new(patience)),
            Some(_) => {
                log::warn!("Early stopping needs a validation split, running every epoch");
                None
            }
            None => None,
        };
        let mut stopped_early = false;

        for epoch in 1..=config.epochs {
            if cancel.is_cancelled() {
                log::info!("Training cancelled before epoch {}", epoch);
                return Err(FaultError::Cancelled { epoch: epoch - 1 });
            }

            indices.shuffle(rng);
            let mut loss_sum = 0.0f32;
            let mut hit_sum = 0.0f32;
            let mut abs_sum = 0.0f32;

            for chunk in indices.chunks(config.batch_size) {
                let batch_x = buffers.track(train_inputs.select(Axis(0), chunk));
                let batch_y = buffers.track(train_labels.select(Axis(0), chunk));

                let cache = model.network.forward_train(&batch_x, rng);
                let output = cache.output().cloned().unwrap_or_else(|| Array2::zeros((0, 0)));
                let batch_loss = model.loss.value(&output, &batch_y) + model.network.l2_penalty();
                if !batch_loss.is_finite() {
                    return Err(FaultError::Training {
                        epoch,
                        reason: format!("non-finite loss ({})", batch_loss),
                    });
                }

                let grads = model.network.backward(&cache, model.loss.delta(&output, &batch_y));
                if !grads.is_finite() {
                    return Err(FaultError::Training {
                        epoch,
                        reason: "non-finite gradient".to_string(),
                    });
                }
                model.optimizer.step(&mut model.network, &grads);

                let rows = chunk.len() as f32;
                loss_sum += batch_loss * rows;
                if classification {
                    hit_sum += categorical_accuracy(&output, &batch_y) * rows;
                } else {
                    abs_sum += mean_absolute_error(&output, &batch_y) * rows;
                }
            }

            let loss = loss_sum / training_rows as f32;
            if !loss.is_finite() {
                return Err(FaultError::Training {
                    epoch,
                    reason: format!("non-finite epoch loss ({})", loss),
                });
            }

            let (val_loss, val_accuracy, val_mae) = if validation_rows > 0 {
                let predictions = buffers.track(model.network.predict(&val_inputs));
                let val_loss = model.loss.value(&predictions, &val_labels) + model.network.l2_penalty();
                let val_acc = classification.then(|| categorical_accuracy(&predictions, &val_labels));
                let val_mae = (!classification).then(|| mean_absolute_error(&predictions, &val_labels));
                (Some(val_loss), val_acc, val_mae)
            } else {
                (None, None, None)
            };

            let progress = EpochProgress {
                epoch,
                total_epochs: config.epochs,
                loss,
                accuracy: classification.then(|| hit_sum / training_rows as f32),
                val_loss,
                val_accuracy,
                mae: (!classification).then(|| abs_sum / training_rows as f32),
                val_mae,
            };
            sink.on_epoch_end(&progress);
            history.push(progress);

            if let (Some(stopper), Some(val_loss)) = (early_stopping.as_mut(), val_loss) {
                if stopper.observe(epoch, val_loss, &model.network) {
                    if let Some(best) = stopper.take_best_weights() {
                        model.network = best;
                    }
                    log::info!(
                        "Early stopping at epoch {}: best val_loss = {:.4} at epoch {}",
                        epoch,
                        stopper.best_loss().unwrap_or(val_loss),
                        stopper.best_epoch().unwrap_or(epoch)
                    );
                    stopped_early = true;
                    break;
                }
            }

            tokio::task::yield_now().await;
        }

        let last = history.last().cloned();
        Ok(TrainingSummary {
            epochs_completed: history.len(),
            final_loss: last.as_ref().map_or(0.0, |p| p.loss),
            final_accuracy: last.as_ref().and_then(|p| p.accuracy),
            final_val_loss: last.as_ref().and_then(|p| p.val_loss),
            final_val_accuracy: last.as_ref().and_then(|p| p.val_accuracy),
            final_mae: last.as_ref().and_then(|p| p.mae),
            final_val_mae: last.as_ref().and_then(|p| p.val_mae),
            stopped_early,
            best_epoch: early_stopping.as_ref().and_then(|s| s.best_epoch()),
            best_val_loss: early_stopping.as_ref().and_then(|s| s.best_loss()),
            training_rows,
            validation_rows,
            history,
        })
    }

    // ------------------------------------------------------------------------
    // evaluate / predict
    // ------------------------------------------------------------------------

    /// Compare arg-max predictions against the single-label heuristic class
    pub async fn evaluate(&mut self, records: &[ChargingRecord]) -> FaultResult<EvaluationMetrics> {
        let model = self.require_model("evaluate")?;
        self.require_mode(ModelMode::Classification, "evaluate")?;

        let metrics = {
            let inputs = self.buffers.track(dataset::build(records).inputs);
            let predictions = self.buffers.track(model.network.predict(&inputs));
            let predicted = argmax_rows(&predictions);
            let actual: Vec<usize> = records.iter().map(actual_class_index).collect();
            metrics::evaluate_classes(&predicted, &actual)?
        };

        if self.state >= ClassifierState::Trained {
            self.state = ClassifierState::Evaluated;
        }
        log::info!(
            "Evaluation: accuracy = {:.4}, precision = {:.4}, recall = {:.4}, f1 = {:.4}",
            metrics.accuracy,
            metrics.precision,
            metrics.recall,
            metrics.f1_score
        );
        Ok(metrics)
    }

    /// Per-channel predictions above the alert threshold
    pub async fn predict(&self, record: &ChargingRecord) -> FaultResult<Vec<FaultPrediction>> {
        let model = self.require_model("predict")?;
        self.require_mode(ModelMode::Classification, "predict")?;

        let vector = normalize(record);
        let input = self
            .buffers
            .track(Array2::from_shape_fn((1, FEATURE_COUNT), |(_, j)| vector.values[j]));
        let output = self.buffers.track(model.network.predict(&input));

        let mut probabilities = [0.0f32; LABEL_COUNT];
        for (slot, value) in probabilities.iter_mut().zip(output.row(0).iter()) {
            *slot = *value;
        }

        Ok(interpret(&probabilities, record, &self.threshold, chrono::Utc::now()))
    }

    /// Mean squared error between each window's prediction and its target,
    /// the vector after the window (the last vector for the final window).
    /// This scores next-step forecasting error; it is not the distance to
    /// the window's own last input step, which would flag steady drift
    /// instead of surprises.
    pub async fn score_sequences(&self, records: &[ChargingRecord]) -> FaultResult<Vec<f32>> {
        let model = self.require_model("score_sequences")?;
        self.require_mode(ModelMode::Sequence, "score_sequences")?;

        let sequences = dataset::build_sequences(records, self.config.window);
        if sequences.is_empty() {
            return Ok(Vec::new());
        }

        let inputs = self.buffers.track(sequences.flattened());
        let predictions = self.buffers.track(model.network.predict(&inputs));

        Ok(predictions
            .rows()
            .into_iter()
            .zip(sequences.targets.rows())
            .map(|(predicted, target)| {
                let sum: f32 = predicted
                    .iter()
                    .zip(target.iter())
                    .map(|(p, t)| (p - t) * (p - t))
                    .sum();
                sum / FEATURE_COUNT as f32
            })
            .collect())
    }

    /// One flag per window: reconstruction error above `threshold`
    pub async fn detect_sequence_anomalies(
        &self,
        records: &[ChargingRecord],
        threshold: f32,
    ) -> FaultResult<Vec<bool>> {
        let scores = self.score_sequences(records).await?;
        Ok(scores.into_iter().map(|score| score > threshold).collect())
    }

    // ------------------------------------------------------------------------
    // persistence
    // ------------------------------------------------------------------------

    pub fn save(&self, store: &dyn ModelStore, name: &str) -> FaultResult<()> {
        let model = self.require_model("save")?;
        let bytes = ModelSnapshot::capture(&self.config, &model.network).to_bytes()?;
        store.save(name, &bytes)?;
        log::info!("Model saved as '{}' ({} bytes)", name, bytes.len());
        Ok(())
    }

    /// Replace the network with a stored one; optimizer and loss are
    /// compiled fresh, exactly as `initialize` does
    pub fn load(&mut self, store: &dyn ModelStore, name: &str) -> FaultResult<()> {
        self.require_model("load")?;

        let snapshot = ModelSnapshot::from_bytes(&store.load(name)?)?;
        let mut config = snapshot.config.clone();
        config.seed = self.config.seed;
        config
            .validated()
            .map_err(|e| FaultError::Persistence(format!("stored model config: {}", e)))?;

        let network = snapshot.restore()?;
        check_topology(&network, &config)?;

        self.model = Some(CompiledModel::compile(network, &config));
        self.config = config;
        self.state = ClassifierState::Trained;
        log::info!(
            "Model '{}' loaded ({} mode, saved {})",
            name,
            self.config.mode,
            snapshot.saved_at.to_rfc3339()
        );
        Ok(())
    }
}
