//! Training Progress & Cancellation
//!
//! Per-epoch progress goes to a `ProgressSink`: the log, a closure or a
//! tokio channel. Cancellation is a shared flag checked between epochs.
//! `EarlyStopping` watches val_loss and keeps the best epoch's weights.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

// ============================================================================
// EPOCH PROGRESS
// ============================================================================

/// Metrics for one completed epoch (1-based)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochProgress {
    pub epoch: usize,
    pub total_epochs: usize,
    pub loss: f32,
    /// Classification mode only
    pub accuracy: Option<f32>,
    /// Present when a validation split was held out
    pub val_loss: Option<f32>,
    pub val_accuracy: Option<f32>,
    /// Mean absolute error, sequence mode only
    #[serde(default)]
    pub mae: Option<f32>,
    #[serde(default)]
    pub val_mae: Option<f32>,
}

impl std::fmt::Display for EpochProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Epoch {}/{}: loss = {:.4}", self.epoch, self.total_epochs, self.loss)?;
        if let Some(acc) = self.accuracy {
            write!(f, ", accuracy = {:.4}", acc)?;
        }
        if let Some(val_loss) = self.val_loss {
            write!(f, ", val_loss = {:.4}", val_loss)?;
        }
        if let Some(val_acc) = self.val_accuracy {
            write!(f, ", val_accuracy = {:.4}", val_acc)?;
        }
        if let Some(mae) = self.mae {
            write!(f, ", mae = {:.4}", mae)?;
        }
        if let Some(val_mae) = self.val_mae {
            write!(f, ", val_mae = {:.4}", val_mae)?;
        }
        Ok(())
    }
}

// ============================================================================
// SINKS
// ============================================================================

pub trait ProgressSink: Send {
    fn on_epoch_end(&mut self, progress: &EpochProgress);
}

/// Writes each epoch to the `log` facade at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn on_epoch_end(&mut self, progress: &EpochProgress) {
        log::info!("{}", progress);
    }
}

impl<F> ProgressSink for F
where
    F: FnMut(&EpochProgress) + Send,
{
    fn on_epoch_end(&mut self, progress: &EpochProgress) {
        self(progress)
    }
}

/// Streams progress to a consumer task; a closed receiver is ignored
pub struct ChannelProgressSink {
    sender: UnboundedSender<EpochProgress>,
}

impl ChannelProgressSink {
    pub fn new(sender: UnboundedSender<EpochProgress>) -> Self {
        Self { sender }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn on_epoch_end(&mut self, progress: &EpochProgress) {
        if self.sender.send(progress.clone()).is_err() {
            log::debug!("Progress receiver dropped at epoch {}", progress.epoch);
        }
    }
}

// ============================================================================
// CANCELLATION
// ============================================================================

/// Cooperative cancellation flag; clones share state
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

// ============================================================================
// EARLY STOPPING
// ============================================================================

/// Stops after `patience` epochs without a strict val_loss improvement,
/// holding a copy of the best epoch's weights
#[derive(Debug, Clone)]
pub struct EarlyStopping<W> {
    patience: usize,
    best_loss: f32,
    best_epoch: Option<usize>,
    best_weights: Option<W>,
    epochs_without_improvement: usize,
}

impl<W: Clone> EarlyStopping<W> {
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            best_loss: f32::INFINITY,
            best_epoch: None,
            best_weights: None,
            epochs_without_improvement: 0,
        }
    }

    /// Record one epoch; true when training should stop
    pub fn observe(&mut self, epoch: usize, val_loss: f32, weights: &W) -> bool {
        if val_loss < self.best_loss {
            self.best_loss = val_loss;
            self.best_epoch = Some(epoch);
            self.best_weights = Some(weights.clone());
            self.epochs_without_improvement = 0;
            return false;
        }

        self.epochs_without_improvement += 1;
        self.epochs_without_improvement >= self.patience
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }

    pub fn best_loss(&self) -> Option<f32> {
        self.best_epoch.map(|_| self.best_loss)
    }

    pub fn take_best_weights(&mut self) -> Option<W> {
        self.best_weights.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(epoch: usize) -> EpochProgress {
        EpochProgress {
            epoch,
            total_epochs: 3,
            loss: 0.12345,
            accuracy: Some(0.5),
            val_loss: None,
            val_accuracy: None,
            mae: None,
            val_mae: None,
        }
    }

    #[test]
    fn test_display_format() {
        let line = sample(1).to_string();
        assert_eq!(line, "Epoch 1/3: loss = 0.1235, accuracy = 0.5000");

        let sequence = EpochProgress {
            accuracy: None,
            mae: Some(0.25),
            val_mae: Some(0.5),
            ..sample(2)
        };
        assert_eq!(
            sequence.to_string(),
            "Epoch 2/3: loss = 0.1235, mae = 0.2500, val_mae = 0.5000"
        );
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |p: &EpochProgress| seen.push(p.epoch);
            sink.on_epoch_end(&sample(1));
            sink.on_epoch_end(&sample(2));
        }
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn test_channel_sink_survives_closed_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let mut sink = ChannelProgressSink::new(tx);
        drop(rx);
        sink.on_epoch_end(&sample(1));
    }

    #[test]
    fn test_early_stopping_keeps_best_weights() {
        let mut stopper = EarlyStopping::new(2);

        assert!(!stopper.observe(1, 0.9, &"w1"));
        assert!(!stopper.observe(2, 0.5, &"w2"));
        assert!(!stopper.observe(3, 0.5, &"w3"));
        assert!(stopper.observe(4, 0.7, &"w4"));

        assert_eq!(stopper.best_epoch(), Some(2));
        assert_eq!(stopper.best_loss(), Some(0.5));
        assert_eq!(stopper.take_best_weights(), Some("w2"));
    }

    #[test]
    fn test_early_stopping_improvement_resets_patience() {
        let mut stopper = EarlyStopping::new(2);

        assert!(!stopper.observe(1, 1.0, &1));
        assert!(!stopper.observe(2, 1.2, &2));
        assert!(!stopper.observe(3, 0.8, &3));
        assert!(!stopper.observe(4, 0.9, &4));
        assert!(stopper.observe(5, f32::NAN, &5));
        assert_eq!(stopper.take_best_weights(), Some(3));
    }

    #[test]
    fn test_cancellation_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
