//! Loss Functions
//!
//! Each loss returns its value and the gradient w.r.t. the output layer's
//! pre-activation, already divided by the batch size.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Probability clip for cross-entropy
pub const EPSILON: f32 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossKind {
    /// Pairs with a softmax head
    CategoricalCrossEntropy,
    /// Pairs with a linear head
    MeanSquaredError,
}

impl LossKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LossKind::CategoricalCrossEntropy => "categorical_crossentropy",
            LossKind::MeanSquaredError => "mean_squared_error",
        }
    }

    /// Mean loss over the batch
    pub fn value(&self, predictions: &Array2<f32>, targets: &Array2<f32>) -> f32 {
        let n = predictions.nrows().max(1) as f32;
        match self {
            LossKind::CategoricalCrossEntropy => {
                let total: f32 = predictions
                    .iter()
                    .zip(targets.iter())
                    .map(|(&p, &y)| -y * p.clamp(EPSILON, 1.0 - EPSILON).ln())
                    .sum();
                total / n
            }
            LossKind::MeanSquaredError => {
                let count = predictions.len().max(1) as f32;
                let total: f32 = predictions
                    .iter()
                    .zip(targets.iter())
                    .map(|(&p, &y)| (p - y) * (p - y))
                    .sum();
                total / count
            }
        }
    }

    /// Gradient w.r.t. the pre-activation of the output layer
    pub fn delta(&self, predictions: &Array2<f32>, targets: &Array2<f32>) -> Array2<f32> {
        let n = predictions.nrows().max(1) as f32;
        match self {
            LossKind::CategoricalCrossEntropy => {
                // softmax + CE with (possibly multi-hot) targets: p * sum(y) - y
                let target_mass = targets.sum_axis(Axis(1)).insert_axis(Axis(1));
                (predictions * &target_mass - targets) / n
            }
            LossKind::MeanSquaredError => {
                let count = predictions.len().max(1) as f32;
                (predictions - targets) * (2.0 / count)
            }
        }
    }
}

/// Row-wise arg-max
pub fn argmax_rows(values: &Array2<f32>) -> Vec<usize> {
    values
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |(best, max), (i, &v)| {
                    if v > max {
                        (i, v)
                    } else {
                        (best, max)
                    }
                })
                .0
        })
        .collect()
}

/// Share of rows where prediction and target agree on the arg-max
pub fn categorical_accuracy(predictions: &Array2<f32>, targets: &Array2<f32>) -> f32 {
    if predictions.nrows() == 0 {
        return 0.0;
    }
    let hits = argmax_rows(predictions)
        .into_iter()
        .zip(argmax_rows(targets))
        .filter(|(p, t)| p == t)
        .count();
    hits as f32 / predictions.nrows() as f32
}

/// Mean absolute error over every element
pub fn mean_absolute_error(predictions: &Array2<f32>, targets: &Array2<f32>) -> f32 {
    if predictions.is_empty() {
        return 0.0;
    }
    (predictions - targets).mapv(f32::abs).sum() / predictions.len() as f32
}
