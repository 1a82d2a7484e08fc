//! Dense Network
//!
//! Feed-forward stack of dense layers with an optional inverted dropout
//! after one hidden layer. Forward pass for inference, cached forward
//! pass plus backpropagation for training.

use ndarray::{Array1, Array2, Axis};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use serde::{Deserialize, Serialize};

// ============================================================================
// ACTIVATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Relu,
    Softmax,
    Linear,
}

fn activate(mut z: Array2<f32>, activation: Activation) -> Array2<f32> {
    match activation {
        Activation::Relu => z.mapv_inplace(|v| v.max(0.0)),
        Activation::Softmax => {
            for mut row in z.rows_mut() {
                let max = row.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
                row.mapv_inplace(|v| (v - max).exp());
                let sum = row.sum();
                if sum > 0.0 {
                    row /= sum;
                }
            }
        }
        Activation::Linear => {}
    }
    z
}

// ============================================================================
// DENSE LAYER
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer {
    /// `inputs × units`
    pub weights: Array2<f32>,
    pub bias: Array1<f32>,
    pub activation: Activation,
    /// L2 penalty on the kernel
    pub l2: f32,
}

impl DenseLayer {
    /// Glorot-uniform kernel, zero bias
    pub fn glorot<R: Rng>(
        inputs: usize,
        units: usize,
        activation: Activation,
        l2: f32,
        rng: &mut R,
    ) -> Self {
        let limit = (6.0 / (inputs + units) as f32).sqrt();
        let dist = Uniform::new_inclusive(-limit, limit);
        Self {
            weights: Array2::from_shape_fn((inputs, units), |_| dist.sample(rng)),
            bias: Array1::zeros(units),
            activation,
            l2,
        }
    }

    pub fn inputs(&self) -> usize {
        self.weights.nrows()
    }

    pub fn units(&self) -> usize {
        self.weights.ncols()
    }

    pub fn forward(&self, x: &Array2<f32>) -> Array2<f32> {
        activate(x.dot(&self.weights) + &self.bias, self.activation)
    }

    fn penalty(&self) -> f32 {
        if self.l2 > 0.0 {
            self.l2 * self.weights.iter().map(|w| w * w).sum::<f32>()
        } else {
            0.0
        }
    }
}

// ============================================================================
// NETWORK
// ============================================================================

/// Inverted dropout applied to the output of `after_layer`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dropout {
    pub after_layer: usize,
    pub rate: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    pub layers: Vec<DenseLayer>,
    pub dropout: Option<Dropout>,
}

/// Per-layer gradients, same order as `Network::layers`
#[derive(Debug, Clone)]
pub struct Gradients {
    pub weights: Vec<Array2<f32>>,
    pub bias: Vec<Array1<f32>>,
}

impl Gradients {
    pub fn is_finite(&self) -> bool {
        self.weights.iter().all(|g| g.iter().all(|v| v.is_finite()))
            && self.bias.iter().all(|g| g.iter().all(|v| v.is_finite()))
    }
}

/// Activations kept from a training forward pass
pub struct ForwardCache {
    /// Input fed to each layer (after dropout where applicable)
    inputs: Vec<Array2<f32>>,
    /// Raw activation of each layer (before dropout)
    outputs: Vec<Array2<f32>>,
    masks: Vec<Option<Array2<f32>>>,
}

impl ForwardCache {
    pub fn output(&self) -> Option<&Array2<f32>> {
        self.outputs.last()
    }
}

impl Network {
    pub fn input_dim(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::inputs)
    }

    pub fn output_dim(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::units)
    }

    /// Inference pass, dropout disabled
    pub fn predict(&self, x: &Array2<f32>) -> Array2<f32> {
        self.layers
            .iter()
            .fold(x.clone(), |acc, layer| layer.forward(&acc))
    }

    /// Training pass with dropout masks drawn from `rng`
    pub fn forward_train<R: Rng>(&self, x: &Array2<f32>, rng: &mut R) -> ForwardCache {
        let mut cache = ForwardCache {
            inputs: Vec::with_capacity(self.layers.len()),
            outputs: Vec::with_capacity(self.layers.len()),
            masks: Vec::with_capacity(self.layers.len()),
        };

        let mut current = x.clone();
        for (index, layer) in self.layers.iter().enumerate() {
            let output = layer.forward(&current);
            cache.inputs.push(current);

            let mask = match self.dropout {
                Some(dropout) if dropout.after_layer == index && dropout.rate > 0.0 => {
                    let keep = 1.0 - dropout.rate;
                    Some(output.mapv(|_| if rng.gen::<f32>() < keep { 1.0 / keep } else { 0.0 }))
                }
                _ => None,
            };

            current = match &mask {
                Some(mask) => &output * mask,
                None => output.clone(),
            };
            cache.outputs.push(output);
            cache.masks.push(mask);
        }
        cache
    }

    /// Backpropagate `delta`, the loss gradient w.r.t. the last layer's
    /// pre-activation. Includes the L2 kernel terms.
    pub fn backward(&self, cache: &ForwardCache, delta: Array2<f32>) -> Gradients {
        let count = self.layers.len();
        let mut weights = Vec::with_capacity(count);
        let mut bias = Vec::with_capacity(count);
        let mut delta = delta;

        for index in (0..count).rev() {
            let layer = &self.layers[index];
            let mut grad_w = cache.inputs[index].t().dot(&delta);
            if layer.l2 > 0.0 {
                grad_w.scaled_add(2.0 * layer.l2, &layer.weights);
            }
            weights.push(grad_w);
            bias.push(delta.sum_axis(Axis(0)));

            if index > 0 {
                let mut upstream = delta.dot(&layer.weights.t());
                if let Some(mask) = &cache.masks[index - 1] {
                    upstream *= mask;
                }
                // ReLU derivative on the previous hidden layer
                let previous = &cache.outputs[index - 1];
                upstream.zip_mut_with(previous, |g, &a| {
                    if a <= 0.0 {
                        *g = 0.0;
                    }
                });
                delta = upstream;
            }
        }

        weights.reverse();
        bias.reverse();
        Gradients { weights, bias }
    }

    /// Sum of the L2 kernel penalties
    pub fn l2_penalty(&self) -> f32 {
        self.layers.iter().map(DenseLayer::penalty).sum()
    }

    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.weights.len() + l.bias.len())
            .sum()
    }
}
