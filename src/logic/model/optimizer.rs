//! Adam optimizer
//!
//! Per-parameter first/second moments with bias-corrected step size.
//! Moments live only for the lifetime of the compiled model.

use ndarray::{Array, Array1, Array2, Dimension, Zip};

use super::network::{Gradients, Network};

pub const BETA1: f32 = 0.9;
pub const BETA2: f32 = 0.999;
pub const ADAM_EPSILON: f32 = 1e-7;

#[derive(Debug, Clone)]
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    t: u64,
    m_w: Vec<Array2<f32>>,
    v_w: Vec<Array2<f32>>,
    m_b: Vec<Array1<f32>>,
    v_b: Vec<Array1<f32>>,
}

impl Adam {
    pub fn new(lr: f32, network: &Network) -> Self {
        Self {
            lr,
            beta1: BETA1,
            beta2: BETA2,
            epsilon: ADAM_EPSILON,
            t: 0,
            m_w: network.layers.iter().map(|l| Array2::zeros(l.weights.raw_dim())).collect(),
            v_w: network.layers.iter().map(|l| Array2::zeros(l.weights.raw_dim())).collect(),
            m_b: network.layers.iter().map(|l| Array1::zeros(l.bias.raw_dim())).collect(),
            v_b: network.layers.iter().map(|l| Array1::zeros(l.bias.raw_dim())).collect(),
        }
    }

    pub fn learning_rate(&self) -> f32 {
        self.lr
    }

    pub fn step_count(&self) -> u64 {
        self.t
    }

    pub fn step(&mut self, network: &mut Network, grads: &Gradients) {
        self.t += 1;

        // Bias correction folded into the step size
        let lr_t = self.lr
            * ((1.0 - self.beta2.powi(self.t as i32)).sqrt()
                / (1.0 - self.beta1.powi(self.t as i32)));

        for (i, layer) in network.layers.iter_mut().enumerate() {
            update(
                &mut layer.weights,
                &grads.weights[i],
                &mut self.m_w[i],
                &mut self.v_w[i],
                self.beta1,
                self.beta2,
                self.epsilon,
                lr_t,
            );
            update(
                &mut layer.bias,
                &grads.bias[i],
                &mut self.m_b[i],
                &mut self.v_b[i],
                self.beta1,
                self.beta2,
                self.epsilon,
                lr_t,
            );
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn update<D: Dimension>(
    param: &mut Array<f32, D>,
    grad: &Array<f32, D>,
    m: &mut Array<f32, D>,
    v: &mut Array<f32, D>,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    lr_t: f32,
) {
    Zip::from(param)
        .and(grad)
        .and(m)
        .and(v)
        .for_each(|p, &g, m, v| {
            *m = beta1 * *m + (1.0 - beta1) * g;
            *v = beta2 * *v + (1.0 - beta2) * g * g;
            *p -= lr_t * *m / (v.sqrt() + epsilon);
        });
}
