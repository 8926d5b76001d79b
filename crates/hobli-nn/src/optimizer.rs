//! Adam optimizer state and parameter updates.

use crate::network::Mlp;

/// Per-layer parameter gradients (or moment estimates) shaped like the network.
#[derive(Debug, Clone)]
pub(crate) struct LayerBuffers {
    pub(crate) weights: Vec<f64>,
    pub(crate) biases: Vec<f64>,
}

/// Allocate zeroed buffers matching every layer of `net`.
pub(crate) fn zeroed_like(net: &Mlp) -> Vec<LayerBuffers> {
    net.layers
        .iter()
        .map(|l| LayerBuffers {
            weights: vec![0.0; l.weights.len()],
            biases: vec![0.0; l.biases.len()],
        })
        .collect()
}

/// Adam with bias-corrected first and second moment estimates.
#[derive(Debug, Clone)]
pub(crate) struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    step: i32,
    m: Vec<LayerBuffers>,
    v: Vec<LayerBuffers>,
}

impl Adam {
    pub(crate) const BETA1: f64 = 0.9;
    pub(crate) const BETA2: f64 = 0.999;
    pub(crate) const EPSILON: f64 = 1e-7;

    pub(crate) fn new(net: &Mlp, learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: Self::BETA1,
            beta2: Self::BETA2,
            epsilon: Self::EPSILON,
            step: 0,
            m: zeroed_like(net),
            v: zeroed_like(net),
        }
    }

    /// Apply one update using `grads`.
    pub(crate) fn apply(&mut self, net: &mut Mlp, grads: &[LayerBuffers]) {
        self.step += 1;
        let correction1 = 1.0 - self.beta1.powi(self.step);
        let correction2 = 1.0 - self.beta2.powi(self.step);
        let lr_t = self.learning_rate * correction2.sqrt() / correction1;

        for (((layer, g), m), v) in net
            .layers
            .iter_mut()
            .zip(grads)
            .zip(&mut self.m)
            .zip(&mut self.v)
        {
            update(
                &mut layer.weights,
                &g.weights,
                &mut m.weights,
                &mut v.weights,
                self.beta1,
                self.beta2,
                self.epsilon,
                lr_t,
            );
            update(
                &mut layer.biases,
                &g.biases,
                &mut m.biases,
                &mut v.biases,
                self.beta1,
                self.beta2,
                self.epsilon,
                lr_t,
            );
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn update(
    params: &mut [f64],
    grads: &[f64],
    m: &mut [f64],
    v: &mut [f64],
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    lr_t: f64,
) {
    for i in 0..params.len() {
        let g = grads[i];
        m[i] = beta1 * m[i] + (1.0 - beta1) * g;
        v[i] = beta2 * v[i] + (1.0 - beta2) * g * g;
        params[i] -= lr_t * m[i] / (v[i].sqrt() + epsilon);
    }
}
