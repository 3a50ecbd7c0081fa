use super::layers::{BiasTable, LayerSpec, WeightTable};
use crate::optimization::clip_grad_norm;

/// Accumulated gradients of the loss with respect to every weight and bias, shaped exactly like
/// the parameters they belong to.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    pub weights: WeightTable,
    pub biases: BiasTable,
}

impl Gradients {
    /// Creates zeroed gradients for the given layers.
    pub fn zeros(layers: &[LayerSpec]) -> Self {
        Self {
            weights: WeightTable::zeros(layers),
            biases: BiasTable::zeros(layers),
        }
    }

    pub fn zero_grad(&mut self) {
        self.weights.fill_zeros();
        self.biases.fill_zeros();
    }

    /// Rescales the weight gradient of every layer pair whose L2 norm exceeds `max_norm`. Bias
    /// gradients are left untouched.
    ///
    /// # Returns
    /// The norms of each layer pair before clipping.
    pub fn clip_weights(&mut self, max_norm: f32) -> Vec<f32> {
        self.weights
            .iter_mut()
            .map(|(_, grad)| clip_grad_norm(grad, max_norm))
            .collect()
    }
}
