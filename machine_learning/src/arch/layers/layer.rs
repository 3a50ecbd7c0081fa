use serde::{Deserialize, Serialize};

use crate::{MlErr, Result, arch::activations::ActFn};

/// A dense layer: its width and the activation it applies on the way out toward the next layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub neurons: usize,
    pub act_fn: Option<ActFn>,
}

impl LayerSpec {
    /// Creates a new `LayerSpec`.
    ///
    /// # Arguments
    /// * `neurons` - The amount of neurons in the layer.
    /// * `act_fn` - The activation applied to the values leaving this layer, `None` falls back to
    ///   the default activation.
    pub fn new(neurons: usize, act_fn: Option<ActFn>) -> Self {
        Self { neurons, act_fn }
    }

    /// The activation this layer actually applies.
    pub fn activation(&self) -> ActFn {
        self.act_fn.unwrap_or_default()
    }

    /// Checks that a stack of layers can be evaluated: an input and an output layer at least and
    /// no empty layer.
    pub fn validate_stack(layers: &[LayerSpec]) -> Result<()> {
        if layers.len() < 2 {
            return Err(MlErr::TooFewLayers { got: layers.len() });
        }

        match layers.iter().position(|layer| layer.neurons == 0) {
            Some(layer) => Err(MlErr::EmptyLayer { layer }),
            None => Ok(()),
        }
    }
}
