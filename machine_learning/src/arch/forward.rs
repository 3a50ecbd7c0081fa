use ndarray::{Array1, ArrayView1};

use super::layers::{BiasTable, LayerSpec, WeightTable};
use crate::{MlErr, Result};

/// The values a forward pass went through, kept for backpropagation.
///
/// `activations[0]` is the raw input and `activations[i]` the output of layer `i`.
/// `sums[i]` holds the pre-activation sums that produced `activations[i]`, the input layer has
/// none so `sums[0]` is empty.
pub(crate) struct Trace {
    pub activations: Vec<Array1<f32>>,
    pub sums: Vec<Array1<f32>>,
}

impl Trace {
    /// The output of the network.
    pub fn output(&self) -> ArrayView1<'_, f32> {
        // SAFETY: a trace always holds the input and at least one more layer.
        self.activations.last().unwrap().view()
    }
}

/// Evaluates the network for one input.
///
/// Each transition `i -> i + 1` computes `bias[i + 1][j] + sum_k current[k] * w[i][k][j]` and
/// applies the activation of the *source* layer `i`. The values produced by the last transition
/// are clamped to `[-1, 1]`.
///
/// # Arguments
/// * `input` - The raw input, as wide as the first layer.
/// * `layers` - The layer stack.
/// * `weights` - One entry per adjacent pair of layers.
/// * `biases` - One row per layer.
///
/// # Returns
/// The output vector or an error if any traversed weight or bias entry is missing or misshapen.
pub fn forward(
    input: &[f32],
    layers: &[LayerSpec],
    weights: &WeightTable,
    biases: &BiasTable,
) -> Result<Vec<f32>> {
    let trace = trace(input, layers, weights, biases)?;
    Ok(trace.output().to_vec())
}

pub(crate) fn trace(
    input: &[f32],
    layers: &[LayerSpec],
    weights: &WeightTable,
    biases: &BiasTable,
) -> Result<Trace> {
    LayerSpec::validate_stack(layers)?;

    if input.len() != layers[0].neurons {
        return Err(MlErr::SizeMismatch {
            a: "input",
            b: "input layer",
            got: input.len(),
            expected: layers[0].neurons,
        });
    }

    let last = layers.len() - 2;
    let mut activations = Vec::with_capacity(layers.len());
    let mut sums = Vec::with_capacity(layers.len());
    activations.push(ArrayView1::from(input).to_owned());
    sums.push(Array1::zeros(0));

    for (i, pair) in layers.windows(2).enumerate() {
        let w = weights.view(layers, i)?;
        let b = biases.view(layers, i + 1)?;
        let act_fn = pair[0].activation();

        let z = activations[i].dot(&w) + &b;
        let mut a = z.mapv(|z| act_fn.f(z));
        if i == last {
            a.mapv_inplace(|a| a.clamp(-1., 1.));
        }

        sums.push(z);
        activations.push(a);
    }

    Ok(Trace { activations, sums })
}
