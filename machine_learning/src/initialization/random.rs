use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::{
    Result,
    arch::layers::{BiasTable, LayerSpec, WeightTable},
};

/// A weight generator that follows a certain probabilistic distribution.
pub struct RandWeightGen<D: Distribution<f32>> {
    distribution: D,
}

impl<D: Distribution<f32>> RandWeightGen<D> {
    /// Creates a new `RandWeightGen` weight generator.
    ///
    /// # Arguments
    /// * `distribution` - The distribution to sample the random numbers from.
    pub fn new(distribution: D) -> Self {
        Self { distribution }
    }

    /// Draws `n` weights.
    pub fn sample<R: Rng>(&self, n: usize, rng: &mut R) -> Vec<f32> {
        (0..n).map(|_| self.distribution.sample(rng)).collect()
    }
}

impl RandWeightGen<Uniform<f32>> {
    /// Creates a new `RandWeightGen` weight generator with a uniform distribution.
    ///
    /// # Arguments
    /// * `low` - The inclusive lower limit.
    /// * `high` - The exclusive upper limit.
    ///
    /// # Returns
    /// An error if the range is invalid (low >= high).
    pub fn uniform(low: f32, high: f32) -> Result<Self> {
        Ok(Self::new(Uniform::new(low, high)?))
    }

    /// Creates a new `RandWeightGen` weight generator using Xavier uniform initialization, the
    /// scale shrinks as the layers it connects grow.
    ///
    /// # Arguments
    /// * `fan_in` - The number of neurons in the source layer.
    /// * `fan_out` - The number of neurons in the destination layer.
    ///
    /// # Returns
    /// An error if the calculated range is invalid.
    pub fn xavier_uniform(fan_in: usize, fan_out: usize) -> Result<Self> {
        let range = (6. / (fan_in + fan_out) as f32).sqrt();
        Self::uniform(-range, range)
    }
}

/// Draws the weights of a single layer pair, `(from, from + 1)`.
pub fn random_pair<R: Rng>(layers: &[LayerSpec], from: usize, rng: &mut R) -> Result<Vec<f32>> {
    let (fan_in, fan_out) = (layers[from].neurons, layers[from + 1].neurons);
    let weight_gen = RandWeightGen::xavier_uniform(fan_in, fan_out)?;
    Ok(weight_gen.sample(fan_in * fan_out, rng))
}

/// Re-initializes every weight of the given layers with a layer-size dependent scale.
///
/// # Returns
/// A fresh weight table or an error if the stack is invalid.
pub fn random_weights<R: Rng>(layers: &[LayerSpec], rng: &mut R) -> Result<WeightTable> {
    LayerSpec::validate_stack(layers)?;

    let mut weights = WeightTable::new();
    for from in 0..layers.len() - 1 {
        weights.insert(from, random_pair(layers, from, rng)?);
    }

    Ok(weights)
}

/// Biases start at zero.
pub fn random_biases(layers: &[LayerSpec]) -> BiasTable {
    BiasTable::zeros(layers)
}
