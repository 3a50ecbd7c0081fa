use std::collections::BTreeMap;

use ndarray::{ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2};
use serde::{Deserialize, Serialize};

use super::LayerSpec;
use crate::{MlErr, Result};

/// A pair of adjacent layer indices, `(i, i + 1)`.
pub type LayerPair = (usize, usize);

/// The weights of a network, one flat buffer per pair of adjacent layers.
///
/// The buffer of the pair `(i, i + 1)` holds `neurons[i] * neurons[i + 1]` values laid out
/// row-major by source neuron, that is, the weight from neuron `k` to neuron `j` lives at
/// `k * neurons[i + 1] + j`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightTable {
    entries: BTreeMap<LayerPair, Vec<f32>>,
}

impl WeightTable {
    /// Creates an empty `WeightTable`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `WeightTable` with every entry the given layers need, filled with zeros.
    pub fn zeros(layers: &[LayerSpec]) -> Self {
        let entries = layers
            .windows(2)
            .enumerate()
            .map(|(i, pair)| ((i, i + 1), vec![0.; pair[0].neurons * pair[1].neurons]))
            .collect();

        Self { entries }
    }

    /// Sets the weights going from layer `from` to layer `from + 1`.
    ///
    /// # Returns
    /// The weights previously stored for that pair, if any.
    pub fn insert(&mut self, from: usize, weights: Vec<f32>) -> Option<Vec<f32>> {
        self.entries.insert((from, from + 1), weights)
    }

    /// Returns the weights going from layer `from` to layer `from + 1`.
    pub fn get(&self, from: usize) -> Option<&[f32]> {
        self.entries.get(&(from, from + 1)).map(Vec::as_slice)
    }

    pub fn get_mut(&mut self, from: usize) -> Option<&mut [f32]> {
        self.entries.get_mut(&(from, from + 1)).map(Vec::as_mut_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LayerPair, &[f32])> {
        self.entries.iter().map(|(pair, w)| (*pair, w.as_slice()))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (LayerPair, &mut [f32])> {
        self.entries
            .iter_mut()
            .map(|(pair, w)| (*pair, w.as_mut_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The sum of the squares of every weight in the table.
    pub fn sum_squares(&self) -> f32 {
        self.entries.values().flatten().map(|w| w * w).sum()
    }

    /// Sets every weight to zero, keeping the shapes.
    pub fn fill_zeros(&mut self) {
        self.entries.values_mut().for_each(|w| w.fill(0.));
    }

    /// Checks that every adjacent pair of `layers` has an entry of exactly the expected length.
    pub fn validate(&self, layers: &[LayerSpec]) -> Result<()> {
        (0..layers.len().saturating_sub(1)).try_for_each(|i| self.checked(layers, i).map(|_| ()))
    }

    /// Gives a view of the weights of the pair `(from, from + 1)` as a matrix of shape
    /// `(neurons[from], neurons[from + 1])`.
    ///
    /// # Returns
    /// An error if the entry is missing or has the wrong length.
    pub fn view(&self, layers: &[LayerSpec], from: usize) -> Result<ArrayView2<'_, f32>> {
        let (weights, dim) = self.checked(layers, from)?;
        // SAFETY: the length was just checked against the shape.
        Ok(ArrayView2::from_shape(dim, weights).unwrap())
    }

    pub fn view_mut(&mut self, layers: &[LayerSpec], from: usize) -> Result<ArrayViewMut2<'_, f32>> {
        let (_, dim) = self.checked(layers, from)?;
        let weights = self
            .get_mut(from)
            .ok_or(MlErr::MissingWeights { from, to: from + 1 })?;
        // SAFETY: the length was just checked against the shape.
        Ok(ArrayViewMut2::from_shape(dim, weights).unwrap())
    }

    fn checked(&self, layers: &[LayerSpec], from: usize) -> Result<(&[f32], (usize, usize))> {
        let to = from + 1;
        let (Some(src), Some(dst)) = (layers.get(from), layers.get(to)) else {
            return Err(MlErr::SizeMismatch {
                a: "layer pair",
                b: "layers",
                got: to,
                expected: layers.len().saturating_sub(1),
            });
        };

        let weights = self.get(from).ok_or(MlErr::MissingWeights { from, to })?;
        let expected = src.neurons * dst.neurons;
        if weights.len() != expected {
            return Err(MlErr::WeightsLengthMismatch {
                from,
                to,
                got: weights.len(),
                expected,
            });
        }

        Ok((weights, (src.neurons, dst.neurons)))
    }
}

/// The biases of a network, one row per layer. The input layer's row is conventionally unused.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BiasTable {
    rows: Vec<Vec<f32>>,
}

impl BiasTable {
    /// Creates a new `BiasTable` from raw rows.
    pub fn new(rows: Vec<Vec<f32>>) -> Self {
        Self { rows }
    }

    /// Creates a `BiasTable` matching the given layers, filled with zeros.
    pub fn zeros(layers: &[LayerSpec]) -> Self {
        let rows = layers.iter().map(|layer| vec![0.; layer.neurons]).collect();
        Self { rows }
    }

    pub fn get(&self, layer: usize) -> Option<&[f32]> {
        self.rows.get(layer).map(Vec::as_slice)
    }

    pub fn get_mut(&mut self, layer: usize) -> Option<&mut [f32]> {
        self.rows.get_mut(layer).map(Vec::as_mut_slice)
    }

    pub fn rows(&self) -> &[Vec<f32>] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        self.rows.iter_mut().map(Vec::as_mut_slice)
    }

    pub fn fill_zeros(&mut self) {
        self.rows.iter_mut().for_each(|row| row.fill(0.));
    }

    /// Checks that there is one row per layer, each as long as its layer is wide.
    pub fn validate(&self, layers: &[LayerSpec]) -> Result<()> {
        (0..layers.len()).try_for_each(|layer| self.checked(layers, layer).map(|_| ()))
    }

    /// Gives a view of the biases of `layer`.
    ///
    /// # Returns
    /// An error if the row is missing or has the wrong length.
    pub fn view(&self, layers: &[LayerSpec], layer: usize) -> Result<ArrayView1<'_, f32>> {
        self.checked(layers, layer).map(ArrayView1::from)
    }

    pub fn view_mut(&mut self, layers: &[LayerSpec], layer: usize) -> Result<ArrayViewMut1<'_, f32>> {
        self.checked(layers, layer)?;
        let row = self.get_mut(layer).ok_or(MlErr::MissingBiases { layer })?;
        Ok(ArrayViewMut1::from(row))
    }

    fn checked(&self, layers: &[LayerSpec], layer: usize) -> Result<&[f32]> {
        let expected = layers.get(layer).map(|l| l.neurons).ok_or(MlErr::SizeMismatch {
            a: "bias row",
            b: "layers",
            got: layer,
            expected: layers.len(),
        })?;

        let row = self.get(layer).ok_or(MlErr::MissingBiases { layer })?;
        if row.len() != expected {
            return Err(MlErr::BiasesLengthMismatch {
                layer,
                got: row.len(),
                expected,
            });
        }

        Ok(row)
    }
}
