use crate::{
    Result,
    arch::{
        Gradients,
        layers::{BiasTable, LayerSpec, WeightTable},
    },
    optimization::{GradientDescentWithMomentum, Optimizer},
};

/// The parameters of a network while a run trains them, together with their momentum.
///
/// A session is owned by a single run, nothing else writes its parameters until the run hands
/// them back.
pub(super) struct Session {
    pub weights: WeightTable,
    pub biases: BiasTable,
    weight_optimizers: Vec<GradientDescentWithMomentum>,
    bias_optimizers: Vec<GradientDescentWithMomentum>,
    pub epoch: usize,
    pub error: f32,
}

impl Session {
    /// Snapshots the parameters the given layers use, the caller keeps its own copy untouched.
    /// Only the weights get the L2 term in their updates.
    ///
    /// The parameters must already be validated against `layers`.
    pub fn new(
        layers: &[LayerSpec],
        weights: &WeightTable,
        biases: &BiasTable,
        l2_factor: f32,
    ) -> Self {
        let mut snapshot = WeightTable::new();
        for from in 0..layers.len() - 1 {
            if let Some(w) = weights.get(from) {
                snapshot.insert(from, w.to_vec());
            }
        }
        let biases = BiasTable::new(biases.rows()[..layers.len()].to_vec());

        let weight_optimizers = snapshot
            .iter()
            .map(|(_, w)| GradientDescentWithMomentum::new(w.len(), 0., 0., l2_factor))
            .collect();
        let bias_optimizers = biases
            .rows()
            .iter()
            .map(|b| GradientDescentWithMomentum::new(b.len(), 0., 0., 0.))
            .collect();

        Self {
            weights: snapshot,
            biases,
            weight_optimizers,
            bias_optimizers,
            epoch: 0,
            error: f32::INFINITY,
        }
    }

    /// Sets the step size and momentum of every parameter for the coming updates.
    pub fn schedule(&mut self, step: f32, momentum: f32) {
        self.weight_optimizers
            .iter_mut()
            .chain(self.bias_optimizers.iter_mut())
            .for_each(|optimizer| optimizer.schedule(step, momentum));
    }

    /// Applies one update with the given gradients.
    pub fn step(&mut self, grad: &Gradients) -> Result<()> {
        let weights = self.weights.iter_mut().zip(grad.weights.iter());
        for (((_, w), (_, g)), optimizer) in weights.zip(&mut self.weight_optimizers) {
            optimizer.update_params(g, w)?;
        }

        let biases = self.biases.rows_mut().zip(grad.biases.rows());
        for ((b, g), optimizer) in biases.zip(&mut self.bias_optimizers) {
            optimizer.update_params(g, b)?;
        }

        Ok(())
    }
}
