use std::ops::ControlFlow;

use log::{debug, info};
use rand::{Rng, seq::SliceRandom};

use super::{Normalization, TrainOptions, session::Session};
use crate::{
    MlErr, Result,
    arch::{
        Gradients, forward,
        layers::{BiasTable, LayerSpec, WeightTable},
        loss::{GeometricLoss, MAX_NEIGHBORS, nearest_neighbors},
    },
    dataset::Sample,
};

/// Mean losses below this end the run.
pub const EARLY_STOP_ERROR: f32 = 1e-4;
/// Cap on the L2 norm of each layer pair's weight gradient.
pub const MAX_GRAD_NORM: f32 = 0.5;
/// The learning rate of epoch `e` is `learning_rate * LR_DECAY^e`.
pub const LR_DECAY: f32 = 0.998;
/// Momentum of the first epoch, it ramps linearly toward `1` over the run.
pub const BASE_MOMENTUM: f32 = 0.9;

/// What a training run reports after every epoch.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    pub epoch: usize,
    /// Mean loss of the epoch, L2 penalty included.
    pub error: f32,
    pub weights: &'a WeightTable,
    pub biases: &'a BiasTable,
}

/// The outcome of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct Trained {
    pub weights: WeightTable,
    pub biases: BiasTable,
    /// The mean loss of the last epoch that ran.
    pub error: f32,
    /// The bounds the dataset was normalized with, needed to read the network's outputs.
    pub normalization: Normalization,
    /// How many epochs actually ran.
    pub epochs: usize,
}

/// Trains a stack of dense layers to map 2D inputs onto 3D targets with mini-batch momentum SGD.
pub struct Trainer<R: Rng> {
    layers: Vec<LayerSpec>,
    options: TrainOptions,
    loss_fn: GeometricLoss,
    rng: R,
}

impl<R: Rng> Trainer<R> {
    /// Creates a new `Trainer`.
    ///
    /// # Arguments
    /// * `layers` - The network, its first layer must be 2 neurons wide and its last one 3.
    /// * `options` - The hyperparameters of every run.
    /// * `rng` - The source of the per epoch shuffles.
    ///
    /// # Returns
    /// An error if the options or the layers can't be trained.
    pub fn new(layers: Vec<LayerSpec>, options: TrainOptions, rng: R) -> Result<Self> {
        options.validate()?;
        LayerSpec::validate_stack(&layers)?;

        let (input, output) = (layers[0].neurons, layers[layers.len() - 1].neurons);
        if input != 2 {
            return Err(MlErr::SizeMismatch {
                a: "input layer",
                b: "sample input",
                got: input,
                expected: 2,
            });
        }
        if output != 3 {
            return Err(MlErr::SizeMismatch {
                a: "output layer",
                b: "sample target",
                got: output,
                expected: 3,
            });
        }

        Ok(Self {
            layers,
            options,
            loss_fn: GeometricLoss::default(),
            rng,
        })
    }

    pub fn layers(&self) -> &[LayerSpec] {
        &self.layers
    }

    /// Trains a copy of the given parameters on `samples`.
    ///
    /// The samples are normalized first, the returned parameters and every reported error live in
    /// normalized space. `on_progress` is called once per epoch, returning `ControlFlow::Break`
    /// ends the run after that epoch.
    ///
    /// # Returns
    /// The trained parameters, or an error if the parameters don't match the layers, the dataset
    /// is empty or an epoch's loss stops being finite. The caller's parameters are never written.
    pub fn train<F>(
        &mut self,
        weights: &WeightTable,
        biases: &BiasTable,
        samples: &[Sample],
        mut on_progress: F,
    ) -> Result<Trained>
    where
        F: FnMut(Progress) -> ControlFlow<()>,
    {
        self.check_params(weights, biases, samples)?;

        let normalization = Normalization::fit(samples);
        let data: Vec<_> = samples.iter().map(|s| normalization.normalize(s)).collect();

        let TrainOptions {
            learning_rate,
            epochs,
            batch_size,
            l2_factor,
        } = self.options;

        info!(
            "training {:?} on {} samples for {epochs} epochs, learning rate {learning_rate}, batch size {batch_size}",
            self.layers.iter().map(|l| l.neurons).collect::<Vec<_>>(),
            data.len(),
        );

        let mut session = Session::new(&self.layers, weights, biases, l2_factor);
        let mut grad = Gradients::zeros(&self.layers);
        let mut order: Vec<_> = (0..data.len()).collect();

        for epoch in 0..epochs {
            order.shuffle(&mut self.rng);

            let momentum = BASE_MOMENTUM + (1. - BASE_MOMENTUM) * epoch as f32 / epochs as f32;
            let lr = learning_rate * LR_DECAY.powi(epoch as i32);
            session.schedule(lr / batch_size as f32, momentum);

            let mut total = 0.;
            let mut max_grad_norm = 0f32;
            for batch in order.chunks(batch_size) {
                grad.zero_grad();
                total += self.batch_loss(
                    &data,
                    batch,
                    &session.weights,
                    &session.biases,
                    Some(&mut grad),
                )?;

                let norms = grad.clip_weights(MAX_GRAD_NORM);
                max_grad_norm = norms.into_iter().fold(max_grad_norm, f32::max);
                session.step(&grad)?;
            }

            let error = total / data.len() as f32;
            if !error.is_finite() {
                return Err(MlErr::NonFiniteLoss { epoch });
            }

            session.epoch = epoch + 1;
            session.error = error;
            debug!(
                epoch = epoch,
                error = error,
                lr = lr,
                momentum = momentum,
                max_grad_norm = max_grad_norm;
                "finished epoch"
            );

            let flow = on_progress(Progress {
                epoch,
                error,
                weights: &session.weights,
                biases: &session.biases,
            });

            if error < EARLY_STOP_ERROR {
                info!("stopping early at epoch {epoch}, error {error}");
                break;
            }
            if flow.is_break() {
                info!("stopped by the progress callback at epoch {epoch}");
                break;
            }
        }

        info!("training finished after {} epochs, error {}", session.epoch, session.error);

        Ok(Trained {
            weights: session.weights,
            biases: session.biases,
            error: session.error,
            normalization,
            epochs: session.epoch,
        })
    }

    /// Computes the mean loss of the given parameters on `samples` the way an epoch does, with
    /// batches taken in dataset order and without updating anything.
    pub fn evaluate(
        &self,
        weights: &WeightTable,
        biases: &BiasTable,
        samples: &[Sample],
    ) -> Result<f32> {
        self.check_params(weights, biases, samples)?;

        let normalization = Normalization::fit(samples);
        let data: Vec<_> = samples.iter().map(|s| normalization.normalize(s)).collect();
        let order: Vec<_> = (0..data.len()).collect();

        let mut total = 0.;
        for batch in order.chunks(self.options.batch_size) {
            total += self.batch_loss(&data, batch, weights, biases, None)?;
        }

        Ok(total / data.len() as f32)
    }

    /// The loss of one batch plus the L2 penalty of the current weights. Gradients are only
    /// accumulated when `grad` is given.
    fn batch_loss(
        &self,
        data: &[Sample],
        batch: &[usize],
        weights: &WeightTable,
        biases: &BiasTable,
        mut grad: Option<&mut Gradients>,
    ) -> Result<f32> {
        let k = MAX_NEIGHBORS.min(self.options.batch_size - 1);
        let mut loss = 0.;

        for (pos, &idx) in batch.iter().enumerate() {
            let neighbors: Vec<_> = nearest_neighbors(data, batch, pos, k)
                .into_iter()
                .map(|n| &data[n])
                .collect();

            let example = &data[idx];
            loss += match grad.as_deref_mut() {
                Some(grad) => self.loss_fn.backprop(
                    &self.layers,
                    weights,
                    biases,
                    example,
                    &neighbors,
                    grad,
                )?,
                None => self
                    .loss_fn
                    .evaluate(&self.layers, weights, biases, example, &neighbors)?,
            };
        }

        Ok(loss + self.options.l2_factor * 0.5 * weights.sum_squares())
    }

    fn check_params(
        &self,
        weights: &WeightTable,
        biases: &BiasTable,
        samples: &[Sample],
    ) -> Result<()> {
        if samples.is_empty() {
            return Err(MlErr::EmptyDataset);
        }

        weights.validate(&self.layers)?;
        biases.validate(&self.layers)
    }
}

/// Forwards every sample's normalized input and maps the outputs back through the target bounds.
pub fn predict(
    layers: &[LayerSpec],
    weights: &WeightTable,
    biases: &BiasTable,
    samples: &[Sample],
    normalization: &Normalization,
) -> Result<Vec<[f32; 3]>> {
    samples
        .iter()
        .map(|sample| {
            let input = normalization.normalize_input(sample.input);
            let output = forward(&input, layers, weights, biases)?;
            let output: [f32; 3] =
                output
                    .as_slice()
                    .try_into()
                    .map_err(|_| MlErr::SizeMismatch {
                        a: "output layer",
                        b: "sample target",
                        got: output.len(),
                        expected: 3,
                    })?;

            Ok(normalization.denormalize_target(output))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::arch::activations::ActFn;

    fn layers() -> Vec<LayerSpec> {
        vec![
            LayerSpec::new(2, Some(ActFn::Tanh)),
            LayerSpec::new(4, Some(ActFn::Tanh)),
            LayerSpec::new(3, None),
        ]
    }

    fn trainer(options: TrainOptions) -> Trainer<StdRng> {
        Trainer::new(layers(), options, StdRng::seed_from_u64(7)).unwrap()
    }

    #[test]
    fn rejects_networks_of_the_wrong_width() {
        let narrow = vec![LayerSpec::new(2, None), LayerSpec::new(2, None)];
        let rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            Trainer::new(narrow, TrainOptions::default(), rng),
            Err(MlErr::SizeMismatch { got: 2, expected: 3, .. })
        ));
    }

    #[test]
    fn empty_datasets_are_rejected_up_front() {
        let layers = layers();
        let mut trainer = trainer(TrainOptions::default());
        let result = trainer.train(
            &WeightTable::zeros(&layers),
            &BiasTable::zeros(&layers),
            &[],
            |_| ControlFlow::Continue(()),
        );
        assert_eq!(result, Err(MlErr::EmptyDataset));
    }

    #[test]
    fn mismatched_parameters_abort_before_any_epoch() {
        let layers = layers();
        let mut weights = WeightTable::zeros(&layers);
        weights.insert(1, vec![0.; 5]);
        let samples = [Sample::new([0., 0.], [0., 0., 0.])];

        let mut calls = 0;
        let result = trainer(TrainOptions::default()).train(
            &weights,
            &BiasTable::zeros(&layers),
            &samples,
            |_| {
                calls += 1;
                ControlFlow::Continue(())
            },
        );

        assert!(matches!(result, Err(MlErr::WeightsLengthMismatch { .. })));
        assert_eq!(calls, 0);
    }

    #[test]
    fn evaluation_leaves_parameters_alone() {
        let layers = layers();
        let mut weights = WeightTable::zeros(&layers);
        weights.get_mut(0).unwrap()[0] = 0.5;
        let biases = BiasTable::zeros(&layers);
        let samples = [
            Sample::new([0., 0.], [0., 1., 0.]),
            Sample::new([1., 0.], [1., 0., 1.]),
        ];

        let trainer = trainer(TrainOptions::default());
        let first = trainer.evaluate(&weights, &biases, &samples).unwrap();
        let second = trainer.evaluate(&weights, &biases, &samples).unwrap();

        assert!(first > 0.);
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn predictions_come_back_in_target_units() {
        // Zero weights with linear layers always output 0, which maps back to the target minimum.
        let layers = [LayerSpec::new(2, Some(ActFn::Linear)), LayerSpec::new(3, None)];
        let samples = [
            Sample::new([0., 0.], [-1., 2., 4.]),
            Sample::new([1., 1.], [1., 3., 8.]),
        ];
        let normalization = Normalization::fit(&samples);

        let predicted = predict(
            &layers,
            &WeightTable::zeros(&layers),
            &BiasTable::zeros(&layers),
            &samples,
            &normalization,
        )
        .unwrap();

        assert_eq!(predicted, vec![[-1., 2., 4.]; 2]);
    }
}
