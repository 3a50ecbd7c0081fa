use log::{info, warn};
use machine_learning::{
    arch::layers::{BiasTable, LayerSpec, WeightTable},
    dataset::{Pattern, Sample},
    initialization::random_pair,
    training::TrainOptions,
};
use rand::Rng;

use crate::{ConfigErr, NetworkConfig, Result, document::layer_key};

/// A document translated into engine types, ready to be trained.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    pub layers: Vec<LayerSpec>,
    pub weights: WeightTable,
    pub biases: BiasTable,
    pub options: TrainOptions,
    pub pattern: Pattern,
    pub sample_size: usize,
}

/// Translates between the persisted document and the training engine.
#[derive(Debug, Default)]
pub struct Adapter;

impl Adapter {
    pub fn new() -> Self {
        Self
    }

    /// Validates `config` and builds its engine counterpart.
    ///
    /// Weight entries the document lacks are drawn at random with a layer-size dependent scale,
    /// bias rows it lacks are zero.
    ///
    /// # Returns
    /// An error if the document is invalid or a present bias row has the wrong length.
    pub fn to_network<R: Rng>(&self, config: &NetworkConfig, rng: &mut R) -> Result<Network> {
        config.validate()?;

        let layers: Vec<_> = config
            .layers
            .iter()
            .map(|l| LayerSpec::new(l.num_neurons, l.activation_function))
            .collect();

        let weights = self.adapt_weights(config, &layers, rng)?;
        let biases = self.adapt_biases(config, &layers)?;

        let params = config.training_params;
        let options = TrainOptions {
            learning_rate: params.learning_rate,
            epochs: params.epochs,
            batch_size: params.batch_size,
            l2_factor: params.l2_factor,
        };

        Ok(Network {
            layers,
            weights,
            biases,
            options,
            pattern: config.dataset_type,
            sample_size: config.sample_size(),
        })
    }

    /// Writes trained parameters and the coordinates computed with them back into `config`.
    ///
    /// # Arguments
    /// * `weights` - The weights to store, keyed by layer pair.
    /// * `biases` - The biases to store.
    /// * `samples` - The dataset the coordinates belong to, stored as input points and targets.
    /// * `computed` - The network's output for every sample.
    pub fn apply(
        &self,
        config: &mut NetworkConfig,
        weights: &WeightTable,
        biases: &BiasTable,
        samples: &[Sample],
        computed: &[[f32; 3]],
    ) {
        config.weights = weights
            .iter()
            .map(|((from, _), w)| (layer_key(from), w.to_vec()))
            .collect();
        config.biases = biases.rows().to_vec();

        config.input_points = samples.iter().map(|s| s.input.to_vec()).collect();
        config.target_coordinates = samples.iter().map(|s| s.target.to_vec()).collect();
        config.computed_coordinates = computed.iter().map(|c| c.to_vec()).collect();
    }

    fn adapt_weights<R: Rng>(
        &self,
        config: &NetworkConfig,
        layers: &[LayerSpec],
        rng: &mut R,
    ) -> Result<WeightTable> {
        let mut weights = WeightTable::new();

        for from in 0..layers.len().saturating_sub(1) {
            let key = layer_key(from);
            let entry = match config.weights.get(&key) {
                Some(w) => w.clone(),
                None => {
                    info!("no weights for {key}, initializing them at random");
                    random_pair(layers, from, rng)?
                }
            };

            weights.insert(from, entry);
        }

        Ok(weights)
    }

    fn adapt_biases(&self, config: &NetworkConfig, layers: &[LayerSpec]) -> Result<BiasTable> {
        if config.biases.len() > layers.len() {
            warn!(
                "ignoring {} bias rows past the last layer",
                config.biases.len() - layers.len()
            );
        }

        let rows = layers
            .iter()
            .enumerate()
            .map(|(i, layer)| match config.biases.get(i) {
                Some(row) if row.len() == layer.neurons => Ok(row.clone()),
                Some(row) => Err(ConfigErr::Invalid(format!(
                    "Invalid number of biases for layer {i}. Expected {}, got {}",
                    layer.neurons,
                    row.len()
                ))),
                None => Ok(vec![0.; layer.neurons]),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BiasTable::new(rows))
    }
}
