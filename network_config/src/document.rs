use std::collections::BTreeMap;

use machine_learning::{arch::activations::ActFn, dataset::Pattern};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{ConfigErr, Result};

pub const DEFAULT_SAMPLE_SIZE: usize = 100;

/// One layer of the document's network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeuronLayer {
    pub num_neurons: usize,
    #[serde(default)]
    pub activation_function: Option<ActFn>,
}

impl NeuronLayer {
    pub fn new(num_neurons: usize, activation_function: Option<ActFn>) -> Self {
        Self {
            num_neurons,
            activation_function,
        }
    }
}

/// The hyperparameters stored along the network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingParams {
    pub learning_rate: f32,
    pub epochs: usize,
    pub batch_size: usize,
    pub l2_factor: f32,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            epochs: 100,
            batch_size: 32,
            l2_factor: 0.00005,
        }
    }
}

impl TrainingParams {
    fn validate(&self) -> Result<()> {
        check_range("learning_rate", self.learning_rate, 0.0001, 1.)?;
        check_range("epochs", self.epochs, 1, 1000)?;
        check_range("batch_size", self.batch_size, 1, 1000)?;
        check_range("l2_factor", self.l2_factor, 0., 1.)
    }
}

/// A whole network as persisted: its structure and parameters, the dataset it's trained on and
/// the last coordinates computed with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub layers: Vec<NeuronLayer>,
    /// Weights keyed `layer{i}_{i+1}`.
    #[serde(default)]
    pub weights: BTreeMap<String, Vec<f32>>,
    #[serde(default)]
    pub biases: Vec<Vec<f32>>,
    #[serde(default = "default_sample_size")]
    pub sample_size: Option<usize>,
    #[serde(default)]
    pub dataset_type: Pattern,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub computed_coordinates: Vec<Vec<f32>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub input_points: Vec<Vec<f32>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub target_coordinates: Vec<Vec<f32>>,
    #[serde(default)]
    pub training_params: TrainingParams,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        let weights = BTreeMap::from([(layer_key(0), vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6])]);

        Self {
            layers: vec![
                NeuronLayer::new(2, Some(ActFn::Relu)),
                NeuronLayer::new(3, None),
            ],
            weights,
            biases: Vec::new(),
            sample_size: default_sample_size(),
            dataset_type: Pattern::default(),
            computed_coordinates: Vec::new(),
            input_points: Vec::new(),
            target_coordinates: Vec::new(),
            training_params: TrainingParams::default(),
        }
    }
}

impl NetworkConfig {
    /// The amount of samples to generate, `DEFAULT_SAMPLE_SIZE` when unset.
    pub fn sample_size(&self) -> usize {
        self.sample_size.unwrap_or(DEFAULT_SAMPLE_SIZE)
    }

    /// The neuron count of every layer, in order.
    pub fn neurons(&self) -> Vec<usize> {
        self.layers.iter().map(|l| l.num_neurons).collect()
    }

    /// Checks the document's rules.
    ///
    /// # Returns
    /// An error naming the first rule broken.
    pub fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(invalid("network must have at least one layer".into()));
        }

        if let Some(i) = self.layers.iter().position(|l| l.num_neurons == 0) {
            return Err(invalid(format!("layer {i} must have at least one neuron")));
        }

        for (key, weights) in &self.weights {
            let i = parse_layer_key(key)
                .filter(|&i| i + 1 < self.layers.len())
                .ok_or_else(|| invalid(format!("{key} is not a pair of adjacent layers")))?;

            let expected = self.layers[i].num_neurons * self.layers[i + 1].num_neurons;
            if weights.len() != expected {
                return Err(invalid(format!(
                    "Invalid number of weights for {key}. Expected {expected}, got {}",
                    weights.len()
                )));
            }
        }

        if self.sample_size == Some(0) {
            return Err(invalid("sample_size must be greater than 0".into()));
        }

        self.training_params.validate()
    }
}

/// The key of the weights going from layer `i` to layer `i + 1`.
pub fn layer_key(i: usize) -> String {
    format!("layer{i}_{}", i + 1)
}

/// Parses a `layer{i}_{i+1}` key back into `i`.
///
/// # Returns
/// `None` if the key is malformed, not adjacent or not written exactly as `layer_key(i)` would
/// write it, e.g. `layer00_1`.
pub fn parse_layer_key(key: &str) -> Option<usize> {
    let (from, _) = key.strip_prefix("layer")?.split_once('_')?;
    let from: usize = from.parse().ok()?;
    (layer_key(from) == key).then_some(from)
}

fn default_sample_size() -> Option<usize> {
    Some(DEFAULT_SAMPLE_SIZE)
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn check_range<T: PartialOrd + std::fmt::Display>(name: &str, v: T, low: T, high: T) -> Result<()> {
    if v >= low && v <= high {
        return Ok(());
    }

    Err(invalid(format!("{name} ({v}) must be within [{low}, {high}]")))
}

fn invalid(msg: String) -> ConfigErr {
    ConfigErr::Invalid(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_document_is_valid() {
        let config = NetworkConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.neurons(), vec![2, 3]);
        assert_eq!(config.sample_size(), 100);
        assert_eq!(config.training_params.epochs, 100);
    }

    #[test]
    fn layer_keys() {
        assert_eq!(layer_key(2), "layer2_3");
        assert_eq!(parse_layer_key("layer2_3"), Some(2));
        assert_eq!(parse_layer_key("layer2_4"), None);
        assert_eq!(parse_layer_key("layer_1"), None);
        assert_eq!(parse_layer_key("weights0_1"), None);
    }

    #[test]
    fn only_canonical_layer_keys_parse() {
        for key in ["layer00_1", "layer1_02", "layer+0_1", "layer0_+1", "layer0_1 "] {
            assert_eq!(parse_layer_key(key), None, "{key}");
        }
    }

    #[test]
    fn non_canonical_weight_keys_are_rejected() {
        let mut config = NetworkConfig::default();
        config.weights.clear();
        config.weights.insert("layer00_1".into(), vec![9.; 6]);
        assert!(matches!(config.validate(), Err(ConfigErr::Invalid(_))));

        let mut config = NetworkConfig::default();
        config.weights.insert("layer+0_1".into(), vec![9.; 6]);
        assert!(matches!(config.validate(), Err(ConfigErr::Invalid(_))));
    }

    #[test]
    fn wrong_weight_count_names_the_key() {
        let mut config = NetworkConfig::default();
        config.weights.insert(layer_key(0), vec![0.; 5]);

        let Err(ConfigErr::Invalid(msg)) = config.validate() else {
            panic!("expected an invalid config");
        };
        assert_eq!(msg, "Invalid number of weights for layer0_1. Expected 6, got 5");
    }

    #[test]
    fn weights_past_the_last_layer_are_rejected() {
        let mut config = NetworkConfig::default();
        config.weights.insert(layer_key(1), vec![0.; 3]);
        assert!(matches!(config.validate(), Err(ConfigErr::Invalid(_))));
    }

    #[test]
    fn training_params_out_of_range() {
        let mut config = NetworkConfig::default();
        config.training_params.epochs = 1001;
        assert!(config.validate().is_err());

        let mut config = NetworkConfig::default();
        config.training_params.learning_rate = 0.;
        assert!(config.validate().is_err());
    }

    #[test]
    fn minimal_json_gets_defaults() {
        let json = r#"{
            "layers": [
                {"num_neurons": 2, "activation_function": "tanh"},
                {"num_neurons": 3}
            ],
            "computed_coordinates": null,
            "dataset_type": "spiral"
        }"#;

        let config: NetworkConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.layers[0].activation_function, Some(ActFn::Tanh));
        assert_eq!(config.layers[1].activation_function, None);
        assert_eq!(config.dataset_type, Pattern::Spiral);
        assert_eq!(config.sample_size, Some(100));
        assert!(config.computed_coordinates.is_empty());
        assert_eq!(config.training_params, TrainingParams::default());
    }

    #[test]
    fn unknown_activation_or_dataset_is_a_parse_error() {
        let json = r#"{"layers": [{"num_neurons": 2, "activation_function": "softmax"}]}"#;
        assert!(serde_json::from_str::<NetworkConfig>(json).is_err());

        let json = r#"{"layers": [{"num_neurons": 2}], "dataset_type": "moons"}"#;
        assert!(serde_json::from_str::<NetworkConfig>(json).is_err());
    }
}
