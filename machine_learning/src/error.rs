use std::{
    error::Error,
    fmt::{self, Display},
};

use rand_distr::uniform::Error as UniformError;

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug, Clone, PartialEq)]
pub enum MlErr {
    TooFewLayers {
        got: usize,
    },
    EmptyLayer {
        layer: usize,
    },
    MissingWeights {
        from: usize,
        to: usize,
    },
    WeightsLengthMismatch {
        from: usize,
        to: usize,
        got: usize,
        expected: usize,
    },
    MissingBiases {
        layer: usize,
    },
    BiasesLengthMismatch {
        layer: usize,
        got: usize,
        expected: usize,
    },
    SizeMismatch {
        a: &'static str,
        b: &'static str,
        got: usize,
        expected: usize,
    },
    InvalidOption {
        option: &'static str,
        reason: &'static str,
    },
    EmptyDataset,
    NonFiniteLoss {
        epoch: usize,
    },
    Distribution(String),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MlErr::TooFewLayers { got } => {
                format!("A network needs at least an input and an output layer, got {got} layers")
            }
            MlErr::EmptyLayer { layer } => format!("Layer {layer} has no neurons"),
            MlErr::MissingWeights { from, to } => {
                format!("There are no weights for the layer pair {from} -> {to}")
            }
            MlErr::WeightsLengthMismatch {
                from,
                to,
                got,
                expected,
            } => format!(
                "The weights of the layer pair {from} -> {to} have length {got}, expected {expected}"
            ),
            MlErr::MissingBiases { layer } => format!("There are no biases for layer {layer}"),
            MlErr::BiasesLengthMismatch {
                layer,
                got,
                expected,
            } => format!("The biases of layer {layer} have length {got}, expected {expected}"),
            MlErr::SizeMismatch {
                a,
                b,
                got,
                expected,
            } => {
                format!(
                    "There's a size mismatch between {a} and {b}, got {got} and expected {expected}"
                )
            }
            MlErr::InvalidOption { option, reason } => {
                format!("Invalid training option `{option}`: {reason}")
            }
            MlErr::EmptyDataset => "Tried to train on an empty dataset".to_string(),
            MlErr::NonFiniteLoss { epoch } => {
                format!("The loss stopped being finite at epoch {epoch}")
            }
            MlErr::Distribution(e) => format!("Failed to build a distribution: {e}"),
        };

        write!(f, "{s}")
    }
}

impl Error for MlErr {}

impl From<UniformError> for MlErr {
    fn from(value: UniformError) -> Self {
        Self::Distribution(value.to_string())
    }
}
