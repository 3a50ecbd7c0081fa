use serde::{Deserialize, Serialize};

/// The closed set of activation functions a layer applies to the values it sends to the next
/// layer. Absent or unknown kinds resolve to `Sigmoid`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActFn {
    Relu,
    #[default]
    Sigmoid,
    Tanh,
    Linear,
}

use ActFn::*;

impl ActFn {
    /// Parses an activation kind by name.
    ///
    /// # Arguments
    /// * `name` - One of `relu`, `sigmoid`, `tanh` or `linear`.
    ///
    /// # Returns
    /// The activation kind, or `None` if the name is unknown.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "relu" => Some(Relu),
            "sigmoid" => Some(Sigmoid),
            "tanh" => Some(Tanh),
            "linear" => Some(Linear),
            _ => None,
        }
    }

    /// Resolves an optional activation name, falling back to the default kind.
    pub fn resolve(name: Option<&str>) -> Self {
        name.and_then(Self::from_name).unwrap_or_default()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Relu => "relu",
            Sigmoid => "sigmoid",
            Tanh => "tanh",
            Linear => "linear",
        }
    }

    /// Evaluates the activation at the pre-activation value `z`.
    pub fn f(&self, z: f32) -> f32 {
        match self {
            // NaN must survive, `f32::max` would swallow it.
            Relu => {
                if z < 0. {
                    0.
                } else {
                    z
                }
            }
            Sigmoid => sigmoid(z),
            Tanh => z.tanh(),
            Linear => z,
        }
    }

    /// Evaluates the derivative of the activation at the pre-activation value `z`.
    pub fn df(&self, z: f32) -> f32 {
        match self {
            Relu => {
                if z > 0. {
                    1.
                } else {
                    0.
                }
            }
            Sigmoid => {
                let s = sigmoid(z);
                s * (1. - s)
            }
            Tanh => 1. - z.tanh().powi(2),
            Linear => 1.,
        }
    }
}

fn sigmoid(z: f32) -> f32 {
    1. / (1. + (-z).exp())
}
