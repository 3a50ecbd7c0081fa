use serde::{Deserialize, Serialize};

/// The shape the 2D inputs of a synthetic dataset are drawn from. Each pattern also decides how
/// an input is lifted into its 3D target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    #[default]
    Random,
    Circle,
    Gaussian,
    Spiral,
    Xor,
}

impl Pattern {
    pub const ALL: [Pattern; 5] = [
        Pattern::Random,
        Pattern::Circle,
        Pattern::Gaussian,
        Pattern::Spiral,
        Pattern::Xor,
    ];

    /// Parses a pattern by name, anything unknown is `Random`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "circle" => Pattern::Circle,
            "gaussian" => Pattern::Gaussian,
            "spiral" => Pattern::Spiral,
            "xor" => Pattern::Xor,
            _ => Pattern::Random,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Pattern::Random => "random",
            Pattern::Circle => "circle",
            Pattern::Gaussian => "gaussian",
            Pattern::Spiral => "spiral",
            Pattern::Xor => "xor",
        }
    }
}
