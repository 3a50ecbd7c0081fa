use serde::{Deserialize, Serialize};

/// A single supervised sample: a 2D input and the 3D coordinate it should map onto.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub input: [f32; 2],
    pub target: [f32; 3],
}

impl Sample {
    pub fn new(input: [f32; 2], target: [f32; 3]) -> Self {
        Self { input, target }
    }
}
