mod random;

pub use random::{RandWeightGen, random_biases, random_pair, random_weights};
