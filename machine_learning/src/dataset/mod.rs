mod generator;
mod pattern;
mod sample;
mod target;

pub use generator::{DEFAULT_NOISE, generate_sample, make_training_data};
pub use pattern::Pattern;
pub use sample::Sample;
pub use target::target_for;
