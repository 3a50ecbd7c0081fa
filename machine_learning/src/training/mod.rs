mod normalization;
mod options;
mod session;
mod trainer;

use rand::{SeedableRng, rngs::StdRng};

pub use normalization::{Bounds, Normalization};
pub use options::TrainOptions;
pub use trainer::{
    BASE_MOMENTUM, EARLY_STOP_ERROR, LR_DECAY, MAX_GRAD_NORM, Progress, Trained, Trainer, predict,
};

/// Creates the random generator of a run, seeded when `seed` is given and from the OS otherwise.
pub fn generate_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
