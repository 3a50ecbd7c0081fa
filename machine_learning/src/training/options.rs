use serde::{Deserialize, Serialize};

use crate::{MlErr, Result};

/// Hyperparameters of a training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainOptions {
    pub learning_rate: f32,
    pub epochs: usize,
    pub batch_size: usize,
    pub l2_factor: f32,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            epochs: 200,
            batch_size: 32,
            l2_factor: 0.00005,
        }
    }
}

impl TrainOptions {
    /// Rejects options a run can't start with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |option, reason| Err(MlErr::InvalidOption { option, reason });

        if !(self.learning_rate.is_finite() && self.learning_rate > 0.) {
            return invalid("learning_rate", "must be a positive number");
        }
        if self.epochs == 0 {
            return invalid("epochs", "must be at least 1");
        }
        if self.batch_size == 0 {
            return invalid("batch_size", "must be at least 1");
        }
        if !(self.l2_factor.is_finite() && self.l2_factor >= 0.) {
            return invalid("l2_factor", "must be a non-negative number");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = TrainOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.epochs, 200);
        assert_eq!(options.batch_size, 32);
    }

    #[test]
    fn rejects_degenerate_values() {
        let cases = [
            TrainOptions { batch_size: 0, ..Default::default() },
            TrainOptions { epochs: 0, ..Default::default() },
            TrainOptions { learning_rate: 0., ..Default::default() },
            TrainOptions { learning_rate: f32::NAN, ..Default::default() },
            TrainOptions { l2_factor: -1., ..Default::default() },
        ];

        for options in cases {
            assert!(
                matches!(options.validate(), Err(MlErr::InvalidOption { .. })),
                "{options:?}"
            );
        }
    }
}
