use super::Optimizer;
use crate::{MlErr, Result};

/// Gradient descent with momentum and optional L2 weight decay, owning the velocity of one
/// parameter buffer.
#[derive(Debug, Clone)]
pub struct GradientDescentWithMomentum {
    learning_rate: f32,
    momentum: f32,
    weight_decay: f32,
    velocity: Box<[f32]>,
}

impl GradientDescentWithMomentum {
    /// Creates a new `GradientDescentWithMomentum` optimizer with a zeroed velocity.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters this instance should hold.
    /// * `learning_rate` - The size of each step.
    /// * `momentum` - How much of the previous velocity survives each step.
    /// * `weight_decay` - The L2 factor added to the gradient, `0` for none.
    ///
    /// # Returns
    /// A new `GradientDescentWithMomentum` instance.
    pub fn new(len: usize, learning_rate: f32, momentum: f32, weight_decay: f32) -> Self {
        Self {
            learning_rate,
            momentum,
            weight_decay,
            velocity: vec![0.; len].into_boxed_slice(),
        }
    }

    /// Changes the step size and momentum used by the following updates.
    pub fn schedule(&mut self, learning_rate: f32, momentum: f32) {
        self.learning_rate = learning_rate;
        self.momentum = momentum;
    }

    pub fn velocity(&self) -> &[f32] {
        &self.velocity
    }
}

impl Optimizer for GradientDescentWithMomentum {
    /// `v = momentum * v - learning_rate * (g + weight_decay * p)`, then `p += v`.
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()> {
        if grad.len() != params.len() || params.len() != self.velocity.len() {
            return Err(MlErr::SizeMismatch {
                a: "gradient",
                b: "parameters",
                got: grad.len(),
                expected: self.velocity.len(),
            });
        }

        let Self {
            learning_rate: lr,
            momentum: mu,
            weight_decay: decay,
            ..
        } = *self;

        params
            .iter_mut()
            .zip(grad)
            .zip(self.velocity.iter_mut())
            .for_each(|((p, g), v)| {
                *v = mu * *v - lr * (g + decay * *p);
                *p += *v;
            });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    #[test]
    fn first_step_is_plain_gradient_descent() {
        let mut optimizer = GradientDescentWithMomentum::new(2, 0.1, 0.9, 0.);
        let mut params = [1., -1.];
        optimizer.update_params(&[2., -4.], &mut params).unwrap();

        assert!((params[0] - 0.8).abs() < EPS);
        assert!((params[1] + 0.6).abs() < EPS);
    }

    #[test]
    fn velocity_carries_over() {
        let mut optimizer = GradientDescentWithMomentum::new(1, 0.1, 0.5, 0.);
        let mut params = [0.];
        optimizer.update_params(&[1.], &mut params).unwrap();
        optimizer.update_params(&[1.], &mut params).unwrap();

        // v1 = -0.1, v2 = 0.5 * -0.1 - 0.1 = -0.15
        assert!((optimizer.velocity()[0] + 0.15).abs() < EPS);
        assert!((params[0] + 0.25).abs() < EPS);
    }

    #[test]
    fn weight_decay_pulls_toward_zero() {
        let mut optimizer = GradientDescentWithMomentum::new(1, 0.1, 0.9, 0.5);
        let mut params = [2.];
        optimizer.update_params(&[0.], &mut params).unwrap();

        assert!((params[0] - 1.9).abs() < EPS);
    }

    #[test]
    fn schedule_changes_the_next_step() {
        let mut optimizer = GradientDescentWithMomentum::new(1, 0.1, 0.9, 0.);
        optimizer.schedule(1., 0.);
        let mut params = [0.];
        optimizer.update_params(&[1.], &mut params).unwrap();

        assert!((params[0] + 1.).abs() < EPS);
    }

    #[test]
    fn size_mismatch() {
        let mut optimizer = GradientDescentWithMomentum::new(2, 0.1, 0.9, 0.);
        let mut params = [0.; 2];
        assert!(optimizer.update_params(&[1.], &mut params).is_err());
    }
}
