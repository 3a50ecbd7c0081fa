use std::f32::consts::PI;

use rand::Rng;
use rand_distr::StandardNormal;

use super::{Pattern, Sample, target::target_for};

/// The noise scale used when none is given.
pub const DEFAULT_NOISE: f32 = 0.1;

/// The centers of the four gaussian clusters.
pub(super) const CLUSTERS: [(f32, f32); 4] = [(0.5, 0.5), (-0.5, 0.5), (-0.5, -0.5), (0.5, -0.5)];

const CIRCLE_RADIUS: f32 = 1.;
const SPIRAL_STEPS: usize = 100;
const SPIRAL_TURNS: f32 = 1.75;
const XOR_PADDING: f32 = 0.1;

/// Draws one 2D point following `pattern`.
///
/// # Arguments
/// * `pattern` - The shape to draw from.
/// * `noise` - The scale of the jitter added on top of the shape.
/// * `rng` - A random number generator.
pub fn generate_sample<R: Rng>(pattern: Pattern, noise: f32, rng: &mut R) -> [f32; 2] {
    match pattern {
        Pattern::Circle => {
            let angle = rng.random_range(0f32..2. * PI);
            let radius = CIRCLE_RADIUS * rng.random::<f32>().powf(0.7);
            let radius = radius + noise * rng.random_range(-0.1f32..0.1);
            [radius * angle.cos(), radius * angle.sin()]
        }
        Pattern::Gaussian => {
            let (cx, cy) = CLUSTERS[rng.random_range(0..CLUSTERS.len())];
            let std_dev = gaussian_variance(noise).sqrt();
            let dx: f32 = rng.sample(StandardNormal);
            let dy: f32 = rng.sample(StandardNormal);
            [cx + dx * std_dev, cy + dy * std_dev]
        }
        Pattern::Spiral => {
            let step = rng.random_range(0..SPIRAL_STEPS) as f32 / SPIRAL_STEPS as f32;
            let arm = if rng.random::<bool>() { PI } else { 0. };
            let angle = SPIRAL_TURNS * step * 2. * PI + arm;
            [
                step * angle.sin() + noise * rng.random_range(-0.5f32..0.5),
                step * angle.cos() + noise * rng.random_range(-0.5f32..0.5),
            ]
        }
        Pattern::Xor => {
            let pad = |rng: &mut R| {
                let v = rng.random_range(-1f32..1.);
                let v = if v > 0. { v + XOR_PADDING } else { v - XOR_PADDING };
                v + noise * rng.random_range(-1f32..1.)
            };
            [pad(&mut *rng), pad(&mut *rng)]
        }
        Pattern::Random => [rng.random_range(-1f32..1.), rng.random_range(-1f32..1.)],
    }
}

/// Variance of each coordinate around its gaussian cluster.
fn gaussian_variance(noise: f32) -> f32 {
    0.2 + 0.3 * noise
}

/// Builds a dataset of `size` samples following `pattern`.
///
/// Inputs are clamped to `[-1, 1]` and each target is a deterministic function of its clamped
/// input, so two datasets sharing inputs share targets.
pub fn make_training_data<R: Rng>(size: usize, pattern: Pattern, rng: &mut R) -> Vec<Sample> {
    (0..size)
        .map(|_| {
            let [x, y] = generate_sample(pattern, DEFAULT_NOISE, rng);
            let input = [x.clamp(-1., 1.), y.clamp(-1., 1.)];
            Sample::new(input, target_for(pattern, input))
        })
        .collect()
}
