use serde::{Deserialize, Serialize};

use crate::dataset::Sample;

/// How much of the unit range each target dimension is mapped onto. The height axis is
/// compressed to half.
const TARGET_SCALE: [f32; 3] = [1., 1., 0.5];

/// Per-dimension minimum and maximum of a set of points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec<f32>,
    pub max: Vec<f32>,
}

impl Bounds {
    /// Computes the bounds of `points`, each dimension independently.
    pub fn fit<'a, I>(points: I, dims: usize) -> Self
    where
        I: IntoIterator<Item = &'a [f32]>,
    {
        let mut min = vec![f32::INFINITY; dims];
        let mut max = vec![f32::NEG_INFINITY; dims];

        for point in points {
            for (d, &v) in point.iter().enumerate().take(dims) {
                min[d] = min[d].min(v);
                max[d] = max[d].max(v);
            }
        }

        // No points, no spread.
        for d in 0..dims {
            if min[d] > max[d] {
                (min[d], max[d]) = (0., 0.);
            }
        }

        Self { min, max }
    }

    /// Maps `v` from `[min, max]` of dimension `d` onto `[0, scale]`. A degenerate range maps
    /// everything to zero.
    pub fn normalize(&self, d: usize, v: f32, scale: f32) -> f32 {
        let range = self.max[d] - self.min[d];
        if range == 0. {
            return 0.;
        }

        (v - self.min[d]) / range * scale
    }

    /// The inverse of `normalize`. A degenerate range maps everything to its single value.
    pub fn denormalize(&self, d: usize, v: f32, scale: f32) -> f32 {
        let range = self.max[d] - self.min[d];
        self.min[d] + v / scale * range
    }
}

/// The bounds used to bring inputs and targets into the training range, and back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    pub input: Bounds,
    pub target: Bounds,
}

impl Normalization {
    /// Computes the input and the target bounds of a dataset separately.
    pub fn fit(samples: &[Sample]) -> Self {
        Self {
            input: Bounds::fit(samples.iter().map(|s| &s.input[..]), 2),
            target: Bounds::fit(samples.iter().map(|s| &s.target[..]), 3),
        }
    }

    pub fn normalize(&self, sample: &Sample) -> Sample {
        Sample::new(
            self.normalize_input(sample.input),
            self.normalize_target(sample.target),
        )
    }

    pub fn normalize_input(&self, input: [f32; 2]) -> [f32; 2] {
        std::array::from_fn(|d| self.input.normalize(d, input[d], 1.))
    }

    pub fn normalize_target(&self, target: [f32; 3]) -> [f32; 3] {
        std::array::from_fn(|d| self.target.normalize(d, target[d], TARGET_SCALE[d]))
    }

    pub fn denormalize_input(&self, input: [f32; 2]) -> [f32; 2] {
        std::array::from_fn(|d| self.input.denormalize(d, input[d], 1.))
    }

    pub fn denormalize_target(&self, target: [f32; 3]) -> [f32; 3] {
        std::array::from_fn(|d| self.target.denormalize(d, target[d], TARGET_SCALE[d]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn samples() -> Vec<Sample> {
        vec![
            Sample::new([-1., 0.5], [0.2, -0.4, -1.]),
            Sample::new([0.5, -0.25], [0.8, 0.6, 1.]),
            Sample::new([0., 1.], [-0.2, 0., 0.]),
        ]
    }

    #[test]
    fn bounds_are_per_dimension() {
        let norm = Normalization::fit(&samples());

        assert_eq!(norm.input.min, [-1., -0.25]);
        assert_eq!(norm.input.max, [0.5, 1.]);
        assert_eq!(norm.target.min, [-0.2, -0.4, -1.]);
        assert_eq!(norm.target.max, [0.8, 0.6, 1.]);
    }

    #[test]
    fn height_is_compressed_to_half() {
        let norm = Normalization::fit(&samples());

        let [x, y, z] = norm.normalize_target([0.8, 0.6, 1.]);
        assert!((x - 1.).abs() < EPS && (y - 1.).abs() < EPS);
        assert!((z - 0.5).abs() < EPS);

        let [_, _, z] = norm.normalize_target([0., 0., -1.]);
        assert!(z.abs() < EPS);
    }

    #[test]
    fn round_trip() {
        let norm = Normalization::fit(&samples());

        for sample in samples() {
            let back = norm.denormalize_input(norm.normalize_input(sample.input));
            for (a, b) in back.iter().zip(sample.input) {
                assert!((a - b).abs() < EPS);
            }

            let back = norm.denormalize_target(norm.normalize_target(sample.target));
            for (a, b) in back.iter().zip(sample.target) {
                assert!((a - b).abs() < EPS);
            }
        }
    }

    #[test]
    fn degenerate_ranges_map_to_zero() {
        let samples = [
            Sample::new([0.3, 1.], [0.5; 3]),
            Sample::new([0.3, -1.], [0.5; 3]),
        ];
        let norm = Normalization::fit(&samples);

        assert_eq!(norm.normalize_input([0.3, 1.]), [0., 1.]);
        assert_eq!(norm.normalize_target([0.5; 3]), [0.; 3]);
        assert_eq!(norm.denormalize_target([0.; 3]), [0.5; 3]);
    }

    #[test]
    fn no_points_no_spread() {
        let norm = Normalization::fit(&[]);
        assert_eq!(norm.input.min, [0., 0.]);
        assert_eq!(norm.target.max, [0., 0., 0.]);
    }
}
