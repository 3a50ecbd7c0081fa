use std::f32::consts::PI;

use super::{Pattern, generator::CLUSTERS};

/// The sign each gaussian cluster's bump contributes with, following `CLUSTERS`.
const BUMP_SIGNS: [f32; 4] = [1., -1., 1., -1.];
const BUMP_WIDTH: f32 = 0.2;

/// Lifts a 2D input onto the 3D coordinate `pattern` maps it to.
///
/// The result is a deterministic function of `(x, y)` and `pattern`, every coordinate clamped to
/// `[-1, 1]`.
pub fn target_for(pattern: Pattern, [x, y]: [f32; 2]) -> [f32; 3] {
    let r = (x * x + y * y).sqrt();

    let z = match pattern {
        Pattern::Circle => (r.min(1.) * PI).cos(),
        Pattern::Spiral => (3. * y.atan2(x) + 4. * r).sin(),
        Pattern::Gaussian => CLUSTERS
            .iter()
            .zip(BUMP_SIGNS)
            .map(|(&(cx, cy), sign)| {
                let d2 = (x - cx).powi(2) + (y - cy).powi(2);
                sign * (-d2 / (2. * BUMP_WIDTH * BUMP_WIDTH)).exp()
            })
            .sum::<f32>()
            .tanh(),
        Pattern::Xor => {
            if x * y < 0. {
                1.
            } else {
                -1.
            }
        }
        Pattern::Random => ((3. * x).sin() * (3. * y).cos()).tanh(),
    };

    [x, y, z].map(|v| v.clamp(-1., 1.))
}
