/// Rescales `grad` uniformly so its L2 norm is at most `max_norm`.
///
/// # Returns
/// The norm of `grad` before clipping.
pub fn clip_grad_norm(grad: &mut [f32], max_norm: f32) -> f32 {
    let norm = grad.iter().map(|g| g * g).sum::<f32>().sqrt();

    if norm > max_norm {
        let coef = max_norm / norm;
        grad.iter_mut().for_each(|g| *g *= coef);
    }

    norm
}
