use crate::dataset::Sample;

/// Finds the nearest neighbors of one batch member in input space.
///
/// # Arguments
/// * `samples` - Every sample the batch indexes into.
/// * `batch` - The indices of the samples in the current batch.
/// * `pos` - The position within `batch` of the sample whose neighbors are wanted.
/// * `k` - The maximum amount of neighbors.
///
/// # Returns
/// The indices into `samples` of up to `k` other batch members, nearest first. Equally distant
/// samples keep the order in which they were generated.
pub fn nearest_neighbors(samples: &[Sample], batch: &[usize], pos: usize, k: usize) -> Vec<usize> {
    let origin = &samples[batch[pos]].input;

    let mut by_distance: Vec<_> = batch
        .iter()
        .enumerate()
        .filter(|&(p, _)| p != pos)
        .map(|(_, &idx)| (idx, distance(origin, &samples[idx].input)))
        .collect();

    by_distance.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    by_distance.into_iter().take(k).map(|(idx, _)| idx).collect()
}

fn distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f32>()
        .sqrt()
}
