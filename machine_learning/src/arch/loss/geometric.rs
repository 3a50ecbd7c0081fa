use ndarray::{Array1, ArrayView1, Axis, Zip, linalg};

use crate::{
    MlErr, Result,
    arch::{
        Gradients, forward,
        layers::{BiasTable, LayerSpec, WeightTable},
        trace,
    },
    dataset::Sample,
};

/// A prediction paired with its target.
type Point<'a> = (ArrayView1<'a, f32>, ArrayView1<'a, f32>);

/// Half squared error plus a term that keeps the distances between an example's prediction and
/// its neighbors' predictions close to the distances between their targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometricLoss {
    weight: f32,
    axis_weights: [f32; 3],
}

impl Default for GeometricLoss {
    fn default() -> Self {
        Self::new(0.1, [1., 1., 1.5])
    }
}

impl GeometricLoss {
    /// Creates a new `GeometricLoss`.
    ///
    /// # Arguments
    /// * `weight` - The scale of the geometric term, both in the loss and in the output delta.
    /// * `axis_weights` - Per-dimension weights of the raw coordinate differences. Dimensions past
    ///   the third weigh `1`.
    pub fn new(weight: f32, axis_weights: [f32; 3]) -> Self {
        Self {
            weight,
            axis_weights,
        }
    }

    /// Half the squared error, summed over the output dimensions.
    pub fn pointwise(&self, y_pred: ArrayView1<f32>, y: ArrayView1<f32>) -> f32 {
        0.5 * (&y_pred - &y).mapv(|d| d * d).sum()
    }

    /// The distance preservation penalty of one example against its neighbors.
    ///
    /// # Arguments
    /// * `y_pred` - The example's prediction.
    /// * `y` - The example's target.
    /// * `neighbors` - The prediction and target of each neighbor.
    pub fn geometric(&self, y_pred: ArrayView1<f32>, y: ArrayView1<f32>, neighbors: &[Point]) -> f32 {
        neighbors
            .iter()
            .map(|(n_pred, n_y)| {
                let pred_diff = &y_pred - n_pred;
                let y_diff = &y - n_y;
                let dist = norm(pred_diff.view()) - norm(y_diff.view());

                let coords: f32 = (&pred_diff - &y_diff)
                    .iter()
                    .enumerate()
                    .map(|(i, d)| self.axis_weight(i) * d * d)
                    .sum();

                dist * dist + coords
            })
            .sum()
    }

    /// The loss reported for one example: pointwise plus the weighted geometric term.
    pub fn loss(&self, y_pred: ArrayView1<f32>, y: ArrayView1<f32>, neighbors: &[Point]) -> f32 {
        self.pointwise(y_pred, y) + self.weight * self.geometric(y_pred, y, neighbors)
    }

    /// The error signal at the output layer, before the activation derivative.
    ///
    /// It is `y_pred - y` plus, for every neighbor and dimension,
    /// `weight * 2 * sign(p - np) * (|p - np| - |t - nt|)`.
    pub fn output_delta(
        &self,
        y_pred: ArrayView1<f32>,
        y: ArrayView1<f32>,
        neighbors: &[Point],
    ) -> Array1<f32> {
        let mut delta = &y_pred - &y;

        for (n_pred, n_y) in neighbors {
            Zip::from(&mut delta)
                .and(&y_pred)
                .and(n_pred)
                .and(&y)
                .and(n_y)
                .for_each(|d, &p, &np, &t, &nt| {
                    let diff = p - np;
                    *d += self.weight * 2. * sign(diff) * (diff.abs() - (t - nt).abs());
                });
        }

        delta
    }

    /// Computes the loss of one example without touching any gradient.
    ///
    /// # Arguments
    /// * `example` - The example being evaluated.
    /// * `neighbors` - Its nearest neighbors within the batch.
    pub fn evaluate(
        &self,
        layers: &[LayerSpec],
        weights: &WeightTable,
        biases: &BiasTable,
        example: &Sample,
        neighbors: &[&Sample],
    ) -> Result<f32> {
        let y_pred = forward(&example.input, layers, weights, biases)?;
        let y_pred = ArrayView1::from(&y_pred);
        let y = target(example, y_pred.len())?;

        let outputs = neighbor_outputs(layers, weights, biases, neighbors)?;
        let neighbors = pair_up(neighbors, &outputs);

        Ok(self.loss(y_pred, y, &neighbors))
    }

    /// Computes the loss of one example and adds its gradients to `grad`.
    ///
    /// Every neighbor is forwarded once more through the network to get its prediction, so a
    /// call costs `1 + neighbors.len()` forward passes.
    ///
    /// # Arguments
    /// * `example` - The example being back-propagated.
    /// * `neighbors` - Its nearest neighbors within the batch.
    /// * `grad` - The gradient accumulator.
    ///
    /// # Returns
    /// The loss of the example or an error if the parameters don't match the layers.
    pub fn backprop(
        &self,
        layers: &[LayerSpec],
        weights: &WeightTable,
        biases: &BiasTable,
        example: &Sample,
        neighbors: &[&Sample],
        grad: &mut Gradients,
    ) -> Result<f32> {
        let trace = trace(&example.input, layers, weights, biases)?;
        let y_pred = trace.output();
        let y = target(example, y_pred.len())?;

        let outputs = neighbor_outputs(layers, weights, biases, neighbors)?;
        let neighbors = pair_up(neighbors, &outputs);

        let loss = self.loss(y_pred, y, &neighbors);
        let mut delta = self.output_delta(y_pred, y, &neighbors);

        for from in (0..layers.len() - 1).rev() {
            let act_fn = layers[from].activation();
            delta.zip_mut_with(&trace.sums[from + 1], |d, &z| *d *= act_fn.df(z));

            let a = trace.activations[from].view().insert_axis(Axis(1));
            let d = delta.view().insert_axis(Axis(0));
            let mut dw = grad.weights.view_mut(layers, from)?;
            linalg::general_mat_mul(1., &a, &d, 1., &mut dw);

            let mut db = grad.biases.view_mut(layers, from + 1)?;
            db += &delta;

            if from > 0 {
                delta = weights.view(layers, from)?.dot(&delta);
            }
        }

        Ok(loss)
    }

    fn axis_weight(&self, dim: usize) -> f32 {
        self.axis_weights.get(dim).copied().unwrap_or(1.)
    }
}

fn target(example: &Sample, outputs: usize) -> Result<ArrayView1<'_, f32>> {
    if outputs != example.target.len() {
        return Err(MlErr::SizeMismatch {
            a: "output layer",
            b: "target",
            got: outputs,
            expected: example.target.len(),
        });
    }

    Ok(ArrayView1::from(&example.target))
}

fn neighbor_outputs(
    layers: &[LayerSpec],
    weights: &WeightTable,
    biases: &BiasTable,
    neighbors: &[&Sample],
) -> Result<Vec<Vec<f32>>> {
    neighbors
        .iter()
        .map(|n| forward(&n.input, layers, weights, biases))
        .collect()
}

fn pair_up<'a>(neighbors: &[&'a Sample], outputs: &'a [Vec<f32>]) -> Vec<Point<'a>> {
    outputs
        .iter()
        .zip(neighbors)
        .map(|(pred, n)| (ArrayView1::from(pred), ArrayView1::from(&n.target)))
        .collect()
}

fn norm(v: ArrayView1<f32>) -> f32 {
    v.dot(&v).sqrt()
}

fn sign(x: f32) -> f32 {
    if x > 0. {
        1.
    } else if x < 0. {
        -1.
    } else {
        0.
    }
}

#[cfg(test)]
mod tests {
    use ndarray::arr1;

    use super::*;
    use crate::arch::activations::ActFn;

    const EPS: f32 = 1e-5;

    #[test]
    fn pointwise_is_half_squared_error() {
        let loss = GeometricLoss::default();
        let y_pred = arr1(&[1., 0., 0.5]);
        let y = arr1(&[0., 0., 0.]);
        assert!((loss.pointwise(y_pred.view(), y.view()) - 0.625).abs() < EPS);
    }

    #[test]
    fn preserved_geometry_costs_nothing() {
        let loss = GeometricLoss::default();
        let (y_pred, n_pred) = (arr1(&[0.1, 0.2, 0.3]), arr1(&[0.2, 0.2, 0.1]));
        let (y, n_y) = (arr1(&[0.5, 0.5, 0.5]), arr1(&[0.6, 0.5, 0.3]));

        let neighbors = [(n_pred.view(), n_y.view())];
        assert!(loss.geometric(y_pred.view(), y.view(), &neighbors).abs() < EPS);
    }

    #[test]
    fn height_differences_weigh_more() {
        let loss = GeometricLoss::default();
        let (y_pred, n_pred) = (arr1(&[0., 0., 1.]), arr1(&[0., 0., 0.]));
        let (y, n_y) = (arr1(&[0., 0., 0.]), arr1(&[0., 0., 0.]));

        let neighbors = [(n_pred.view(), n_y.view())];
        let geometric = loss.geometric(y_pred.view(), y.view(), &neighbors);
        assert!((geometric - 2.5).abs() < EPS);

        let total = loss.loss(y_pred.view(), y.view(), &neighbors);
        assert!((total - (0.5 + 0.25)).abs() < EPS);
    }

    #[test]
    fn output_delta_adds_the_neighbor_term() {
        let loss = GeometricLoss::default();
        let (y_pred, n_pred) = (arr1(&[0.5, 0., 0.]), arr1(&[0., 0., 0.]));
        let (y, n_y) = (arr1(&[0., 0., 0.]), arr1(&[0.2, 0., 0.]));

        let alone = loss.output_delta(y_pred.view(), y.view(), &[]);
        assert_eq!(alone, arr1(&[0.5, 0., 0.]));

        let neighbors = [(n_pred.view(), n_y.view())];
        let delta = loss.output_delta(y_pred.view(), y.view(), &neighbors);
        assert!((delta[0] - 0.56).abs() < EPS);
        assert_eq!(delta[1], 0.);
        assert_eq!(delta[2], 0.);
    }

    fn small_net() -> (Vec<LayerSpec>, WeightTable, BiasTable) {
        let layers = vec![
            LayerSpec::new(2, Some(ActFn::Tanh)),
            LayerSpec::new(3, Some(ActFn::Tanh)),
            LayerSpec::new(3, None),
        ];
        let mut weights = WeightTable::new();
        weights.insert(0, (0..6).map(|i| 0.5 * (i as f32 * 0.37 + 0.2).sin()).collect());
        weights.insert(1, (0..9).map(|i| 0.5 * (i as f32 * 0.71 + 0.1).cos()).collect());
        let biases = BiasTable::new(vec![vec![0.; 2], vec![0.05, -0.1, 0.02], vec![0.1, 0., -0.05]]);
        (layers, weights, biases)
    }

    #[test]
    fn backprop_matches_finite_differences_without_neighbors() {
        let loss = GeometricLoss::default();
        let (layers, weights, biases) = small_net();
        let example = Sample::new([0.4, -0.3], [0.2, 0.5, 0.1]);

        let mut grad = Gradients::zeros(&layers);
        loss.backprop(&layers, &weights, &biases, &example, &[], &mut grad)
            .unwrap();

        let h = 1e-3;
        for from in 0..2 {
            for k in 0..weights.get(from).unwrap().len() {
                let mut plus = weights.clone();
                plus.get_mut(from).unwrap()[k] += h;
                let mut minus = weights.clone();
                minus.get_mut(from).unwrap()[k] -= h;

                let l_plus = loss.evaluate(&layers, &plus, &biases, &example, &[]).unwrap();
                let l_minus = loss.evaluate(&layers, &minus, &biases, &example, &[]).unwrap();
                let numeric = (l_plus - l_minus) / (2. * h);
                let analytic = grad.weights.get(from).unwrap()[k];

                assert!(
                    (numeric - analytic).abs() < 1e-3,
                    "w[{from}][{k}]: {numeric} vs {analytic}"
                );
            }
        }

        for layer in 1..3 {
            for k in 0..3 {
                let mut plus = biases.clone();
                plus.get_mut(layer).unwrap()[k] += h;
                let mut minus = biases.clone();
                minus.get_mut(layer).unwrap()[k] -= h;

                let l_plus = loss.evaluate(&layers, &weights, &plus, &example, &[]).unwrap();
                let l_minus = loss.evaluate(&layers, &weights, &minus, &example, &[]).unwrap();
                let numeric = (l_plus - l_minus) / (2. * h);
                let analytic = grad.biases.get(layer).unwrap()[k];

                assert!(
                    (numeric - analytic).abs() < 1e-3,
                    "b[{layer}][{k}]: {numeric} vs {analytic}"
                );
            }
        }
    }

    #[test]
    fn backprop_accumulates_and_reports_the_evaluated_loss() {
        let loss = GeometricLoss::default();
        let (layers, weights, biases) = small_net();
        let example = Sample::new([0.4, -0.3], [0.2, 0.5, 0.1]);
        let neighbor = Sample::new([0.1, 0.1], [0.3, 0.1, 0.4]);

        let mut once = Gradients::zeros(&layers);
        let l1 = loss
            .backprop(&layers, &weights, &biases, &example, &[&neighbor], &mut once)
            .unwrap();

        let mut twice = once.clone();
        loss.backprop(&layers, &weights, &biases, &example, &[&neighbor], &mut twice)
            .unwrap();

        let evaluated = loss
            .evaluate(&layers, &weights, &biases, &example, &[&neighbor])
            .unwrap();
        assert_eq!(l1, evaluated);

        for ((_, a), (_, b)) in once.weights.iter().zip(twice.weights.iter()) {
            for (a, b) in a.iter().zip(b) {
                assert!((2. * a - b).abs() < EPS);
            }
        }
    }

    #[test]
    fn output_width_must_match_the_target() {
        let loss = GeometricLoss::default();
        let layers = vec![LayerSpec::new(2, None), LayerSpec::new(2, None)];
        let weights = WeightTable::zeros(&layers);
        let biases = BiasTable::zeros(&layers);
        let example = Sample::new([0., 0.], [0.; 3]);

        let err = loss
            .evaluate(&layers, &weights, &biases, &example, &[])
            .unwrap_err();
        assert!(matches!(err, MlErr::SizeMismatch { got: 2, expected: 3, .. }));
    }
}
