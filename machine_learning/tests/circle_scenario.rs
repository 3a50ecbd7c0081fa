use std::ops::ControlFlow;

use machine_learning::{
    arch::{activations::ActFn, forward, layers::LayerSpec},
    dataset::{Pattern, make_training_data},
    initialization::{random_biases, random_weights},
    training::{TrainOptions, Trainer, generate_rng, predict},
};

#[test]
fn training_beats_the_untrained_network_on_a_circle() {
    let mut rng = generate_rng(Some(2024));
    let layers = vec![
        LayerSpec::new(2, Some(ActFn::Tanh)),
        LayerSpec::new(4, Some(ActFn::Tanh)),
        LayerSpec::new(3, Some(ActFn::Tanh)),
    ];

    let samples = make_training_data(50, Pattern::Circle, &mut rng);
    let weights = random_weights(&layers, &mut rng).unwrap();
    let biases = random_biases(&layers);

    let options = TrainOptions {
        learning_rate: 0.01,
        epochs: 50,
        batch_size: 16,
        l2_factor: 0.00005,
    };
    let mut trainer = Trainer::new(layers.clone(), options, rng).unwrap();

    let untrained = trainer.evaluate(&weights, &biases, &samples).unwrap();
    let trained = trainer
        .train(&weights, &biases, &samples, |_| ControlFlow::Continue(()))
        .unwrap();

    assert_eq!(trained.epochs, 50);
    assert!(
        trained.error < untrained,
        "trained {} >= untrained {}",
        trained.error,
        untrained
    );

    // Outputs stay clamped in normalized space.
    for sample in &samples {
        let input = trained.normalization.normalize_input(sample.input);
        let output = forward(&input, &layers, &trained.weights, &trained.biases).unwrap();
        assert!(output.iter().all(|v| (-1. ..=1.).contains(v)));
    }

    let predicted = predict(
        &layers,
        &trained.weights,
        &trained.biases,
        &samples,
        &trained.normalization,
    )
    .unwrap();
    assert_eq!(predicted.len(), samples.len());
    assert!(predicted.iter().flatten().all(|v| v.is_finite()));
}
