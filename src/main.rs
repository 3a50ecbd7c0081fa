use std::{env, ops::ControlFlow};

use anyhow::Context;
use log::{debug, info};
use machine_learning::{
    dataset::make_training_data,
    training::{Trainer, generate_rng, predict},
};
use network_config::{Adapter, ConfigStore, FileStore, Format, export};

const DEFAULT_CONFIG_PATH: &str = "network_config.json";
/// Every how many epochs progress is logged at info level.
const REPORT_EVERY: usize = 10;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let path = args.next().unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let format = args.next().map(|name| Format::from_name(&name));

    let seed = env::var("SEED")
        .ok()
        .map(|seed| seed.parse::<u64>())
        .transpose()
        .context("SEED must be an unsigned integer")?;

    let store = FileStore::new(&path);
    let mut config = store.load();

    let adapter = Adapter::new();
    let mut rng = generate_rng(seed);
    let network = adapter
        .to_network(&config, &mut rng)
        .with_context(|| format!("invalid configuration at {path}"))?;

    let samples = make_training_data(network.sample_size, network.pattern, &mut rng);
    info!(
        "generated {} {} samples",
        samples.len(),
        network.pattern.name()
    );

    let mut trainer = Trainer::new(network.layers.clone(), network.options, rng)?;
    let untrained = trainer.evaluate(&network.weights, &network.biases, &samples)?;
    info!("untrained error {untrained}");

    let trained = trainer.train(&network.weights, &network.biases, &samples, |progress| {
        if progress.epoch % REPORT_EVERY == 0 {
            info!("epoch {} error {}", progress.epoch, progress.error);
        } else {
            debug!("epoch {} error {}", progress.epoch, progress.error);
        }
        ControlFlow::Continue(())
    })?;
    info!(
        "trained for {} epochs, error {} (was {untrained})",
        trained.epochs, trained.error
    );

    let computed = predict(
        &network.layers,
        &trained.weights,
        &trained.biases,
        &samples,
        &trained.normalization,
    )?;

    adapter.apply(
        &mut config,
        &trained.weights,
        &trained.biases,
        &samples,
        &computed,
    );
    store
        .save(&config)
        .with_context(|| format!("failed to save configuration to {path}"))?;

    if let Some(format) = format {
        println!("{}", export(&config, format)?);
    }

    Ok(())
}
