// Demo driver: fits an MLP ensemble to a noisy sine with a data loss and a
// weight-decay prior, evaluating on a held-out grid.
//
//   cargo run -- [config.json]
//
// The optional JSON file is an `ExperimentConfig`; RUST_LOG controls
// verbosity (default `info`).
use std::env;
use std::process::ExitCode;

use rand::Rng;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use enn_multiloss::{
    schedule, ActivationFunction, Adam, Batch, Dataset, EnsembleSpec, ExperimentConfig, L2Loss,
    Matrix, MlpEnsemble, MultilossExperiment, MultilossTrainer, RandomKey, Result,
    SupervisedExperiment, WeightDecay,
};

const NUM_BATCHES: u64 = 2000;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let config = match env::args().nth(1) {
        Some(path) => ExperimentConfig::load_json(&path)?,
        None => ExperimentConfig {
            train_log_freq: 250,
            eval_log_freq: 250,
            ..ExperimentConfig::default()
        },
    };
    let seed = config.seed;

    let (train_x, train_y) = noisy_sine(64, 0.1, seed)?;
    let (test_x, test_y) = noisy_sine(32, 0.0, seed.wrapping_add(1))?;

    let enn = MlpEnsemble::new(EnsembleSpec {
        name: "sine".into(),
        num_members: 4,
        hidden_sizes: vec![32, 32],
        output_size: 1,
        activation: ActivationFunction::ReLU,
    })?;

    let data_loss = MultilossTrainer::new(
        L2Loss::new(1),
        Dataset::shuffled(train_x.clone(), train_y.clone(), 16, seed)?,
    );
    let prior = MultilossTrainer::new(WeightDecay::new(1e-4), Dataset::repeat(Batch::new(train_x, train_y)))
        .with_name("prior")
        .with_shared_schedule(schedule::every(10));

    let mut experiment = MultilossExperiment::builder(enn, Adam::default_params(1e-2))
        .config(config)
        .trainer(data_loss)
        .trainer(prior)
        .eval_dataset("test", Dataset::repeat(Batch::new(test_x, test_y)))
        .build()?;

    experiment.train(NUM_BATCHES)?;

    let grid = Matrix::column(&[-3.0, -1.5, 0.0, 1.5, 3.0])?;
    for member_seed in 0..4 {
        let out = experiment.predict(&grid, member_seed)?;
        let values: Vec<String> = out.iter().map(|v| format!("{v:+.3}")).collect();
        info!(seed = member_seed, "predictions at {:?}: {}", [-3.0, -1.5, 0.0, 1.5, 3.0], values.join(" "));
    }
    Ok(())
}

/// `n` evenly spaced points on [-π, π] with `y = sin(x)` plus uniform noise.
fn noisy_sine(n: usize, noise: f64, seed: u64) -> Result<(Matrix, Matrix)> {
    let mut rng = RandomKey::from_seed(seed).rng();
    let step = 2.0 * std::f64::consts::PI / (n.max(2) - 1) as f64;
    let xs: Vec<f64> = (0..n).map(|i| -std::f64::consts::PI + step * i as f64).collect();
    let ys: Vec<f64> = xs.iter()
        .map(|x| {
            let eps = if noise > 0.0 { rng.gen_range(-noise..noise) } else { 0.0 };
            x.sin() + eps
        })
        .collect();
    Ok((Matrix::column(&xs)?, Matrix::column(&ys)?))
}
