use std::fmt;
use std::rc::Rc;

use serde_json::json;
use tracing::debug;

use crate::data::batch::Batch;
use crate::data::dataset::Dataset;
use crate::error::{Error, Result};
use crate::logging::logger::{make_default_logger, Logger, Record};
use crate::loss::loss_fn::{LossMetrics, LossOutput};
use crate::math::matrix::Matrix;
use crate::network::enn::EpistemicNetwork;
use crate::optim::Optimizer;
use crate::params::params::Params;
use crate::random::key::RandomKey;
use crate::random::stream::RandomStream;
use crate::train::config::ExperimentConfig;
use crate::train::sgd_step::sgd_step;
use crate::train::state::TrainingState;
use crate::train::trainer::{purify_trainers, MultilossTrainer, PureTrainer};

/// The operations every supervised ENN experiment offers.
pub trait SupervisedExperiment {
    /// Runs `num_batches` training steps.
    fn train(&mut self, num_batches: u64) -> Result<()>;

    /// Network output at the current parameters, for the index sampled
    /// from `seed`.
    fn predict(&self, inputs: &Matrix, seed: u64) -> Result<Matrix>;

    /// The first trainer's loss on `batch`, keyed by `seed`.
    fn loss(&self, batch: &Batch, seed: u64) -> Result<f64>;
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects the pieces of a `MultilossExperiment`. Nothing is drawn or
/// initialized until `build`.
pub struct ExperimentBuilder<N: EpistemicNetwork, O: Optimizer> {
    enn: N,
    optimizer: O,
    trainers: Vec<MultilossTrainer<N>>,
    config: ExperimentConfig,
    logger: Option<Box<dyn Logger>>,
    eval_datasets: Vec<(String, Dataset)>,
}

impl<N, O> ExperimentBuilder<N, O>
where
    N: EpistemicNetwork + 'static,
    O: Optimizer,
{
    /// Appends a trainer. Trainers run in the order they are added.
    pub fn trainer(mut self, trainer: MultilossTrainer<N>) -> Self {
        self.trainers.push(trainer);
        self
    }

    pub fn trainers<I>(mut self, trainers: I) -> Self
    where
        I: IntoIterator<Item = MultilossTrainer<N>>,
    {
        self.trainers.extend(trainers);
        self
    }

    /// Replaces all scalar settings at once.
    pub fn config(mut self, config: ExperimentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn train_log_freq(mut self, freq: u64) -> Self {
        self.config.train_log_freq = freq;
        self
    }

    pub fn eval_log_freq(mut self, freq: u64) -> Self {
        self.config.eval_log_freq = freq;
        self
    }

    pub fn logger(mut self, logger: Box<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Adds a held-out dataset evaluated every `eval_log_freq` steps.
    /// Datasets are evaluated in insertion order; reusing a name replaces
    /// the earlier dataset in place.
    pub fn eval_dataset(mut self, name: impl Into<String>, dataset: Dataset) -> Self {
        let name = name.into();
        match self.eval_datasets.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = dataset,
            None => self.eval_datasets.push((name, dataset)),
        }
        self
    }

    /// Purifies the trainers and initializes parameters and optimizer
    /// state.
    ///
    /// Initialization pulls one batch from the first trainer's dataset and
    /// two keys from the stream: one for the indexer, one for `init`.
    pub fn build(self) -> Result<MultilossExperiment<N, O>> {
        self.config.validate()?;

        let enn = Rc::new(self.enn);
        let pure_trainers = purify_trainers(self.trainers, &enn);
        let first = pure_trainers.first().ok_or(Error::NoTrainers)?;

        let mut rng = RandomStream::new(self.config.seed);
        let batch = first.dataset.next_batch()?;
        let index = enn.indexer(rng.next_key());
        let params = enn.init(rng.next_key(), &batch.x, &index)?;
        let opt_state = self.optimizer.init(&params);

        let logger = match self.logger {
            Some(logger) => logger,
            None => make_default_logger(&self.config.logger_label, self.config.log_time_delta()),
        };

        debug!(
            trainers = pure_trainers.len(),
            eval_datasets = self.eval_datasets.len(),
            parameters = params.num_elements(),
            seed = self.config.seed,
            "initialised multiloss experiment"
        );

        Ok(MultilossExperiment {
            enn,
            optimizer: self.optimizer,
            pure_trainers,
            rng,
            state: TrainingState::new(params, opt_state),
            step: 0,
            logger,
            train_log_freq: self.config.train_log_freq,
            eval_datasets: self.eval_datasets,
            eval_log_freq: self.config.eval_log_freq,
        })
    }
}

// ---------------------------------------------------------------------------
// Experiment
// ---------------------------------------------------------------------------

/// SGD training of one ENN with several losses.
///
/// At each step = 1, 2, ...:
///   for t in trainers (construction order):
///     if t.should_train(step): one SGD step of t's loss on next(t.dataset)
///   every `eval_log_freq` steps: evaluate every trainer's loss on every
///   eval dataset, without updating parameters
///
/// All trainers share one `TrainingState`, one step counter and one random
/// stream. Useful for prior losses or transfer learning next to the main
/// data loss.
pub struct MultilossExperiment<N: EpistemicNetwork, O: Optimizer> {
    enn: Rc<N>,
    optimizer: O,
    pure_trainers: Vec<PureTrainer>,
    rng: RandomStream,
    state: TrainingState<O::State>,
    step: u64,
    logger: Box<dyn Logger>,
    train_log_freq: u64,
    eval_datasets: Vec<(String, Dataset)>,
    eval_log_freq: u64,
}

impl<N, O> MultilossExperiment<N, O>
where
    N: EpistemicNetwork + 'static,
    O: Optimizer,
{
    pub fn builder(enn: N, optimizer: O) -> ExperimentBuilder<N, O> {
        ExperimentBuilder {
            enn,
            optimizer,
            trainers: Vec::new(),
            config: ExperimentConfig::default(),
            logger: None,
            eval_datasets: Vec::new(),
        }
    }

    /// Steps completed so far.
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn state(&self) -> &TrainingState<O::State> {
        &self.state
    }

    pub fn params(&self) -> &Params {
        &self.state.params
    }

    /// Keys drawn from the shared stream so far, initialization included.
    pub fn rng_draws(&self) -> u64 {
        self.rng.draws()
    }

    pub fn enn(&self) -> &N {
        &self.enn
    }

    pub fn trainer_names(&self) -> Vec<&str> {
        self.pure_trainers.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn eval_dataset_names(&self) -> Vec<&str> {
        self.eval_datasets.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Writes the current parameters to a JSON checkpoint.
    pub fn save_params_json(&self, path: &str) -> Result<()> {
        self.state.params.save_json(path)
    }

    /// One evaluation round: every trainer's loss on a fresh batch of
    /// every eval dataset.
    fn evaluate(&mut self) -> Result<()> {
        for (dataset_name, dataset) in &self.eval_datasets {
            for t in &self.pure_trainers {
                let batch = dataset.next_batch()?;
                let key = self.rng.next_key();
                let LossOutput { loss, metrics } = t.pure_loss.evaluate(&self.state.params, &batch, key)?;
                let record = eval_record(metrics, dataset_name, self.step, loss, &t.name);
                self.logger.write(&record)?;
            }
        }
        Ok(())
    }
}

impl<N, O> SupervisedExperiment for MultilossExperiment<N, O>
where
    N: EpistemicNetwork + 'static,
    O: Optimizer,
{
    fn train(&mut self, num_batches: u64) -> Result<()> {
        for _ in 0..num_batches {
            self.step += 1;

            for t in &self.pure_trainers {
                if !(t.should_train)(self.step) {
                    continue;
                }
                let batch = t.dataset.next_batch()?;
                let key = self.rng.next_key();
                let (state, metrics) = sgd_step(
                    &self.optimizer,
                    t.pure_loss.as_ref(),
                    &self.state,
                    &batch,
                    key,
                )?;
                self.state = state;

                if self.step % self.train_log_freq == 0 {
                    self.logger.write(&train_record(metrics, self.step, &t.name))?;
                }
            }

            if !self.eval_datasets.is_empty() && self.step % self.eval_log_freq == 0 {
                self.evaluate()?;
            }
        }
        Ok(())
    }

    fn predict(&self, inputs: &Matrix, seed: u64) -> Result<Matrix> {
        let index = self.enn.indexer(RandomKey::from_seed(seed));
        self.enn.apply(&self.state.params, inputs, &index)
    }

    fn loss(&self, batch: &Batch, seed: u64) -> Result<f64> {
        let first = self.pure_trainers.first().ok_or(Error::NoTrainers)?;
        first.pure_loss
            .evaluate(&self.state.params, batch, RandomKey::from_seed(seed))
            .map(|out| out.loss)
    }
}

impl<N: EpistemicNetwork, O: Optimizer> fmt::Debug for MultilossExperiment<N, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultilossExperiment")
            .field("step", &self.step)
            .field("trainers", &self.pure_trainers)
            .field("rng", &self.rng)
            .field("train_log_freq", &self.train_log_freq)
            .field("eval_log_freq", &self.eval_log_freq)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

fn metrics_record(metrics: LossMetrics) -> Record {
    metrics.into_iter().map(|(k, v)| (k, json!(v))).collect()
}

/// Metrics (including `"loss"`) tagged as an SGD step on train data.
fn train_record(metrics: LossMetrics, step: u64, trainer: &str) -> Record {
    let mut record = metrics_record(metrics);
    record.insert("dataset".into(), json!("train"));
    record.insert("step".into(), json!(step));
    record.insert("sgd".into(), json!(true));
    record.insert("trainer".into(), json!(trainer));
    record
}

fn eval_record(metrics: LossMetrics, dataset: &str, step: u64, loss: f64, trainer: &str) -> Record {
    let mut record = metrics_record(metrics);
    record.insert("dataset".into(), json!(dataset));
    record.insert("step".into(), json!(step));
    record.insert("sgd".into(), json!(false));
    record.insert("loss".into(), json!(loss));
    record.insert("trainer".into(), json!(trainer));
    record
}
