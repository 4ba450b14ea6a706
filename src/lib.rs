//! # enn-multiloss
//!
//! SGD training of epistemic neural networks (ENNs) with several losses,
//! each pulling from its own dataset on its own schedule, all updating one
//! shared set of parameters.
//!
//! - **random**: counter-keyed random keys shared by every trainer
//! - **math** / **params**: dense matrices and named parameter trees
//! - **network**: the `EpistemicNetwork` capability and an MLP ensemble
//! - **loss**: the `LossFn` capability, L2, cross-entropy and weight decay
//! - **optim**: the `Optimizer` capability, SGD and Adam
//! - **data**: batches and shareable dataset handles
//! - **logging**: metrics record sinks
//! - **train**: trainers, the SGD step and `MultilossExperiment`

pub mod error;
pub mod math;
pub mod params;
pub mod random;
pub mod activation;
pub mod network;
pub mod loss;
pub mod optim;
pub mod data;
pub mod logging;
pub mod train;

// Convenience re-exports
pub use error::{Error, Result};
pub use math::matrix::Matrix;
pub use params::params::Params;
pub use random::{key_at, RandomKey, RandomStream};
pub use activation::activation::ActivationFunction;
pub use network::{EnsembleSpec, EpistemicNetwork, MlpEnsemble};
pub use loss::{L2Loss, LossFn, LossMetrics, LossOutput, WeightDecay, XentLoss};
pub use optim::{Adam, Optimizer, Sgd};
pub use data::{Batch, Dataset};
pub use logging::{InMemoryLogger, JsonLinesLogger, Logger, Record, TerminalLogger};
pub use train::{
    schedule, ExperimentConfig, MultilossExperiment, MultilossTrainer, SupervisedExperiment,
    TrainingState,
};
