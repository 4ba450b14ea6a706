//! Multi-loss training: trainers, the SGD step and the experiment that
//! schedules them.

pub mod config;
pub mod experiment;
pub mod sgd_step;
pub mod state;
pub mod trainer;

pub use config::ExperimentConfig;
pub use experiment::{ExperimentBuilder, MultilossExperiment, SupervisedExperiment};
pub use sgd_step::sgd_step;
pub use state::TrainingState;
pub use trainer::{purify_trainers, schedule, MultilossTrainer, PureLoss, PureTrainer, Schedule};
