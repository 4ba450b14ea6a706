//! Error types for enn-multiloss

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("experiment needs at least one trainer")]
    NoTrainers,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("shape mismatch in {op}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        op: &'static str,
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("missing parameter: {0}")]
    MissingParameter(String),

    #[error("parameter trees differ: {0}")]
    ParameterTreeMismatch(String),

    #[error("label {label} is not a class index in 0..{num_classes}")]
    InvalidLabel { label: f64, num_classes: usize },

    #[error("empty data: {0}")]
    EmptyData(String),

    #[error("dataset exhausted; datasets must yield batches forever")]
    DatasetExhausted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
