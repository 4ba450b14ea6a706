use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// One mini-batch: inputs `x`, targets `y`, one example per row.
///
/// - `weights`    — optional per-row weight applied by losses (defaults to 1)
/// - `data_index` — optional row indices into the source dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub x: Matrix,
    pub y: Matrix,
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
    #[serde(default)]
    pub data_index: Option<Vec<usize>>,
}

impl Batch {
    pub fn new(x: Matrix, y: Matrix) -> Batch {
        Batch { x, y, weights: None, data_index: None }
    }

    pub fn with_weights(mut self, weights: Vec<f64>) -> Batch {
        self.weights = Some(weights);
        self
    }

    pub fn with_data_index(mut self, data_index: Vec<usize>) -> Batch {
        self.data_index = Some(data_index);
        self
    }

    pub fn num_examples(&self) -> usize {
        self.x.rows
    }

    /// Per-row weights; all ones when none were attached.
    pub fn row_weights(&self) -> Result<Vec<f64>> {
        match &self.weights {
            Some(w) if w.len() != self.x.rows => Err(Error::ShapeMismatch {
                op: "batch.weights",
                expected: (self.x.rows, 1),
                got: (w.len(), 1),
            }),
            Some(w) => Ok(w.clone()),
            None => Ok(vec![1.0; self.x.rows]),
        }
    }
}
