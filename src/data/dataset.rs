use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::data::batch::Batch;
use crate::error::{Error, Result};
use crate::math::matrix::Matrix;
use crate::random::key::RandomKey;

/// Handle to an unbounded stream of batches.
///
/// Cloning a `Dataset` clones the handle, not the stream: every clone pulls
/// from the same underlying iterator. Experiments rely on being the only
/// party advancing their datasets; pulling from a clone elsewhere changes
/// which batches training sees.
#[derive(Clone)]
pub struct Dataset {
    inner: Rc<RefCell<dyn Iterator<Item = Batch>>>,
}

impl Dataset {
    /// Wraps any iterator of batches. Ending the iterator is an error at
    /// the point the missing batch is requested.
    pub fn new<I>(batches: I) -> Dataset
    where
        I: Iterator<Item = Batch> + 'static,
    {
        Dataset { inner: Rc::new(RefCell::new(batches)) }
    }

    /// The same batch, forever.
    pub fn repeat(batch: Batch) -> Dataset {
        Dataset::new(std::iter::repeat(batch))
    }

    /// Cycles through `batches` in order, forever.
    pub fn cycle(batches: Vec<Batch>) -> Result<Dataset> {
        if batches.is_empty() {
            return Err(Error::EmptyData("cannot cycle an empty list of batches".into()));
        }
        Ok(Dataset::new(batches.into_iter().cycle()))
    }

    /// Shuffled mini-batches over `(x, y)`, reshuffling at every epoch.
    ///
    /// The shuffle order is a pure function of `seed`. The last batch of an
    /// epoch may be smaller than `batch_size`; a `batch_size` of at least
    /// the number of rows yields the full dataset every time.
    pub fn shuffled(x: Matrix, y: Matrix, batch_size: usize, seed: u64) -> Result<Dataset> {
        Ok(Dataset::new(ShuffledBatches::new(x, y, batch_size, seed)?))
    }

    /// Pulls the next batch.
    pub fn next_batch(&self) -> Result<Batch> {
        self.inner.borrow_mut().next().ok_or(Error::DatasetExhausted)
    }
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("handles", &Rc::strong_count(&self.inner))
            .finish()
    }
}

/// Epoch-wise shuffled mini-batches.
struct ShuffledBatches {
    x: Matrix,
    y: Matrix,
    batch_size: usize,
    rng: ChaCha8Rng,
    order: Vec<usize>,
    cursor: usize,
}

impl ShuffledBatches {
    fn new(x: Matrix, y: Matrix, batch_size: usize, seed: u64) -> Result<ShuffledBatches> {
        if x.rows == 0 {
            return Err(Error::EmptyData("shuffled dataset needs at least one row".into()));
        }
        if x.rows != y.rows {
            return Err(Error::ShapeMismatch {
                op: "dataset",
                expected: (x.rows, y.cols),
                got: y.shape(),
            });
        }
        if batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be at least 1".into()));
        }
        let n = x.rows;
        Ok(ShuffledBatches {
            x,
            y,
            batch_size: batch_size.min(n),
            rng: RandomKey::from_seed(seed).rng(),
            order: (0..n).collect(),
            // Start past the end so the first call shuffles.
            cursor: n,
        })
    }
}

impl Iterator for ShuffledBatches {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        if self.cursor >= self.order.len() {
            self.order.shuffle(&mut self.rng);
            self.cursor = 0;
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let rows = &self.order[self.cursor..end];
        self.cursor = end;

        // Indices come from `0..x.rows`, so the gathers cannot fail.
        let x = self.x.select_rows(rows).ok()?;
        let y = self.y.select_rows(rows).ok()?;
        Some(Batch::new(x, y).with_data_index(rows.to_vec()))
    }
}
