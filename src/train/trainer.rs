use std::fmt;
use std::rc::Rc;

use crate::data::batch::Batch;
use crate::data::dataset::Dataset;
use crate::error::Result;
use crate::loss::loss_fn::{LossFn, LossOutput};
use crate::network::enn::EpistemicNetwork;
use crate::params::params::Params;
use crate::random::key::RandomKey;

/// Predicate over the 1-based global step: train on this step or not.
pub type Schedule = Rc<dyn Fn(u64) -> bool>;

/// Ready-made schedules.
pub mod schedule {
    use super::Schedule;
    use std::rc::Rc;

    /// Every step.
    pub fn always() -> Schedule {
        Rc::new(|_| true)
    }

    /// Steps that are multiples of `period` (`period` of 0 never fires).
    pub fn every(period: u64) -> Schedule {
        Rc::new(move |step| period != 0 && step % period == 0)
    }

    /// Steps `1..=last`.
    pub fn until(last: u64) -> Schedule {
        Rc::new(move |step| step <= last)
    }
}

/// One training signal: a loss, the dataset it pulls from, when it trains,
/// and the name its records are tagged with.
///
/// For step = 1, 2, ...: if `should_train(step)`, apply one SGD step of
/// `loss_fn` on the next batch of `dataset`.
pub struct MultilossTrainer<N: EpistemicNetwork> {
    pub loss_fn: Box<dyn LossFn<N>>,
    pub dataset: Dataset,
    pub should_train: Schedule,
    pub name: String,
}

impl<N: EpistemicNetwork> MultilossTrainer<N> {
    /// Trainer named `"loss"` that trains on every step.
    pub fn new<L>(loss_fn: L, dataset: Dataset) -> Self
    where
        L: LossFn<N> + 'static,
    {
        MultilossTrainer {
            loss_fn: Box::new(loss_fn),
            dataset,
            should_train: schedule::always(),
            name: "loss".to_string(),
        }
    }

    pub fn with_schedule<F>(mut self, should_train: F) -> Self
    where
        F: Fn(u64) -> bool + 'static,
    {
        self.should_train = Rc::new(should_train);
        self
    }

    pub fn with_shared_schedule(mut self, should_train: Schedule) -> Self {
        self.should_train = should_train;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<N: EpistemicNetwork> fmt::Debug for MultilossTrainer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultilossTrainer")
            .field("name", &self.name)
            .field("dataset", &self.dataset)
            .finish_non_exhaustive()
    }
}

/// A loss with its network already bound: a function of
/// `(params, batch, key)` only.
pub trait PureLoss {
    fn value_and_grad(&self, params: &Params, batch: &Batch, key: RandomKey) -> Result<(LossOutput, Params)>;

    fn evaluate(&self, params: &Params, batch: &Batch, key: RandomKey) -> Result<LossOutput>;
}

/// `loss_fn` closed over a shared network handle.
struct BoundLoss<N: EpistemicNetwork> {
    enn: Rc<N>,
    loss_fn: Box<dyn LossFn<N>>,
}

impl<N: EpistemicNetwork> PureLoss for BoundLoss<N> {
    fn value_and_grad(&self, params: &Params, batch: &Batch, key: RandomKey) -> Result<(LossOutput, Params)> {
        self.loss_fn.value_and_grad(&self.enn, params, batch, key)
    }

    fn evaluate(&self, params: &Params, batch: &Batch, key: RandomKey) -> Result<LossOutput> {
        self.loss_fn.evaluate(&self.enn, params, batch, key)
    }
}

/// A `MultilossTrainer` after purification.
pub struct PureTrainer {
    pub pure_loss: Box<dyn PureLoss>,
    pub dataset: Dataset,
    pub should_train: Schedule,
    pub name: String,
}

impl fmt::Debug for PureTrainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PureTrainer")
            .field("name", &self.name)
            .field("dataset", &self.dataset)
            .finish_non_exhaustive()
    }
}

/// Binds every trainer's loss to `enn`, keeping list order. Datasets and
/// schedules are moved across, not copied.
pub fn purify_trainers<N>(trainers: Vec<MultilossTrainer<N>>, enn: &Rc<N>) -> Vec<PureTrainer>
where
    N: EpistemicNetwork + 'static,
{
    trainers.into_iter()
        .map(|t| PureTrainer {
            pure_loss: Box::new(BoundLoss { enn: Rc::clone(enn), loss_fn: t.loss_fn }),
            dataset: t.dataset,
            should_train: t.should_train,
            name: t.name,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedules_fire_on_expected_steps() {
        let every3 = schedule::every(3);
        let fired: Vec<u64> = (1..=9).filter(|&s| every3(s)).collect();
        assert_eq!(fired, vec![3, 6, 9]);

        let first2 = schedule::until(2);
        assert!(first2(1) && first2(2) && !first2(3));

        assert!((1..100).all(|s| schedule::always()(s)));
        assert!(!(1..100).any(|s| schedule::every(0)(s)));
    }
}
