use std::collections::BTreeMap;

use crate::data::batch::Batch;
use crate::error::Result;
use crate::network::enn::EpistemicNetwork;
use crate::params::params::Params;
use crate::random::key::RandomKey;

/// Named scalar metrics reported alongside a loss.
pub type LossMetrics = BTreeMap<String, f64>;

/// Scalar loss plus whatever metrics the loss function chooses to report.
#[derive(Debug, Clone, PartialEq)]
pub struct LossOutput {
    pub loss: f64,
    pub metrics: LossMetrics,
}

impl LossOutput {
    pub fn new(loss: f64) -> LossOutput {
        LossOutput { loss, metrics: LossMetrics::new() }
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> LossOutput {
        self.metrics.insert(name.into(), value);
        self
    }
}

/// A loss over an ENN: `(enn, params, batch, key) → (loss, metrics)`.
///
/// `value_and_grad` must compute the loss and its gradient with respect to
/// `params` from one forward evaluation, and the gradient tree must have
/// the same structure as `params`.
pub trait LossFn<N: EpistemicNetwork> {
    fn value_and_grad(
        &self,
        enn: &N,
        params: &Params,
        batch: &Batch,
        key: RandomKey,
    ) -> Result<(LossOutput, Params)>;

    /// Loss without gradient. Must agree with `value_and_grad` for the same
    /// arguments.
    fn evaluate(&self, enn: &N, params: &Params, batch: &Batch, key: RandomKey) -> Result<LossOutput> {
        self.value_and_grad(enn, params, batch, key).map(|(out, _)| out)
    }
}

impl<N, F> LossFn<N> for F
where
    N: EpistemicNetwork,
    F: Fn(&N, &Params, &Batch, RandomKey) -> Result<(LossOutput, Params)>,
{
    fn value_and_grad(
        &self,
        enn: &N,
        params: &Params,
        batch: &Batch,
        key: RandomKey,
    ) -> Result<(LossOutput, Params)> {
        self(enn, params, batch, key)
    }
}
