use crate::data::batch::Batch;
use crate::error::Result;
use crate::loss::loss_fn::{LossFn, LossOutput};
use crate::network::enn::EpistemicNetwork;
use crate::params::params::Params;
use crate::random::key::RandomKey;

/// L2 penalty on every parameter: `scale · Σ θ²`.
///
/// Ignores the batch and the key, so it is typically scheduled as a
/// separate, less frequent trainer acting as a prior. Reports `l2_norm`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightDecay {
    pub scale: f64,
}

impl WeightDecay {
    pub fn new(scale: f64) -> WeightDecay {
        WeightDecay { scale }
    }

    fn output(&self, params: &Params) -> LossOutput {
        LossOutput::new(self.scale * params.sum_squares()).with_metric("l2_norm", params.l2_norm())
    }
}

impl<N: EpistemicNetwork> LossFn<N> for WeightDecay {
    fn value_and_grad(
        &self,
        _enn: &N,
        params: &Params,
        _batch: &Batch,
        _key: RandomKey,
    ) -> Result<(LossOutput, Params)> {
        Ok((self.output(params), params.scale(2.0 * self.scale)))
    }

    fn evaluate(&self, _enn: &N, params: &Params, _batch: &Batch, _key: RandomKey) -> Result<LossOutput> {
        Ok(self.output(params))
    }
}
