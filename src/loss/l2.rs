use crate::data::batch::Batch;
use crate::error::{Error, Result};
use crate::loss::loss_fn::{LossFn, LossOutput};
use crate::loss::mse::MseLoss;
use crate::network::enn::EpistemicNetwork;
use crate::params::params::Params;
use crate::random::key::RandomKey;

/// Regression loss: row-weighted MSE averaged over `num_index_samples`
/// indices drawn from the key.
#[derive(Debug, Clone, PartialEq)]
pub struct L2Loss {
    pub num_index_samples: usize,
}

impl L2Loss {
    pub fn new(num_index_samples: usize) -> L2Loss {
        L2Loss { num_index_samples }
    }

    fn check(&self) -> Result<()> {
        if self.num_index_samples == 0 {
            return Err(Error::InvalidConfig("L2Loss needs at least one index sample".into()));
        }
        Ok(())
    }
}

impl<N: EpistemicNetwork> LossFn<N> for L2Loss {
    fn value_and_grad(
        &self,
        enn: &N,
        params: &Params,
        batch: &Batch,
        key: RandomKey,
    ) -> Result<(LossOutput, Params)> {
        self.check()?;
        let weights = batch.row_weights()?;
        let scale = 1.0 / self.num_index_samples as f64;

        let mut loss = 0.0;
        let mut grads = params.zeros_like();
        for sub_key in key.split(self.num_index_samples) {
            let index = enn.indexer(sub_key);
            let (out, tape) = enn.forward(params, &batch.x, &index)?;
            let (sample_loss, out_grad) = MseLoss::batch(&out, &batch.y, &weights)?;
            loss += scale * sample_loss;
            grads.accumulate(&enn.backward(params, &tape, &out_grad.scale(scale))?)?;
        }
        Ok((LossOutput::new(loss), grads))
    }

    fn evaluate(&self, enn: &N, params: &Params, batch: &Batch, key: RandomKey) -> Result<LossOutput> {
        self.check()?;
        let weights = batch.row_weights()?;
        let scale = 1.0 / self.num_index_samples as f64;

        let mut loss = 0.0;
        for sub_key in key.split(self.num_index_samples) {
            let out = enn.apply(params, &batch.x, &enn.indexer(sub_key))?;
            loss += scale * MseLoss::batch(&out, &batch.y, &weights)?.0;
        }
        Ok(LossOutput::new(loss))
    }
}
