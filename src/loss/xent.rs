use crate::data::batch::Batch;
use crate::error::{Error, Result};
use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::loss::loss_fn::{LossFn, LossOutput};
use crate::network::enn::EpistemicNetwork;
use crate::params::params::Params;
use crate::random::key::RandomKey;

/// Classification loss: softmax cross-entropy on the network's logits,
/// averaged over `num_index_samples` sampled indices.
///
/// Targets are class indices in a `rows × 1` matrix. Reports `acc`, the
/// accuracy averaged over the sampled indices.
#[derive(Debug, Clone, PartialEq)]
pub struct XentLoss {
    pub num_classes: usize,
    pub num_index_samples: usize,
}

impl XentLoss {
    pub fn new(num_classes: usize, num_index_samples: usize) -> XentLoss {
        XentLoss { num_classes, num_index_samples }
    }

    fn check(&self) -> Result<()> {
        if self.num_index_samples == 0 {
            return Err(Error::InvalidConfig("XentLoss needs at least one index sample".into()));
        }
        if self.num_classes < 2 {
            return Err(Error::InvalidConfig("XentLoss needs at least two classes".into()));
        }
        Ok(())
    }

    fn check_logits(&self, rows: usize, cols: usize) -> Result<()> {
        if cols != self.num_classes {
            return Err(Error::ShapeMismatch {
                op: "xent_loss",
                expected: (rows, self.num_classes),
                got: (rows, cols),
            });
        }
        Ok(())
    }
}

impl<N: EpistemicNetwork> LossFn<N> for XentLoss {
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

        let (mut loss, mut acc) = (0.0, 0.0);
        let mut grads = params.zeros_like();
        for sub_key in key.split(self.num_index_samples) {
            let index = enn.indexer(sub_key);
            let (logits, tape) = enn.forward(params, &batch.x, &index)?;
            self.check_logits(logits.rows, logits.cols)?;
            let (sample_loss, logit_grad, sample_acc) =
                CrossEntropyLoss::batch(&logits, &batch.y, &weights)?;
            loss += scale * sample_loss;
            acc += scale * sample_acc;
            grads.accumulate(&enn.backward(params, &tape, &logit_grad.scale(scale))?)?;
        }
        Ok((LossOutput::new(loss).with_metric("acc", acc), grads))
    }

    fn evaluate(&self, enn: &N, params: &Params, batch: &Batch, key: RandomKey) -> Result<LossOutput> {
        self.check()?;
        let weights = batch.row_weights()?;
        let scale = 1.0 / self.num_index_samples as f64;

        let (mut loss, mut acc) = (0.0, 0.0);
        for sub_key in key.split(self.num_index_samples) {
            let logits = enn.apply(params, &batch.x, &enn.indexer(sub_key))?;
            self.check_logits(logits.rows, logits.cols)?;
            let (sample_loss, _, sample_acc) = CrossEntropyLoss::batch(&logits, &batch.y, &weights)?;
            loss += scale * sample_loss;
            acc += scale * sample_acc;
        }
        Ok(LossOutput::new(loss).with_metric("acc", acc))
    }
}
