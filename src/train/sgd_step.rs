use crate::data::batch::Batch;
use crate::error::Result;
use crate::loss::loss_fn::{LossMetrics, LossOutput};
use crate::optim::Optimizer;
use crate::random::key::RandomKey;
use crate::train::state::TrainingState;
use crate::train::trainer::PureLoss;

/// One gradient step of `pure_loss` on `batch`.
///
/// Loss, metrics and gradient come from a single `value_and_grad` call.
/// The returned metrics carry the loss under `"loss"`, replacing any
/// `"loss"` entry the loss function reported itself. `state` is only read;
/// a failure anywhere leaves the caller with its old state.
pub fn sgd_step<O: Optimizer>(
    optimizer: &O,
    pure_loss: &dyn PureLoss,
    state: &TrainingState<O::State>,
    batch: &Batch,
    key: RandomKey,
) -> Result<(TrainingState<O::State>, LossMetrics)> {
    let (LossOutput { loss, mut metrics }, grads) = pure_loss.value_and_grad(&state.params, batch, key)?;
    metrics.insert("loss".to_string(), loss);

    let (updates, opt_state) = optimizer.update(&grads, &state.opt_state)?;
    let params = optimizer.apply_updates(&state.params, &updates)?;

    Ok((TrainingState { params, opt_state }, metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::math::matrix::Matrix;
    use crate::optim::Sgd;
    use crate::params::params::Params;
    use approx::assert_relative_eq;

    /// Loss = w², reporting a bogus "loss" metric of its own.
    struct Quadratic;

    impl PureLoss for Quadratic {
        fn value_and_grad(&self, params: &Params, batch: &Batch, key: RandomKey) -> Result<(LossOutput, Params)> {
            let out = self.evaluate(params, batch, key)?;
            Ok((out, params.scale(2.0)))
        }

        fn evaluate(&self, params: &Params, _batch: &Batch, _key: RandomKey) -> Result<LossOutput> {
            Ok(LossOutput::new(params.sum_squares())
                .with_metric("loss", -1.0)
                .with_metric("extra", 7.0))
        }
    }

    struct Broken;

    impl PureLoss for Broken {
        fn value_and_grad(&self, _: &Params, _: &Batch, _: RandomKey) -> Result<(LossOutput, Params)> {
            Err(Error::MissingParameter("w".into()))
        }

        fn evaluate(&self, _: &Params, _: &Batch, _: RandomKey) -> Result<LossOutput> {
            Err(Error::MissingParameter("w".into()))
        }
    }

    fn state(opt: &Sgd, w: f64) -> TrainingState<<Sgd as Optimizer>::State> {
        let mut params = Params::new();
        params.insert("w", Matrix::filled(1, 1, w));
        let opt_state = opt.init(&params);
        TrainingState::new(params, opt_state)
    }

    fn batch() -> Batch {
        Batch::new(Matrix::zeros(1, 1), Matrix::zeros(1, 1))
    }

    #[test]
    fn step_descends_and_overwrites_loss_metric() {
        let opt = Sgd::new(0.25);
        let before = state(&opt, 2.0);
        let (after, metrics) = sgd_step(&opt, &Quadratic, &before, &batch(), RandomKey::from_seed(0)).unwrap();

        // w ← w - lr · 2w = 2 - 0.25 · 4
        assert_relative_eq!(after.params.get("w").unwrap().data[0][0], 1.0);
        assert_relative_eq!(metrics["loss"], 4.0);
        assert_relative_eq!(metrics["extra"], 7.0);
        // Input untouched.
        assert_relative_eq!(before.params.get("w").unwrap().data[0][0], 2.0);
    }

    #[test]
    fn loss_failure_propagates() {
        let opt = Sgd::new(0.1);
        let before = state(&opt, 1.0);
        let result = sgd_step(&opt, &Broken, &before, &batch(), RandomKey::from_seed(0));
        assert!(matches!(result, Err(Error::MissingParameter(_))));
    }
}
