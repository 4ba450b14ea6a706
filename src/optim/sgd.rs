use crate::error::{Error, Result};
use crate::optim::optimizer::Optimizer;
use crate::params::params::Params;

/// Stochastic gradient descent with optional momentum.
#[derive(Debug, Clone, PartialEq)]
pub struct Sgd {
    pub learning_rate: f64,
    pub momentum: f64,
}

/// Velocity buffer; `None` when momentum is disabled.
#[derive(Debug, Clone, PartialEq)]
pub struct SgdState {
    pub velocity: Option<Params>,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate, momentum: 0.0 }
    }

    pub fn with_momentum(learning_rate: f64, momentum: f64) -> Result<Sgd> {
        if !(0.0..1.0).contains(&momentum) {
            return Err(Error::InvalidConfig(format!("momentum must be in [0, 1), got {momentum}")));
        }
        Ok(Sgd { learning_rate, momentum })
    }
}

impl Optimizer for Sgd {
    type State = SgdState;

    fn init(&self, params: &Params) -> SgdState {
        SgdState {
            velocity: (self.momentum > 0.0).then(|| params.zeros_like()),
        }
    }

    fn update(&self, grads: &Params, state: &SgdState) -> Result<(Params, SgdState)> {
        let lr = self.learning_rate;
        match &state.velocity {
            // v = momentum * v - lr * grad
            Some(v) => {
                let momentum = self.momentum;
                let velocity = v.zip_with(grads, |v, g| momentum * v - lr * g)?;
                Ok((velocity.clone(), SgdState { velocity: Some(velocity) }))
            }
            None => Ok((grads.scale(-lr), state.clone())),
        }
    }
}
