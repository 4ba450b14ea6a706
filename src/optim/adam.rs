//! Adam optimizer

use crate::error::{Error, Result};
use crate::optim::optimizer::Optimizer;
use crate::params::params::Params;

/// Adam optimizer (Adaptive Moment Estimation)
#[derive(Debug, Clone, PartialEq)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
}

/// First and second moment estimates plus the step count used for bias
/// correction.
#[derive(Debug, Clone, PartialEq)]
pub struct AdamState {
    pub count: u64,
    pub mu: Params,
    pub nu: Params,
}

impl Adam {
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Result<Adam> {
        for (name, beta) in [("beta1", beta1), ("beta2", beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(Error::InvalidConfig(format!("{name} must be in [0, 1), got {beta}")));
            }
        }
        if epsilon <= 0.0 {
            return Err(Error::InvalidConfig(format!("epsilon must be positive, got {epsilon}")));
        }
        Ok(Adam { learning_rate, beta1, beta2, epsilon })
    }

    /// Adam with the usual β1 = 0.9, β2 = 0.999, ε = 1e-8.
    pub fn default_params(learning_rate: f64) -> Adam {
        Adam { learning_rate, beta1: 0.9, beta2: 0.999, epsilon: 1e-8 }
    }
}

impl Optimizer for Adam {
    type State = AdamState;

    fn init(&self, params: &Params) -> AdamState {
        AdamState { count: 0, mu: params.zeros_like(), nu: params.zeros_like() }
    }

    fn update(&self, grads: &Params, state: &AdamState) -> Result<(Params, AdamState)> {
        let (b1, b2) = (self.beta1, self.beta2);

        // m_t = β1 * m_{t-1} + (1 - β1) * g
        let mu = state.mu.zip_with(grads, |m, g| b1 * m + (1.0 - b1) * g)?;
        // v_t = β2 * v_{t-1} + (1 - β2) * g²
        let nu = state.nu.zip_with(grads, |v, g| b2 * v + (1.0 - b2) * g * g)?;
        let count = state.count + 1;

        let mu_correction = 1.0 - b1.powi(count as i32);
        let nu_correction = 1.0 - b2.powi(count as i32);
        let (lr, eps) = (self.learning_rate, self.epsilon);
        let updates = mu.zip_with(&nu, |m, v| {
            -lr * (m / mu_correction) / ((v / nu_correction).sqrt() + eps)
        })?;

        Ok((updates, AdamState { count, mu, nu }))
    }
}
