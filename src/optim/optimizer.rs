//! Optimizer trait

use std::fmt::Debug;

use crate::error::Result;
use crate::params::params::Params;

/// A gradient transformation.
///
/// Optimizers are stateless values; everything that evolves during
/// training lives in `State`, which is threaded through `update` and
/// returned rather than mutated.
pub trait Optimizer {
    type State: Clone + Debug + PartialEq;

    /// Initial state for the given parameters.
    fn init(&self, params: &Params) -> Self::State;

    /// Maps gradients to updates and returns the next state.
    fn update(&self, grads: &Params, state: &Self::State) -> Result<(Params, Self::State)>;

    /// Adds updates to parameters.
    fn apply_updates(&self, params: &Params, updates: &Params) -> Result<Params> {
        params.add(updates)
    }
}
