use std::fmt::Debug;

use crate::error::Result;
use crate::math::matrix::Matrix;
use crate::params::params::Params;
use crate::random::key::RandomKey;

/// An epistemic neural network: a network whose forward pass also takes an
/// `Index` selecting one epistemic instance (an ensemble member, a noise
/// draw, ...).
///
/// Implementations are pure: every method is a function of its arguments,
/// and all randomness comes from the keys passed in.
pub trait EpistemicNetwork {
    /// Selects which epistemic instance a forward pass uses.
    type Index: Clone + Debug;

    /// Whatever `forward` records so that `backward` can run without a
    /// second forward evaluation.
    type Tape;

    /// Creates the full parameter tree. `x` is a sample input batch used
    /// to infer the input dimension.
    fn init(&self, key: RandomKey, x: &Matrix, index: &Self::Index) -> Result<Params>;

    /// Forward pass that also returns the tape for `backward`.
    fn forward(&self, params: &Params, x: &Matrix, index: &Self::Index) -> Result<(Matrix, Self::Tape)>;

    /// Forward pass without recording.
    fn apply(&self, params: &Params, x: &Matrix, index: &Self::Index) -> Result<Matrix> {
        self.forward(params, x, index).map(|(out, _)| out)
    }

    /// Vector-Jacobian product: maps ∂L/∂output to ∂L/∂params.
    ///
    /// The returned tree has the same structure as `params`; parameters
    /// that did not take part in the recorded pass get zero gradient.
    fn backward(&self, params: &Params, tape: &Self::Tape, output_grad: &Matrix) -> Result<Params>;

    /// Samples an index from a key.
    fn indexer(&self, key: RandomKey) -> Self::Index;
}
