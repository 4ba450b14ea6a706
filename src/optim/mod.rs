//! Optimizers for training ENN parameters

mod adam;
mod optimizer;
mod sgd;

pub use adam::{Adam, AdamState};
pub use optimizer::Optimizer;
pub use sgd::{Sgd, SgdState};
