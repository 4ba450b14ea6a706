pub mod loss_fn;
pub mod mse;
pub mod cross_entropy;
pub mod l2;
pub mod xent;
pub mod weight_decay;

pub use loss_fn::{LossFn, LossMetrics, LossOutput};
pub use mse::MseLoss;
pub use cross_entropy::CrossEntropyLoss;
pub use l2::L2Loss;
pub use xent::XentLoss;
pub use weight_decay::WeightDecay;
