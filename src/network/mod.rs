pub mod enn;
pub mod ensemble;
pub mod spec;

pub use enn::EpistemicNetwork;
pub use ensemble::{EnsembleTape, MlpEnsemble};
pub use spec::EnsembleSpec;
