//! Counter-keyed random keys shared by every trainer of an experiment.

pub mod key;
pub mod stream;

pub use key::{key_at, RandomKey};
pub use stream::RandomStream;
