use crate::params::params::Params;

/// Everything an SGD step reads and produces: parameters plus optimizer
/// state.
///
/// Treated as an immutable value; each step builds a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingState<S> {
    pub params: Params,
    pub opt_state: S,
}

impl<S> TrainingState<S> {
    pub fn new(params: Params, opt_state: S) -> TrainingState<S> {
        TrainingState { params, opt_state }
    }
}
