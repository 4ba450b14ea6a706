use std::time::Duration;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::logging::terminal::TerminalLogger;

/// One structured log entry: string keys to JSON values.
pub type Record = Map<String, Value>;

/// Sink for metrics records.
pub trait Logger {
    fn write(&mut self, record: &Record) -> Result<()>;
}

/// The logger an experiment uses when none is supplied: a terminal logger
/// with the given label and throttle. `Duration::ZERO` writes everything.
pub fn make_default_logger(label: &str, time_delta: Duration) -> Box<dyn Logger> {
    Box::new(TerminalLogger::new(label, time_delta))
}
