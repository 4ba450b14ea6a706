//! Sinks for the metrics records an experiment emits.

pub mod logger;
pub mod terminal;
pub mod memory;
pub mod jsonl;

pub use logger::{make_default_logger, Logger, Record};
pub use terminal::TerminalLogger;
pub use memory::InMemoryLogger;
pub use jsonl::JsonLinesLogger;
