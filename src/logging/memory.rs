use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::logging::logger::{Logger, Record};

/// Keeps every record in memory.
///
/// Clones share storage, so a caller can hand one clone to an experiment
/// and read the records back through another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLogger {
    records: Rc<RefCell<Vec<Record>>>,
}

impl InMemoryLogger {
    pub fn new() -> InMemoryLogger {
        InMemoryLogger::default()
    }

    /// Snapshot of all records written so far, oldest first.
    pub fn records(&self) -> Vec<Record> {
        self.records.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl Logger for InMemoryLogger {
    fn write(&mut self, record: &Record) -> Result<()> {
        self.records.borrow_mut().push(record.clone());
        Ok(())
    }
}
