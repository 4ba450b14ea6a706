use std::fs::File;
use std::io::{BufWriter, Write};

use crate::error::Result;
use crate::logging::logger::{Logger, Record};

/// Writes one JSON object per line.
pub struct JsonLinesLogger<W: Write> {
    writer: W,
}

impl JsonLinesLogger<BufWriter<File>> {
    /// Creates (or truncates) `path`.
    pub fn create(path: &str) -> Result<Self> {
        Ok(JsonLinesLogger::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> JsonLinesLogger<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesLogger { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Logger for JsonLinesLogger<W> {
    fn write(&mut self, record: &Record) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn writes_one_object_per_line() {
        let mut logger = JsonLinesLogger::new(Vec::new());
        for step in 1..=2 {
            let mut record = Record::new();
            record.insert("step".into(), json!(step));
            logger.write(&record).unwrap();
        }
        let text = String::from_utf8(logger.into_inner()).unwrap();
        let lines: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines, vec![json!({"step": 1}), json!({"step": 2})]);
    }
}
