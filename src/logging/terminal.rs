use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::info;

use crate::error::Result;
use crate::logging::logger::{Logger, Record};

/// Writes each record as one `tracing` event at INFO level.
///
/// Records arriving less than `time_delta` after the last written one are
/// dropped.
#[derive(Debug)]
pub struct TerminalLogger {
    label: String,
    time_delta: Duration,
    last_write: Option<Instant>,
}

impl TerminalLogger {
    pub fn new(label: &str, time_delta: Duration) -> TerminalLogger {
        TerminalLogger { label: label.to_string(), time_delta, last_write: None }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn due(&self, now: Instant) -> bool {
        match self.last_write {
            Some(last) => now.duration_since(last) >= self.time_delta,
            None => true,
        }
    }
}

/// `"[Experiment] Dataset = train | Loss = 0.125 | Step = 3"`
pub fn format_record(label: &str, record: &Record) -> String {
    let fields: Vec<String> = record.iter()
        .map(|(key, value)| format!("{} = {}", title_case(key), format_value(value)))
        .collect();
    format!("[{}] {}", title_case(label), fields.join(" | "))
}

fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_f64() => n.as_f64().map(|f| format!("{f:.3}")).unwrap_or_default(),
        other => other.to_string(),
    }
}

impl Logger for TerminalLogger {
    fn write(&mut self, record: &Record) -> Result<()> {
        let now = Instant::now();
        if self.time_delta.is_zero() || self.due(now) {
            info!(label = %self.label, "{}", format_record(&self.label, record));
            self.last_write = Some(now);
        }
        Ok(())
    }
}
