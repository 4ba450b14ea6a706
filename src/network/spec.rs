use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};

/// A serializable description of an MLP ensemble.
///
/// Fields:
/// - `num_members`  — number of independently initialized MLPs; the
///                    ensemble's index picks one of them
/// - `hidden_sizes` — neurons per hidden layer, input → output order
/// - `output_size`  — width of the final (linear) layer
/// - `activation`   — hidden-layer activation
///
/// The input dimension is not part of the spec; it is read off the sample
/// batch at `init` time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleSpec {
    /// Human-readable name, used as the file stem when saved.
    pub name: String,
    pub num_members: usize,
    pub hidden_sizes: Vec<usize>,
    pub output_size: usize,
    pub activation: ActivationFunction,
}

impl EnsembleSpec {
    pub fn validate(&self) -> Result<()> {
        if self.num_members == 0 {
            return Err(Error::InvalidConfig("ensemble needs at least one member".into()));
        }
        if self.output_size == 0 || self.hidden_sizes.contains(&0) {
            return Err(Error::InvalidConfig(format!(
                "layer widths must be positive, got hidden {:?} and output {}",
                self.hidden_sizes, self.output_size
            )));
        }
        Ok(())
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes an `EnsembleSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<EnsembleSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
