use std::time::Duration;

use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

/// Scalar settings of a `MultilossExperiment`.
///
/// # Fields
/// - `seed`                — root of the experiment's random stream
/// - `train_log_freq`      — write a train record on steps divisible by this
/// - `eval_log_freq`       — run an evaluation round on steps divisible by this
/// - `logger_label`        — label of the default terminal logger
/// - `log_time_delta_secs` — minimum seconds between default-logger writes;
///                           `0` writes every record
///
/// Every field has a default, so a JSON file only needs the fields it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub seed: u64,
    pub train_log_freq: u64,
    pub eval_log_freq: u64,
    pub logger_label: String,
    pub log_time_delta_secs: f64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        ExperimentConfig {
            seed: 0,
            train_log_freq: 1,
            eval_log_freq: 1,
            logger_label: "experiment".to_string(),
            log_time_delta_secs: 0.0,
        }
    }
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.train_log_freq == 0 {
            return Err(Error::InvalidConfig("train_log_freq must be at least 1".into()));
        }
        if self.eval_log_freq == 0 {
            return Err(Error::InvalidConfig("eval_log_freq must be at least 1".into()));
        }
        if !(self.log_time_delta_secs.is_finite() && self.log_time_delta_secs >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "log_time_delta_secs must be a non-negative number, got {}",
                self.log_time_delta_secs
            )));
        }
        Ok(())
    }

    pub fn log_time_delta(&self) -> Duration {
        Duration::from_secs_f64(self.log_time_delta_secs)
    }

    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Loads and validates a config file.
    pub fn load_json(path: &str) -> Result<ExperimentConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: ExperimentConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: ExperimentConfig = serde_json::from_str(r#"{"seed": 9, "eval_log_freq": 5}"#).unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.eval_log_freq, 5);
        assert_eq!(config.train_log_freq, 1);
        assert_eq!(config.logger_label, "experiment");
        assert!(config.log_time_delta().is_zero());
    }

    #[test]
    fn zero_frequencies_are_rejected() {
        let config = ExperimentConfig { train_log_freq: 0, ..ExperimentConfig::default() };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        let config = ExperimentConfig { eval_log_freq: 0, ..ExperimentConfig::default() };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        let config = ExperimentConfig { log_time_delta_secs: -1.0, ..ExperimentConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let path = path.to_str().unwrap();
        let config = ExperimentConfig { seed: 3, train_log_freq: 10, ..ExperimentConfig::default() };
        config.save_json(path).unwrap();
        assert_eq!(ExperimentConfig::load_json(path).unwrap(), config);
    }

    #[test]
    fn load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"train_log_freq": 0}"#).unwrap();
        assert!(matches!(
            ExperimentConfig::load_json(path.to_str().unwrap()),
            Err(Error::InvalidConfig(_))
        ));
    }
}
