//! JSON run configuration.
//!
//! Every field is optional in the file; missing fields take their
//! defaults so a config can hold just the calibration paths and have the
//! rest supplied on the command line.

use crate::calibration::CalibrationPaths;
use crate::Result;
use isgri_algorithms::{ExecutionMode, ModuleConditions, TransformConfig};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Everything one `process` run needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Calibration table locations.
    pub calibration: CalibrationPaths,
    /// Input event list.
    pub events: PathBuf,
    /// Output file for the corrected columns.
    pub output: PathBuf,
    /// Optional housekeeping telemetry; defaults are used without it.
    pub housekeeping: Option<PathBuf>,
    /// Mission revolution of the event batch.
    pub revolution: i64,
    /// Random seed; entropy-seeded when absent.
    pub seed: Option<u64>,
    /// Apply the dual-law gain-drift correction.
    pub correct_gain_drift: bool,
    /// Execution strategy.
    pub execution: ExecutionMode,
    /// Explicit module conditions, overriding housekeeping.
    pub conditions: Option<ModuleConditions>,
    /// Also write `pha1`, `rt1` and `pha2`.
    pub diagnostic_columns: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            calibration: CalibrationPaths::default(),
            events: PathBuf::new(),
            output: PathBuf::new(),
            housekeeping: None,
            revolution: 0,
            seed: None,
            correct_gain_drift: true,
            execution: ExecutionMode::Sequential,
            conditions: None,
            diagnostic_columns: false,
        }
    }
}

impl RunConfig {
    /// Loads a run configuration from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or is not valid JSON.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Loads a run configuration from a JSON string.
    ///
    /// # Errors
    /// Returns an error if the string is not valid JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the configuration as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Transform settings of this run.
    #[must_use]
    pub fn transform_config(&self) -> TransformConfig {
        TransformConfig::default()
            .with_revolution(self.revolution)
            .with_gain_drift_correction(self.correct_gain_drift)
            .with_execution(self.execution)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = RunConfig::from_json(r#"{"revolution": 1200, "seed": 42}"#).unwrap();
        assert_eq!(config.revolution, 1200);
        assert_eq!(config.seed, Some(42));
        assert!(config.correct_gain_drift);
        assert_eq!(config.execution, ExecutionMode::Sequential);
        assert!(config.housekeeping.is_none());
        assert!(!config.diagnostic_columns);
    }

    #[test]
    fn test_full_config() {
        let json = r#"{
            "calibration": {
                "lut1": "lut1.csv",
                "lut2": "lut2.bin",
                "gain2": "gain2.csv",
                "offset2": "offset2.csv"
            },
            "events": "events.csv",
            "output": "out.csv",
            "revolution": 300,
            "correct_gain_drift": false,
            "execution": "parallel",
            "conditions": {
                "temperatures_c": [-9, -9, -9, -9, -9, -9, -9, -9],
                "biases_v": [-100, -100, -100, -100, -100, -100, -100, -100]
            },
            "diagnostic_columns": true
        }"#;
        let config = RunConfig::from_json(json).unwrap();
        assert_eq!(config.calibration.lut2, PathBuf::from("lut2.bin"));
        assert_eq!(config.events, PathBuf::from("events.csv"));
        let conditions = config.conditions.unwrap();
        assert_eq!(conditions.temperatures_c[3], -9.0);
        assert_eq!(conditions.biases_v[7], -100.0);

        let transform = config.transform_config();
        assert_eq!(transform.revolution, 300);
        assert!(!transform.correct_gain_drift);
        assert_eq!(transform.execution, ExecutionMode::Parallel);
    }

    #[test]
    fn test_from_file_and_back() {
        let config = RunConfig {
            revolution: 77,
            seed: Some(5),
            ..RunConfig::default()
        };
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(config.to_json().unwrap().as_bytes()).unwrap();
        file.flush().unwrap();

        assert_eq!(RunConfig::from_file(file.path()).unwrap(), config);
    }

    #[test]
    fn test_invalid_json() {
        assert!(RunConfig::from_json("{revolution: }").is_err());
        assert!(RunConfig::from_json(r#"{"execution": "fast"}"#).is_err());
    }
}
