//! Housekeeping telemetry reader.

use crate::reader::{parse_error, read_numbered_rows};
use crate::Result;
use isgri_algorithms::HousekeepingSamples;
use isgri_core::pixel::N_MODULES;
use serde::Deserialize;
use std::path::Path;

/// One `kind,module,value` sample.
#[derive(Debug, Deserialize)]
struct HkRow {
    kind: String,
    module: usize,
    value: f64,
}

/// Reads `kind,module,value` rows, `kind` being `temperature` or `bias`.
///
/// # Errors
/// Returns an error if the file is unreadable or a row is malformed.
pub fn read_housekeeping<P: AsRef<Path>>(path: P) -> Result<HousekeepingSamples> {
    let path = path.as_ref();
    parse_housekeeping(path, &std::fs::read_to_string(path)?)
}

/// Parses housekeeping rows. `path` only labels errors.
///
/// # Errors
/// Returns [`crate::Error::Parse`] on an unknown kind, a module outside 0..8 or a
/// non-numeric value.
pub fn parse_housekeeping(path: &Path, text: &str) -> Result<HousekeepingSamples> {
    let mut samples = HousekeepingSamples::new();
    for (line, row) in read_numbered_rows::<HkRow>(path, text, 3)? {
        if row.module >= N_MODULES {
            return Err(parse_error(
                path,
                line,
                format!("module {} out of range", row.module),
            ));
        }
        match row.kind.to_ascii_lowercase().as_str() {
            "temperature" | "temp" => samples.push_temperature(row.module, row.value),
            "bias" => samples.push_bias(row.module, row.value),
            other => {
                return Err(parse_error(
                    path,
                    line,
                    format!("unknown housekeeping kind {other:?}"),
                ));
            }
        }
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::Error;

    #[test]
    fn test_parse_housekeeping() {
        let text = "kind,module,value\ntemperature,0,-7.5\nbias,0,-120.5\nTEMP,7,-9.0\n";
        let samples = parse_housekeeping(Path::new("hk.csv"), text).unwrap();
        assert_eq!(samples.temperatures[0], vec![-7.5]);
        assert_eq!(samples.temperatures[7], vec![-9.0]);
        assert_eq!(samples.biases[0], vec![-120.5]);
        assert!(samples.biases[1].is_empty());
    }

    #[test]
    fn test_rejects_bad_rows() {
        let hk = Path::new("hk.csv");
        assert!(matches!(
            parse_housekeeping(hk, "temperature,8,1.0\n").unwrap_err(),
            Error::Parse { line: 1, .. }
        ));
        assert!(parse_housekeeping(hk, "pressure,1,1.0\n").is_err());
        assert!(parse_housekeeping(hk, "bias,1\n").is_err());
        assert!(matches!(
            parse_housekeeping(hk, "kind,module,value\nbias,1,-120\nvoltage,2,5.0\n").unwrap_err(),
            Error::Parse { line: 3, .. }
        ));
    }
}
