//! Calibration table loaders (LUT1, LUT2, law-2 coefficients).
//!
//! Every loader enforces the exact table dimensions before anything
//! reaches the correction engine.

use crate::reader::{read_rows, MappedFileReader};
use crate::{Error, Result};
use isgri_core::law2::{Law2Coefficients, LAW2_GAIN_COLUMNS, LAW2_OFFSET_COLUMNS};
use isgri_core::lut1::{Lut1, LUT1_COEFFICIENTS, LUT1_COLUMNS};
use isgri_core::lut2::{Lut2Cube, LUT2_LEN};
use isgri_core::tables::CalibrationTables;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Locations of the four calibration inputs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationPaths {
    /// LUT1 CSV (16384 x 5).
    pub lut1: PathBuf,
    /// LUT2 raw little-endian i16 cube.
    pub lut2: PathBuf,
    /// Law-2 gain coefficients CSV (256 x 2).
    pub gain2: PathBuf,
    /// Law-2 offset coefficients CSV (256 x 3).
    pub offset2: PathBuf,
}

/// Loads and validates all calibration tables.
///
/// # Errors
/// Returns an error if any table is unreadable or has the wrong shape.
pub fn load_calibration(paths: &CalibrationPaths) -> Result<CalibrationTables> {
    let lut1 = load_lut1(&paths.lut1)?;
    let lut2 = load_lut2(&paths.lut2)?;
    let law2 = load_law2(&paths.gain2, &paths.offset2)?;
    info!(
        "calibration loaded: LUT1 {}, LUT2 {}, laws {} / {}",
        paths.lut1.display(),
        paths.lut2.display(),
        paths.gain2.display(),
        paths.offset2.display()
    );
    Ok(CalibrationTables::new(lut1, lut2, law2))
}

/// Loads LUT1 from CSV.
///
/// # Errors
/// Returns an error if the file is unreadable, a row is malformed or the
/// row count is not 16384.
pub fn load_lut1<P: AsRef<Path>>(path: P) -> Result<Lut1> {
    let path = path.as_ref();
    parse_lut1(path, &std::fs::read_to_string(path)?)
}

/// One raw LUT1 row, before unit conversion.
#[derive(Debug, Deserialize)]
struct Lut1Row {
    gain: f64,
    offset: f64,
    rise_gain: f64,
    rise_offset: f64,
    pixel_type: i32,
}

/// Parses LUT1 rows `gain,offset,rise_gain,rise_offset,pixel_type`.
///
/// # Errors
/// Returns an error on a malformed row or a wrong row count.
pub fn parse_lut1(path: &Path, text: &str) -> Result<Lut1> {
    let rows: Vec<([f64; LUT1_COEFFICIENTS], i32)> = read_rows::<Lut1Row>(path, text, LUT1_COLUMNS)?
        .into_iter()
        .map(|row| {
            (
                [row.gain, row.offset, row.rise_gain, row.rise_offset],
                row.pixel_type,
            )
        })
        .collect();
    Ok(Lut1::from_raw_rows(&rows)?)
}

/// Loads the LUT2 cube from a raw little-endian `i16` file.
///
/// # Errors
/// Returns [`Error::CoreError`] with a shape error if the file does not
/// hold exactly `1024 * 256 * 500` values.
pub fn load_lut2<P: AsRef<Path>>(path: P) -> Result<Lut2Cube> {
    let reader = MappedFileReader::open(path)?;
    decode_lut2(reader.as_bytes())
}

/// Decodes a raw little-endian `i16` cube.
///
/// # Errors
/// Returns an error if the byte length is not `2 * 1024 * 256 * 500`.
pub fn decode_lut2(bytes: &[u8]) -> Result<Lut2Cube> {
    if bytes.len() != LUT2_LEN * 2 {
        return Err(isgri_core::Error::TableShape {
            table: "LUT2",
            expected: format!("{} bytes", LUT2_LEN * 2),
            found: format!("{} bytes", bytes.len()),
        }
        .into());
    }
    let data = bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect();
    Ok(Lut2Cube::from_vec(data)?)
}

/// Loads the law-2 gain and offset coefficient tables.
///
/// # Errors
/// Returns an error if either file is unreadable or malformed.
pub fn load_law2<P: AsRef<Path>, Q: AsRef<Path>>(gain: P, offset: Q) -> Result<Law2Coefficients> {
    let (gain, offset) = (gain.as_ref(), offset.as_ref());
    let gain_rows = parse_rows::<LAW2_GAIN_COLUMNS>(gain, &std::fs::read_to_string(gain)?)?;
    let offset_rows = parse_rows::<LAW2_OFFSET_COLUMNS>(offset, &std::fs::read_to_string(offset)?)?;
    Ok(Law2Coefficients::from_rows(gain_rows, offset_rows)?)
}

/// Parses a numeric CSV table with exactly `N` columns.
///
/// # Errors
/// Returns [`Error::Parse`] on a row with the wrong column count or a
/// non-numeric value.
pub fn parse_rows<const N: usize>(path: &Path, text: &str) -> Result<Vec<[f64; N]>> {
    read_rows::<Vec<f64>>(path, text, N)?
        .into_iter()
        .map(|row| {
            <[f64; N]>::try_from(row).map_err(|row| {
                Error::InvalidFormat(format!("expected {N} values, found {}", row.len()))
            })
        })
        .collect()
}

/// Checks that a path exists before a long load starts.
///
/// # Errors
/// Returns [`Error::InvalidFormat`] naming the missing input.
pub fn require_file(label: &str, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::InvalidFormat(format!("no {label} file given")));
    }
    if !path.is_file() {
        return Err(Error::InvalidFormat(format!(
            "{label} file not found: {}",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use isgri_core::pixel::{PixelIndex, N_PIXELS};
    use std::fmt::Write as _;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lut1_text(rows: usize) -> String {
        let mut text = String::from("# LUT1\ngain,offset,rise_gain,rise_offset,pixel_type\n");
        for i in 0..rows {
            writeln!(text, "5.0,1.0,{},0.0,{}", i % 7, i % 3).unwrap();
        }
        text
    }

    #[test]
    fn test_parse_lut1() {
        let lut = parse_lut1(Path::new("lut1.csv"), &lut1_text(N_PIXELS)).unwrap();
        let p = PixelIndex::from_linear(9).unwrap();
        assert_eq!(lut.coefficients(p)[0], 1.0);
        assert_eq!(lut.coefficients(p)[1], 2.0);
        assert_eq!(lut.pixel_type(p), 0);
    }

    #[test]
    fn test_lut1_row_count_is_enforced() {
        let err = parse_lut1(Path::new("lut1.csv"), &lut1_text(100)).unwrap_err();
        assert!(matches!(
            err,
            Error::CoreError(isgri_core::Error::TableShape { table: "LUT1", .. })
        ));
    }

    #[test]
    fn test_lut1_column_count_is_enforced() {
        let err = parse_lut1(Path::new("lut1.csv"), "1,2,3,4\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn test_lut2_length_is_enforced() {
        let err = decode_lut2(&[0u8; 1024]).unwrap_err();
        assert!(matches!(
            err,
            Error::CoreError(isgri_core::Error::TableShape { table: "LUT2", .. })
        ));
    }

    #[test]
    fn test_law2_files() {
        let mut gain = NamedTempFile::new().unwrap();
        let mut offset = NamedTempFile::new().unwrap();
        for class in 0..256 {
            writeln!(gain, "{},0.001", 2.0 + f64::from(class) * 0.001).unwrap();
            writeln!(offset, "-5.0,0.01,0.0").unwrap();
        }
        gain.flush().unwrap();
        offset.flush().unwrap();

        let law = load_law2(gain.path(), offset.path()).unwrap();
        assert_eq!(law.gain(0), [2.0, 0.001]);
        assert_eq!(law.offset(255), [-5.0, 0.01, 0.0]);
    }

    #[test]
    fn test_law2_shape_is_enforced() {
        let rows = parse_rows::<2>(Path::new("g.csv"), "1,2\n3,4\n").unwrap();
        assert_eq!(rows, vec![[1.0, 2.0], [3.0, 4.0]]);
        assert!(parse_rows::<3>(Path::new("o.csv"), "1,2\n").is_err());
        assert!(parse_rows::<2>(Path::new("g.csv"), "1,2\n3,4,5\n").is_err());
        assert!(Law2Coefficients::from_rows(vec![[0.0; 2]; 2], vec![[0.0; 3]; 256]).is_err());
    }

    #[test]
    fn test_quoted_table() {
        let text = "\"gain\",\"offset\"\n\"2.0\",\"0.5\"\n";
        let rows = parse_rows::<2>(Path::new("g.csv"), text).unwrap();
        assert_eq!(rows, vec![[2.0, 0.5]]);
    }

    #[test]
    fn test_require_file() {
        let file = NamedTempFile::new().unwrap();
        assert!(require_file("LUT1", file.path()).is_ok());
        assert!(require_file("LUT1", Path::new("")).is_err());
        assert!(require_file("LUT1", Path::new("/no/such/lut1.csv")).is_err());
    }
}
