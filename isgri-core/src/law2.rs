//! Revolution-dependent gain/offset laws for the second drift regime
//! (`ISGR-MCE-MOD` supplementary coefficients).

use crate::error::{Error, Result};
use crate::lut2::LUT2_RISE_TIME_CLASSES;

/// Gain law columns: `g = c0 + c1 * revolution`.
pub const LAW2_GAIN_COLUMNS: usize = 2;

/// Offset law columns: `o = c0 + c1 * revolution + c2 * revolution^2`.
pub const LAW2_OFFSET_COLUMNS: usize = 3;

/// Per-rise-time-class polynomial coefficients of the second law.
#[derive(Debug, Clone, PartialEq)]
pub struct Law2Coefficients {
    gain: Vec<[f64; LAW2_GAIN_COLUMNS]>,
    offset: Vec<[f64; LAW2_OFFSET_COLUMNS]>,
}

impl Law2Coefficients {
    /// Builds the coefficients from column vectors, each indexed by
    /// rise-time class.
    ///
    /// # Errors
    /// Returns [`Error::TableShape`] unless there are exactly 2 gain and
    /// 3 offset columns of 256 rows each.
    pub fn from_columns(gain: &[Vec<f64>], offset: &[Vec<f64>]) -> Result<Self> {
        check_columns("LAW2 gain", gain, LAW2_GAIN_COLUMNS)?;
        check_columns("LAW2 offset", offset, LAW2_OFFSET_COLUMNS)?;

        let gain = (0..LUT2_RISE_TIME_CLASSES)
            .map(|c| [gain[0][c], gain[1][c]])
            .collect();
        let offset = (0..LUT2_RISE_TIME_CLASSES)
            .map(|c| [offset[0][c], offset[1][c], offset[2][c]])
            .collect();
        Ok(Self { gain, offset })
    }

    /// Builds the coefficients from per-class rows.
    ///
    /// # Errors
    /// Returns [`Error::TableShape`] unless both tables have 256 rows.
    pub fn from_rows(
        gain: Vec<[f64; LAW2_GAIN_COLUMNS]>,
        offset: Vec<[f64; LAW2_OFFSET_COLUMNS]>,
    ) -> Result<Self> {
        for (table, rows) in [("LAW2 gain", gain.len()), ("LAW2 offset", offset.len())] {
            if rows != LUT2_RISE_TIME_CLASSES {
                return Err(Error::shape(
                    table,
                    format!("{LUT2_RISE_TIME_CLASSES} rows"),
                    format!("{rows} rows"),
                ));
            }
        }
        Ok(Self { gain, offset })
    }

    /// Gain coefficients of one rise-time class.
    #[must_use]
    pub fn gain(&self, class: usize) -> [f64; LAW2_GAIN_COLUMNS] {
        self.gain[class]
    }

    /// Offset coefficients of one rise-time class.
    #[must_use]
    pub fn offset(&self, class: usize) -> [f64; LAW2_OFFSET_COLUMNS] {
        self.offset[class]
    }

    /// Evaluates both polynomials at `revolution` for all 256 classes.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn evaluate(&self, revolution: i64) -> Law2Laws {
        let r = revolution as f64;
        Law2Laws {
            gain: self.gain.iter().map(|[c0, c1]| c0 + c1 * r).collect(),
            offset: self
                .offset
                .iter()
                .map(|[c0, c1, c2]| c0 + c1 * r + c2 * r * r)
                .collect(),
        }
    }
}

/// Second-law gain and offset per rise-time class, at a fixed revolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Law2Laws {
    /// `gain2[class]`.
    pub gain: Vec<f64>,
    /// `offset2[class]`.
    pub offset: Vec<f64>,
}

fn check_columns(table: &'static str, columns: &[Vec<f64>], expected: usize) -> Result<()> {
    if columns.len() != expected {
        return Err(Error::shape(
            table,
            format!("{expected} columns"),
            format!("{} columns", columns.len()),
        ));
    }
    for (i, column) in columns.iter().enumerate() {
        if column.len() != LUT2_RISE_TIME_CLASSES {
            return Err(Error::shape(
                table,
                format!("{LUT2_RISE_TIME_CLASSES} rows"),
                format!("{} rows in column {i}", column.len()),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn columns(values: &[f64]) -> Vec<Vec<f64>> {
        values
            .iter()
            .map(|v| vec![*v; LUT2_RISE_TIME_CLASSES])
            .collect()
    }

    #[test]
    fn test_evaluate_polynomials() {
        let law = Law2Coefficients::from_columns(&columns(&[2.0, 0.001]), &columns(&[-5.0, 0.01, 1e-5]))
            .unwrap();
        let laws = law.evaluate(1000);
        assert_eq!(laws.gain.len(), 256);
        assert_relative_eq!(laws.gain[35], 3.0);
        assert_relative_eq!(laws.offset[35], -5.0 + 10.0 + 10.0);
    }

    #[test]
    fn test_column_counts_are_checked() {
        let err = Law2Coefficients::from_columns(&columns(&[1.0, 2.0, 3.0]), &columns(&[0.0, 0.0, 0.0]))
            .unwrap_err();
        assert!(matches!(err, Error::TableShape { table: "LAW2 gain", .. }));

        let err = Law2Coefficients::from_columns(&columns(&[1.0, 2.0]), &columns(&[0.0, 0.0]))
            .unwrap_err();
        assert!(matches!(err, Error::TableShape { table: "LAW2 offset", .. }));
    }

    #[test]
    fn test_row_counts_are_checked() {
        let short = vec![vec![0.0; 100], vec![0.0; 100]];
        assert!(Law2Coefficients::from_columns(&short, &columns(&[0.0, 0.0, 0.0])).is_err());
        assert!(Law2Coefficients::from_rows(vec![[0.0; 2]; 255], vec![[0.0; 3]; 256]).is_err());
    }

    #[test]
    fn test_rows_and_columns_agree() {
        let from_rows = Law2Coefficients::from_rows(vec![[1.5, 0.5]; 256], vec![[1.0, 2.0, 3.0]; 256])
            .unwrap();
        let from_columns =
            Law2Coefficients::from_columns(&columns(&[1.5, 0.5]), &columns(&[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(from_rows, from_columns);
    }
}
