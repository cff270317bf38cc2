//! Per-pixel gain/offset table (LUT1, `ISGR-OFFS-MOD`).

use crate::error::{Error, Result};
use crate::pixel::{PixelIndex, N_PIXELS};

/// Number of columns in the LUT1 source table (4 coefficients + pixel type).
pub const LUT1_COLUMNS: usize = 5;

/// Number of coefficient columns in LUT1.
pub const LUT1_COEFFICIENTS: usize = LUT1_COLUMNS - 1;

/// Base per-pixel coefficients, already converted from the table units.
///
/// The conversions are applied once at load time, with the historical
/// operation order so results match the reference bit for bit:
///
/// | column | coefficient | conversion       |
/// |--------|-------------|------------------|
/// | 0      | `gh`        | `c / 10 * 2`     |
/// | 1      | `oh`        | `c * 2`          |
/// | 2      | `gt`        | `c / 100 * 30`   |
/// | 3      | `ot`        | `(c + 2) * 20`   |
#[derive(Debug, Clone, PartialEq)]
pub struct Lut1 {
    gain: Vec<f64>,
    offset: Vec<f64>,
    rise_gain: Vec<f64>,
    rise_offset: Vec<f64>,
    pixel_type: Vec<i32>,
}

impl Lut1 {
    /// Builds the table from the four raw coefficient columns and the
    /// pixel-type column, applying the unit conversions.
    ///
    /// # Errors
    /// Returns [`Error::TableShape`] if any column does not have exactly
    /// 16384 rows.
    pub fn from_raw_columns(columns: [Vec<f64>; LUT1_COEFFICIENTS], pixel_type: Vec<i32>) -> Result<Self> {
        for (i, column) in columns.iter().enumerate() {
            check_rows(i, column.len())?;
        }
        check_rows(LUT1_COEFFICIENTS, pixel_type.len())?;

        let [mut gain, mut offset, mut rise_gain, mut rise_offset] = columns;
        for g in &mut gain {
            *g = *g / 10.0 * 2.0;
        }
        for o in &mut offset {
            *o *= 2.0;
        }
        for g in &mut rise_gain {
            *g = *g / 100.0 * 30.0;
        }
        for o in &mut rise_offset {
            *o = (*o + 2.0) * 20.0;
        }

        Ok(Self {
            gain,
            offset,
            rise_gain,
            rise_offset,
            pixel_type,
        })
    }

    /// Builds the table from row records `[c0, c1, c2, c3]` plus pixel type.
    ///
    /// # Errors
    /// Returns [`Error::TableShape`] if there are not exactly 16384 rows.
    pub fn from_raw_rows(rows: &[([f64; LUT1_COEFFICIENTS], i32)]) -> Result<Self> {
        let mut columns: [Vec<f64>; LUT1_COEFFICIENTS] =
            std::array::from_fn(|_| Vec::with_capacity(rows.len()));
        let mut pixel_type = Vec::with_capacity(rows.len());
        for (coefficients, kind) in rows {
            for (column, value) in columns.iter_mut().zip(coefficients) {
                column.push(*value);
            }
            pixel_type.push(*kind);
        }
        Self::from_raw_columns(columns, pixel_type)
    }

    /// Converted pulse-height gain column (`gh`).
    #[must_use]
    pub fn gain(&self) -> &[f64] {
        &self.gain
    }

    /// Converted pulse-height offset column (`oh`).
    #[must_use]
    pub fn offset(&self) -> &[f64] {
        &self.offset
    }

    /// Converted rise-time gain column (`gt`).
    #[must_use]
    pub fn rise_gain(&self) -> &[f64] {
        &self.rise_gain
    }

    /// Converted rise-time offset column (`ot`).
    #[must_use]
    pub fn rise_offset(&self) -> &[f64] {
        &self.rise_offset
    }

    /// Pixel-type tag. Carried through, not used by the laws.
    #[must_use]
    pub fn pixel_type(&self, pixel: PixelIndex) -> i32 {
        self.pixel_type[pixel.as_usize()]
    }

    /// Converted coefficients `[gh, oh, gt, ot]` of one pixel.
    #[must_use]
    pub fn coefficients(&self, pixel: PixelIndex) -> [f64; LUT1_COEFFICIENTS] {
        let p = pixel.as_usize();
        [
            self.gain[p],
            self.offset[p],
            self.rise_gain[p],
            self.rise_offset[p],
        ]
    }
}

fn check_rows(column: usize, rows: usize) -> Result<()> {
    if rows == N_PIXELS {
        Ok(())
    } else {
        Err(Error::shape(
            "LUT1",
            format!("{N_PIXELS} rows"),
            format!("{rows} rows in column {column}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    fn uniform(values: [f64; 4]) -> Result<Lut1> {
        Lut1::from_raw_columns(values.map(|v| vec![v; N_PIXELS]), vec![1; N_PIXELS])
    }

    #[test]
    fn test_unit_conversions() {
        let lut = uniform([5.0, 1.5, 10.0, -1.0]).unwrap();
        let p = PixelIndex::from_linear(1234).unwrap();
        let [gh, oh, gt, ot] = lut.coefficients(p);
        assert_eq!(gh, 5.0 / 10.0 * 2.0);
        assert_eq!(oh, 3.0);
        assert_eq!(gt, 10.0 / 100.0 * 30.0);
        assert_eq!(ot, 20.0);
        assert_eq!(lut.pixel_type(p), 1);
    }

    #[test]
    fn test_wrong_row_count() {
        let mut columns: [Vec<f64>; 4] = std::array::from_fn(|_| vec![0.0; N_PIXELS]);
        columns[2].pop();
        let err = Lut1::from_raw_columns(columns, vec![0; N_PIXELS]).unwrap_err();
        assert!(matches!(err, Error::TableShape { table: "LUT1", .. }));
    }

    #[test]
    fn test_wrong_pixel_type_rows() {
        let columns: [Vec<f64>; 4] = std::array::from_fn(|_| vec![0.0; N_PIXELS]);
        assert!(Lut1::from_raw_columns(columns, vec![0; 10]).is_err());
    }

    #[test]
    fn test_from_rows_matches_columns() {
        let rows: Vec<([f64; 4], i32)> = (0..N_PIXELS)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let x = i as f64;
                ([x, x + 1.0, x + 2.0, x + 3.0], 0)
            })
            .collect();
        let lut = Lut1::from_raw_rows(&rows).unwrap();
        let p = PixelIndex::from_linear(10).unwrap();
        assert_eq!(lut.coefficients(p)[1], 22.0);
    }
}
