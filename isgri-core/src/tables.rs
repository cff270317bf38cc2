//! The read-only calibration bundle shared by every event of a run.

use crate::law2::Law2Coefficients;
use crate::lut1::Lut1;
use crate::lut2::Lut2Cube;

/// LUT1, LUT2 and the law-2 coefficients, loaded and validated.
///
/// Shape checks happen in each table's constructor, so holding a
/// `CalibrationTables` means the shapes are right.
#[derive(Debug, Clone)]
pub struct CalibrationTables {
    /// Per-pixel gain/offset table.
    pub lut1: Lut1,
    /// 3-D rise-time/energy cube.
    pub lut2: Lut2Cube,
    /// Second-law polynomial coefficients.
    pub law2: Law2Coefficients,
}

impl CalibrationTables {
    /// Bundles already-validated tables.
    #[must_use]
    pub fn new(lut1: Lut1, lut2: Lut2Cube, law2: Law2Coefficients) -> Self {
        Self { lut1, lut2, law2 }
    }
}
