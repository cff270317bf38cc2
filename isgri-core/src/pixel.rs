//! Detector geometry: pixel coordinates, linear pixel indices and MCE modules.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of pixels along each side of the detector plane.
pub const DETECTOR_SIDE: usize = 128;

/// Total number of pixels on the detector plane.
pub const N_PIXELS: usize = DETECTOR_SIDE * DETECTOR_SIDE;

/// Number of MCE modules (each with its own temperature and bias).
pub const N_MODULES: usize = 8;

/// Pixel coordinate on the detector (Y = row, Z = column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PixelCoord {
    /// Y coordinate (row).
    pub y: u8,
    /// Z coordinate (column).
    pub z: u8,
}

impl PixelCoord {
    /// Creates a new pixel coordinate.
    #[inline]
    #[must_use]
    pub fn new(y: u8, z: u8) -> Self {
        Self { y, z }
    }

    /// Returns true if both coordinates lie on the 128x128 plane.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        usize::from(self.y) < DETECTOR_SIDE && usize::from(self.z) < DETECTOR_SIDE
    }

    /// Converts to a linear pixel index.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCoordinate`] if the coordinate is off the plane.
    #[inline]
    pub fn index(&self) -> Result<PixelIndex> {
        PixelIndex::from_coord(*self)
    }
}

/// Linear pixel index in `[0, 16384)`, `128 * y + z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PixelIndex(u16);

impl PixelIndex {
    /// Builds the index of a coordinate.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCoordinate`] if the coordinate is off the plane.
    #[inline]
    pub fn from_coord(coord: PixelCoord) -> Result<Self> {
        if !coord.is_valid() {
            return Err(Error::InvalidCoordinate {
                y: coord.y,
                z: coord.z,
            });
        }
        #[allow(clippy::cast_possible_truncation)]
        let index = (usize::from(coord.y) * DETECTOR_SIDE + usize::from(coord.z)) as u16;
        Ok(Self(index))
    }

    /// Builds an index from its linear value, if in range.
    #[inline]
    #[must_use]
    pub fn from_linear(index: usize) -> Option<Self> {
        u16::try_from(index)
            .ok()
            .filter(|&i| usize::from(i) < N_PIXELS)
            .map(Self)
    }

    /// Returns the linear index as `usize`.
    #[inline]
    #[must_use]
    pub fn as_usize(self) -> usize {
        usize::from(self.0)
    }

    /// Row on the detector plane (Y).
    #[inline]
    #[must_use]
    pub fn row(self) -> usize {
        self.as_usize() / DETECTOR_SIDE
    }

    /// Column on the detector plane (Z).
    #[inline]
    #[must_use]
    pub fn column(self) -> usize {
        self.as_usize() % DETECTOR_SIDE
    }

    /// MCE module owning this pixel.
    #[inline]
    #[must_use]
    pub fn module(self) -> ModuleId {
        ModuleId::of(self.row(), self.column())
    }

    /// Iterates over every pixel of the plane in linear order.
    pub fn all() -> impl Iterator<Item = PixelIndex> {
        #[allow(clippy::cast_possible_truncation)]
        (0..N_PIXELS).map(|i| PixelIndex(i as u16))
    }
}

/// One of the 8 MCE modules.
///
/// The plane is split in two row bands (64 rows each) and four column
/// bands (32 columns each); module numbers decrease with column and
/// with row band: `module = 7 - col/32 - 4*(row/64)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModuleId(u8);

impl ModuleId {
    /// Module of the pixel at (`row`, `column`). Both must be below 128.
    #[inline]
    #[must_use]
    pub fn of(row: usize, column: usize) -> Self {
        debug_assert!(row < DETECTOR_SIDE && column < DETECTOR_SIDE);
        #[allow(clippy::cast_possible_truncation)]
        let module = (7 - column / 32 - 4 * (row / 64)) as u8;
        Self(module)
    }

    /// Builds a module id from its number, if in range.
    #[inline]
    #[must_use]
    pub fn new(module: usize) -> Option<Self> {
        u8::try_from(module)
            .ok()
            .filter(|&m| usize::from(m) < N_MODULES)
            .map(Self)
    }

    /// Module number as `usize`, suitable for indexing per-module arrays.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_index_layout() {
        let idx = PixelCoord::new(3, 5).index().unwrap();
        assert_eq!(idx.as_usize(), 3 * 128 + 5);
        assert_eq!(idx.row(), 3);
        assert_eq!(idx.column(), 5);

        let last = PixelCoord::new(127, 127).index().unwrap();
        assert_eq!(last.as_usize(), N_PIXELS - 1);
    }

    #[test]
    fn test_invalid_coordinate() {
        assert!(PixelCoord::new(128, 0).index().is_err());
        assert!(PixelCoord::new(0, 200).index().is_err());
        assert!(PixelIndex::from_linear(N_PIXELS).is_none());
    }

    #[test]
    fn test_module_partition() {
        // Corners of the plane
        assert_eq!(ModuleId::of(0, 0).index(), 7);
        assert_eq!(ModuleId::of(0, 127).index(), 4);
        assert_eq!(ModuleId::of(127, 0).index(), 3);
        assert_eq!(ModuleId::of(127, 127).index(), 0);

        // Band edges
        assert_eq!(ModuleId::of(63, 31).index(), 7);
        assert_eq!(ModuleId::of(63, 32).index(), 6);
        assert_eq!(ModuleId::of(64, 31).index(), 3);
    }

    #[test]
    fn test_every_module_owns_a_quarter_band() {
        let mut counts = [0usize; N_MODULES];
        for pixel in PixelIndex::all() {
            counts[pixel.module().index()] += 1;
        }
        assert!(counts.iter().all(|&c| c == N_PIXELS / N_MODULES));
    }
}
