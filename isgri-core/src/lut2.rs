//! 3-D rise-time/energy response cube (LUT2, `ISGR-3DL2-MOD`).

use crate::error::{Error, Result};

/// Energy-channel axis length (scaled pulse height / 2).
pub const LUT2_ENERGY_CHANNELS: usize = 1024;

/// Rise-time class axis length.
pub const LUT2_RISE_TIME_CLASSES: usize = 256;

/// Decorrelation random-plane axis length.
pub const LUT2_RANDOM_PLANES: usize = 500;

/// Total number of cells in the cube.
pub const LUT2_LEN: usize = LUT2_ENERGY_CHANNELS * LUT2_RISE_TIME_CLASSES * LUT2_RANDOM_PLANES;

/// Stored values are `energy_kev * LUT2_SCALE`.
pub const LUT2_SCALE: f64 = 30.0;

/// The LUT2 cube, stored flat with the energy channel varying fastest.
///
/// Flat index: `channel + 1024 * class + 1024 * 256 * plane`.
#[derive(Clone, PartialEq, Eq)]
pub struct Lut2Cube {
    data: Vec<i16>,
}

impl Lut2Cube {
    /// Wraps a flat array of exactly `1024 * 256 * 500` values.
    ///
    /// # Errors
    /// Returns [`Error::TableShape`] if the length is wrong.
    pub fn from_vec(data: Vec<i16>) -> Result<Self> {
        if data.len() != LUT2_LEN {
            return Err(Error::shape(
                "LUT2",
                format!("{LUT2_LEN} values"),
                format!("{} values", data.len()),
            ));
        }
        Ok(Self { data })
    }

    /// Wraps a flat array after checking its declared axis lengths.
    ///
    /// # Errors
    /// Returns [`Error::TableShape`] if the axes are not `1024 x 256 x 500`
    /// or the data length does not match.
    pub fn from_dims(dims: &[usize], data: Vec<i16>) -> Result<Self> {
        let expected = [LUT2_ENERGY_CHANNELS, LUT2_RISE_TIME_CLASSES, LUT2_RANDOM_PLANES];
        if dims != expected {
            return Err(Error::shape(
                "LUT2",
                format!("{expected:?} axes"),
                format!("{dims:?} axes"),
            ));
        }
        Self::from_vec(data)
    }

    /// A cube of zeros.
    ///
    /// The allocation is zero-initialised, so pages that are never written
    /// are not committed. Fixtures fill only the planes they use.
    #[must_use]
    pub fn zeroed() -> Self {
        Self {
            data: vec![0; LUT2_LEN],
        }
    }

    /// Flat index of a cell. Arguments must be inside their axes.
    #[inline]
    #[must_use]
    pub fn flat_index(channel: usize, class: usize, plane: usize) -> usize {
        debug_assert!(channel < LUT2_ENERGY_CHANNELS);
        debug_assert!(class < LUT2_RISE_TIME_CLASSES);
        debug_assert!(plane < LUT2_RANDOM_PLANES);
        channel
            + LUT2_ENERGY_CHANNELS * class
            + LUT2_ENERGY_CHANNELS * LUT2_RISE_TIME_CLASSES * plane
    }

    /// Raw stored value of a cell.
    #[inline]
    #[must_use]
    pub fn get(&self, channel: usize, class: usize, plane: usize) -> i16 {
        self.data[Self::flat_index(channel, class, plane)]
    }

    /// Sets a cell. Only meaningful before the cube is shared with a run.
    #[inline]
    pub fn set(&mut self, channel: usize, class: usize, plane: usize, value: i16) {
        self.data[Self::flat_index(channel, class, plane)] = value;
    }

    /// Fills the energy row of one (`class`, `plane`) pair from a function of the channel.
    pub fn fill_row(&mut self, class: usize, plane: usize, mut f: impl FnMut(usize) -> i16) {
        let start = Self::flat_index(0, class, plane);
        for (channel, cell) in self.data[start..start + LUT2_ENERGY_CHANNELS]
            .iter_mut()
            .enumerate()
        {
            *cell = f(channel);
        }
    }

    /// Flat view of the cube.
    #[must_use]
    pub fn as_slice(&self) -> &[i16] {
        &self.data
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a validated cube.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::fmt::Debug for Lut2Cube {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lut2Cube")
            .field("channels", &LUT2_ENERGY_CHANNELS)
            .field("classes", &LUT2_RISE_TIME_CLASSES)
            .field("planes", &LUT2_RANDOM_PLANES)
            .finish()
    }
}
