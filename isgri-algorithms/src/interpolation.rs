//! LUT2 lookup: corrected channel, rise-time class and random plane to energy.

use isgri_core::lut2::{
    Lut2Cube, LUT2_ENERGY_CHANNELS, LUT2_RANDOM_PLANES, LUT2_RISE_TIME_CLASSES, LUT2_SCALE,
};
use isgri_core::rounding::{clamp_index, round_half_up, Clamp};

/// Constant added to every looked-up energy (keV).
pub const FINAL_OFFSET_KEV: f64 = 0.0;

/// Corrected channels at or above this use the top LUT2 energy row.
pub const AMPLITUDE_LIMIT: i64 = 2 * LUT2_ENERGY_CHANNELS as i64;

/// Result of one LUT2 lookup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnergyLookup {
    /// Energy in keV, never negative.
    pub energy: f64,
    /// LUT2 energy channel used (`pha2`).
    pub channel: usize,
    /// Random plane used.
    pub plane: usize,
    /// Amplitude range of the corrected channel.
    pub amplitude: Clamp,
    /// The lookup resolved to zero or below and was forced to 0.0.
    pub forced_zero: bool,
}

/// Random plane of a draw in `[0, 1)`: `floor(500 * draw)`, clamped to `[0, 499]`.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn random_plane(draw: f64) -> usize {
    clamp_index((500.0 * draw) as i64, LUT2_RANDOM_PLANES - 1).0
}

/// Interpolates energies out of a shared LUT2 cube.
#[derive(Clone, Copy, Debug)]
pub struct Lut2Interpolator<'a> {
    cube: &'a Lut2Cube,
}

impl<'a> Lut2Interpolator<'a> {
    /// Wraps a loaded cube.
    #[must_use]
    pub fn new(cube: &'a Lut2Cube) -> Self {
        Self { cube }
    }

    /// Looks up the energy of a corrected channel.
    ///
    /// The channel is truncated toward zero to decide the amplitude range:
    /// - `[0, 2048)`: LUT2 channel is `pha / 2` rounded half up, and the
    ///   value is interpolated linearly toward the next channel using the
    ///   fractional offset of `pha / 2` from it (the last channel only
    ///   interpolates below its centre, toward channel 1022);
    /// - `>= 2048`: the top channel's value, no interpolation;
    /// - `< 0`: 0.0.
    ///
    /// Results at or below [`FINAL_OFFSET_KEV`] are forced to exactly 0.0.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn lookup(&self, corrected_channel: f64, class: usize, plane_draw: f64) -> EnergyLookup {
        debug_assert!(class < LUT2_RISE_TIME_CLASSES);
        let plane = random_plane(plane_draw);
        let data = self.cube.as_slice();
        let row = LUT2_ENERGY_CHANNELS * class;
        let plane_offset = LUT2_ENERGY_CHANNELS * LUT2_RISE_TIME_CLASSES * plane;

        let amplitude = corrected_channel as i64;
        let (energy, channel, range) = if amplitude < 0 {
            (0.0, 0, Clamp::Low)
        } else if amplitude >= AMPLITUDE_LIMIT {
            let channel = LUT2_ENERGY_CHANNELS - 1;
            let value = f64::from(data[channel + row + plane_offset]);
            (FINAL_OFFSET_KEV + value / LUT2_SCALE, channel, Clamp::High)
        } else {
            let half = corrected_channel / 2.0;
            let (channel, _) = clamp_index(round_half_up(half), LUT2_ENERGY_CHANNELS - 1);
            let index = channel + row + plane_offset;
            // Same summation order as the integer index, so the fraction
            // carries the rounding of the large plane offset.
            let index_real = half + row as f64 + plane_offset as f64;
            let fraction = index_real - index as f64;
            let base = f64::from(data[index]);
            // The top channel has no neighbour above it in the row; below
            // its centre it interpolates on the segment from channel 1022.
            let delta = if channel + 1 < LUT2_ENERGY_CHANNELS {
                fraction * (f64::from(data[index + 1]) - base)
            } else if fraction < 0.0 {
                fraction * (base - f64::from(data[index - 1]))
            } else {
                0.0
            };
            (
                FINAL_OFFSET_KEV + (base + delta) / LUT2_SCALE,
                channel,
                Clamp::InRange,
            )
        };

        let forced_zero = energy <= FINAL_OFFSET_KEV;
        EnergyLookup {
            energy: if forced_zero { 0.0 } else { energy },
            channel,
            plane,
            amplitude: range,
            forced_zero,
        }
    }
}
