//! Dual-law pulse-height drift correction.
//!
//! Below a per-rise-time-class crossover channel the pulse height follows
//! law 1 (revolution-dependent, no rise-time dependence); above it, law 2
//! (rise-time class and revolution dependent). The crossover table is
//! computed once per run.

use isgri_core::law2::Law2Coefficients;
use isgri_core::lut2::LUT2_RISE_TIME_CLASSES;
use isgri_core::rounding::{clamp_index, round_half_up, Clamp};

/// Law-1 gain at revolution 0.
pub const LAW1_GAIN_BASE: f64 = 2.047;
/// Law-1 gain drift per revolution.
pub const LAW1_GAIN_DRIFT: f64 = -0.00061;
/// Law-1 offset (fixed).
pub const LAW1_OFFSET: f64 = -5.655;
/// Final channel scale at revolution 0.
pub const CHANNEL_SCALE_BASE: f64 = 1.0184;
/// Final channel scale drift per revolution.
pub const CHANNEL_SCALE_DRIFT: f64 = 0.000_008_9;
/// Final channel offset (fixed).
pub const CHANNEL_OFFSET: f64 = -1.997;

/// Rise time after the LUT1 rescale: `(2 * raw / 2.4 + 5) * gt + ot`.
#[inline]
#[must_use]
pub fn rescale_rise_time(raw: u8, rise_gain: f64, rise_offset: f64) -> f64 {
    let rt = 2.0 * f64::from(raw) / 2.4 + 5.0;
    rt * rise_gain + rise_offset
}

/// Rise-time class of a rescaled rise time: round half up, clamp to `[0, 255]`.
#[inline]
#[must_use]
pub fn rise_time_class(rise_time: f64) -> (usize, Clamp) {
    clamp_index(round_half_up(rise_time), LUT2_RISE_TIME_CLASSES - 1)
}

/// Pulse height after the LUT1 rescale: `raw * gh + oh`.
#[inline]
#[must_use]
pub fn rescale_pulse_height(raw: u16, gain: f64, offset: f64) -> f64 {
    f64::from(raw) * gain + offset
}

/// Which law corrected an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Law {
    /// Below the crossover channel.
    First,
    /// At or above the crossover channel.
    Second,
}

/// A drift-corrected pulse height, in LUT2 channel units (x2).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CorrectedPulse {
    /// Corrected, rescaled channel.
    pub channel: f64,
    /// Law applied, `None` when drift correction was off.
    pub law: Option<Law>,
}

/// Law 1, law 2 and the crossover table for one revolution.
#[derive(Clone, Debug, PartialEq)]
pub struct DualLawModel {
    revolution: i64,
    gain1: f64,
    offset1: f64,
    gain2: Vec<f64>,
    offset2: Vec<f64>,
    crossover: Vec<f64>,
    channel_scale: f64,
    channel_offset: f64,
}

impl DualLawModel {
    /// Evaluates both laws and the crossover table at `revolution`.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    pub fn new(law2: &Law2Coefficients, revolution: i64) -> Self {
        let r = revolution as f64;
        let gain1 = LAW1_GAIN_BASE + LAW1_GAIN_DRIFT * r;
        let offset1 = LAW1_OFFSET;
        let laws = law2.evaluate(revolution);

        let crossover = laws
            .gain
            .iter()
            .zip(&laws.offset)
            .map(|(&gain2, &offset2)| {
                if gain1 == gain2 {
                    0.0
                } else {
                    let equal_energy = (offset2 - offset1) / (gain1 - gain2);
                    equal_energy * gain1 + offset1
                }
            })
            .collect();

        Self {
            revolution,
            gain1,
            offset1,
            gain2: laws.gain,
            offset2: laws.offset,
            crossover,
            channel_scale: CHANNEL_SCALE_BASE + CHANNEL_SCALE_DRIFT * r,
            channel_offset: CHANNEL_OFFSET,
        }
    }

    /// Revolution the laws were evaluated at.
    #[must_use]
    pub fn revolution(&self) -> i64 {
        self.revolution
    }

    /// Law-1 gain.
    #[must_use]
    pub fn gain1(&self) -> f64 {
        self.gain1
    }

    /// Law-1 offset.
    #[must_use]
    pub fn offset1(&self) -> f64 {
        self.offset1
    }

    /// Law-2 gain of a rise-time class.
    #[must_use]
    pub fn gain2(&self, class: usize) -> f64 {
        self.gain2[class]
    }

    /// Law-2 offset of a rise-time class.
    #[must_use]
    pub fn offset2(&self, class: usize) -> f64 {
        self.offset2[class]
    }

    /// Pulse-height channel where the two laws meet; 0 when the gains are equal.
    #[must_use]
    pub fn crossover_channel(&self, class: usize) -> f64 {
        self.crossover[class]
    }

    /// Energy at which the two laws give the same result (keV).
    #[must_use]
    pub fn crossover_energy_kev(&self, class: usize) -> f64 {
        (self.crossover[class] - self.offset1) / self.gain1
    }

    /// Final channel scale `g_scale`.
    #[must_use]
    pub fn channel_scale(&self) -> f64 {
        self.channel_scale
    }

    /// Final channel offset `off_scale`.
    #[must_use]
    pub fn channel_offset(&self) -> f64 {
        self.channel_offset
    }

    /// Corrects a LUT1-rescaled pulse height.
    ///
    /// `law_draw` is the law-selection draw in `[0, 1)`. With `Some`, the
    /// dithered pulse height goes through law 1 or law 2 and is rescaled as
    /// `2 * (pha - off_scale) / g_scale`. With `None` (drift correction off)
    /// only `(pha - off_scale) / g_scale` is applied.
    #[inline]
    #[must_use]
    pub fn correct(&self, pulse_height: f64, class: usize, law_draw: Option<f64>) -> CorrectedPulse {
        match law_draw {
            Some(draw) => {
                let dither = draw - 0.5;
                let (pha, law) = if pulse_height < self.crossover[class] {
                    ((pulse_height + dither - self.offset1) / self.gain1, Law::First)
                } else {
                    (
                        (pulse_height + dither - self.offset2[class]) / self.gain2[class],
                        Law::Second,
                    )
                };
                CorrectedPulse {
                    channel: 2.0 * (pha - self.channel_offset) / self.channel_scale,
                    law: Some(law),
                }
            }
            None => CorrectedPulse {
                channel: (pulse_height - self.channel_offset) / self.channel_scale,
                law: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use approx::assert_relative_eq;

    fn law2(gain: [f64; 2], offset: [f64; 3]) -> Law2Coefficients {
        Law2Coefficients::from_rows(vec![gain; 256], vec![offset; 256]).unwrap()
    }

    #[test]
    fn test_law1_parameters() {
        let model = DualLawModel::new(&law2([2.0, 0.0], [-5.0, 0.0, 0.0]), 1000);
        assert_relative_eq!(model.gain1(), 2.047 - 0.61, epsilon = 1e-12);
        assert_eq!(model.offset1(), -5.655);
        assert_relative_eq!(model.channel_scale(), 1.0184 + 0.0089, epsilon = 1e-12);
        assert_eq!(model.channel_offset(), -1.997);
        assert_eq!(model.revolution(), 1000);
    }

    #[test]
    fn test_crossover_is_zero_for_equal_gains() {
        // gain2 == gain1 at revolution 0.
        let model = DualLawModel::new(&law2([2.047, 0.0], [3.0, 0.0, 0.0]), 0);
        for class in 0..256 {
            assert_eq!(model.crossover_channel(class), 0.0);
        }
    }

    #[test]
    fn test_crossover_is_where_laws_agree() {
        let model = DualLawModel::new(&law2([2.1, 0.0], [-8.0, 0.0, 0.0]), 0);
        let chc = model.crossover_channel(35);
        let e1 = (chc - model.offset1()) / model.gain1();
        let e2 = (chc - model.offset2(35)) / model.gain2(35);
        assert_relative_eq!(e1, e2, epsilon = 1e-9);
        assert_relative_eq!(model.crossover_energy_kev(35), e1, epsilon = 1e-12);
    }

    #[test]
    fn test_law_selection() {
        let model = DualLawModel::new(&law2([2.1, 0.0], [-8.0, 0.0, 0.0]), 0);
        let chc = model.crossover_channel(10);

        let below = model.correct(chc - 10.0, 10, Some(0.5));
        assert_eq!(below.law, Some(Law::First));
        let pha = (chc - 10.0 + 5.655) / 2.047;
        assert_relative_eq!(below.channel, 2.0 * (pha + 1.997) / 1.0184);

        let above = model.correct(chc + 10.0, 10, Some(0.5));
        assert_eq!(above.law, Some(Law::Second));
        let pha = (chc + 10.0 + 8.0) / 2.1;
        assert_relative_eq!(above.channel, 2.0 * (pha + 1.997) / 1.0184);
    }

    #[test]
    fn test_dither_shifts_pulse_height() {
        let model = DualLawModel::new(&law2([2.1, 0.0], [-8.0, 0.0, 0.0]), 0);
        let low = model.correct(500.0, 0, Some(0.0)).channel;
        let high = model.correct(500.0, 0, Some(0.999)).channel;
        assert!(high > low);
    }

    #[test]
    fn test_no_drift_correction() {
        let model = DualLawModel::new(&law2([2.1, 0.0], [-8.0, 0.0, 0.0]), 0);
        let out = model.correct(1000.0, 0, None);
        assert_eq!(out.law, None);
        assert_relative_eq!(out.channel, (1000.0 + 1.997) / 1.0184);
    }

    #[test]
    fn test_rise_time_quantization() {
        assert_relative_eq!(rescale_rise_time(128, 1.0, 0.0), 2.0 * 128.0 / 2.4 + 5.0);
        assert_eq!(rise_time_class(10.5), (11, Clamp::InRange));
        assert_eq!(rise_time_class(10.4999), (10, Clamp::InRange));
        assert_eq!(rise_time_class(-5.0), (0, Clamp::Low));
        assert_eq!(rise_time_class(300.0), (255, Clamp::High));
    }

    #[test]
    fn test_pulse_height_rescale() {
        assert_eq!(rescale_pulse_height(1000, 2.0, -3.0), 1997.0);
    }
}
