//! Temperature and bias scaling of the LUT1 coefficients.
//!
//! Each MCE module has one mean temperature and one mean bias for the run.
//! Every pixel's four base coefficients are scaled by powers of the
//! module's reduced temperature and bias.

use isgri_core::lut1::Lut1;
use isgri_core::pixel::{PixelIndex, N_MODULES, N_PIXELS};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Module temperature used when no telemetry is available (degC).
pub const DEFAULT_TEMPERATURE_C: f64 = -8.0;

/// Module bias used when no telemetry is available (V).
pub const DEFAULT_BIAS_V: f64 = -120.0;

/// Reduced bias used by the scaling laws for every module.
///
/// The telemetry bias is read and averaged but the laws run with this
/// fixed value; the downstream calibration was tuned against it.
pub const PINNED_REDUCED_BIAS: f64 = 1.2;

/// Temperature exponent of the pulse-height offset, per module.
pub const OFFSET_TEMPERATURE_SLOPE: [f64; N_MODULES] = [-1.8, -2.0, -2.3, -2.7, -0.5, -2.4, -0.8, -0.5];

const GAIN_EXPONENTS: (f64, f64) = (-1.11, -0.0832);
const OFFSET_BIAS_EXPONENT: f64 = 0.0288;
const RISE_GAIN_EXPONENTS: (f64, f64) = (0.518, 0.583);
const RISE_OFFSET_EXPONENTS: (f64, f64) = (0.625, 0.530);

/// Mean temperature and bias of the 8 modules for one run.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModuleConditions {
    /// Mean temperature per module (degC).
    pub temperatures_c: [f64; N_MODULES],
    /// Mean bias per module (V).
    pub biases_v: [f64; N_MODULES],
}

impl Default for ModuleConditions {
    fn default() -> Self {
        Self {
            temperatures_c: [DEFAULT_TEMPERATURE_C; N_MODULES],
            biases_v: [DEFAULT_BIAS_V; N_MODULES],
        }
    }
}

impl ModuleConditions {
    /// Conditions from explicit per-module values.
    #[must_use]
    pub fn new(temperatures_c: [f64; N_MODULES], biases_v: [f64; N_MODULES]) -> Self {
        Self {
            temperatures_c,
            biases_v,
        }
    }

    /// Sets every module to the same temperature.
    #[must_use]
    pub fn with_uniform_temperature(mut self, temperature_c: f64) -> Self {
        self.temperatures_c = [temperature_c; N_MODULES];
        self
    }

    /// Sets every module to the same bias.
    #[must_use]
    pub fn with_uniform_bias(mut self, bias_v: f64) -> Self {
        self.biases_v = [bias_v; N_MODULES];
        self
    }

    /// Temperature as a ratio to 273 K: `(T + 273) / 273`.
    #[must_use]
    pub fn reduced_temperature(&self, module: usize) -> f64 {
        (self.temperatures_c[module] + 273.0) / 273.0
    }

    /// Bias as entered into the scaling laws. Always [`PINNED_REDUCED_BIAS`].
    #[must_use]
    pub fn reduced_bias(&self, _module: usize) -> f64 {
        PINNED_REDUCED_BIAS
    }
}

/// Effective (temperature/bias adjusted) coefficients for every pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelCoefficients {
    /// Pulse-height gain `gh`.
    pub gain: Vec<f64>,
    /// Pulse-height offset `oh`.
    pub offset: Vec<f64>,
    /// Rise-time gain `gt`.
    pub rise_gain: Vec<f64>,
    /// Rise-time offset `ot`.
    pub rise_offset: Vec<f64>,
}

impl PixelCoefficients {
    /// Coefficients `[gh, oh, gt, ot]` of one pixel.
    #[inline]
    #[must_use]
    pub fn get(&self, pixel: PixelIndex) -> [f64; 4] {
        let p = pixel.as_usize();
        [
            self.gain[p],
            self.offset[p],
            self.rise_gain[p],
            self.rise_offset[p],
        ]
    }
}

/// Scales LUT1 by the module conditions.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemperatureBiasModel {
    conditions: ModuleConditions,
}

impl TemperatureBiasModel {
    /// Creates the model for one run's module conditions.
    #[must_use]
    pub fn new(conditions: ModuleConditions) -> Self {
        Self { conditions }
    }

    /// Conditions the model was built with.
    #[must_use]
    pub fn conditions(&self) -> &ModuleConditions {
        &self.conditions
    }

    /// Per-module scale factors `[gh, oh, gt, ot]`.
    #[must_use]
    pub fn module_factors(&self, module: usize) -> [f64; 4] {
        let t = self.conditions.reduced_temperature(module);
        let b = self.conditions.reduced_bias(module);
        [
            t.powf(GAIN_EXPONENTS.0) * b.powf(GAIN_EXPONENTS.1),
            t.powf(OFFSET_TEMPERATURE_SLOPE[module]) * b.powf(OFFSET_BIAS_EXPONENT),
            t.powf(RISE_GAIN_EXPONENTS.0) * b.powf(RISE_GAIN_EXPONENTS.1),
            t.powf(RISE_OFFSET_EXPONENTS.0) * b.powf(RISE_OFFSET_EXPONENTS.1),
        ]
    }

    /// Computes the effective coefficients of all 16384 pixels.
    #[must_use]
    pub fn apply(&self, lut1: &Lut1) -> PixelCoefficients {
        let factors: [[f64; 4]; N_MODULES] = std::array::from_fn(|m| self.module_factors(m));

        let mut out = PixelCoefficients {
            gain: Vec::with_capacity(N_PIXELS),
            offset: Vec::with_capacity(N_PIXELS),
            rise_gain: Vec::with_capacity(N_PIXELS),
            rise_offset: Vec::with_capacity(N_PIXELS),
        };
        for pixel in PixelIndex::all() {
            let [gh, oh, gt, ot] = lut1.coefficients(pixel);
            let [fgh, foh, fgt, fot] = factors[pixel.module().index()];
            out.gain.push(gh * fgh);
            out.offset.push(oh * foh);
            out.rise_gain.push(gt * fgt);
            out.rise_offset.push(ot * fot);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use approx::assert_relative_eq;
    use isgri_core::pixel::PixelCoord;

    fn unit_lut1() -> Lut1 {
        // Raw values chosen so the converted coefficients are all 1.0.
        Lut1::from_raw_columns(
            [
                vec![5.0; N_PIXELS],
                vec![0.5; N_PIXELS],
                vec![100.0 / 30.0; N_PIXELS],
                vec![-1.95; N_PIXELS],
            ],
            vec![0; N_PIXELS],
        )
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let c = ModuleConditions::default();
        assert!(c.temperatures_c.iter().all(|&t| t == -8.0));
        assert!(c.biases_v.iter().all(|&b| b == -120.0));
    }

    #[test]
    fn test_bias_is_pinned() {
        let c = ModuleConditions::default().with_uniform_bias(-80.0);
        for m in 0..N_MODULES {
            assert_eq!(c.reduced_bias(m), 1.2);
        }
    }

    #[test]
    fn test_module_factors_at_default_conditions() {
        let model = TemperatureBiasModel::new(ModuleConditions::default());
        let t: f64 = 265.0 / 273.0;
        let b: f64 = 1.2;
        let f = model.module_factors(7);
        assert_relative_eq!(f[0], t.powf(-1.11) * b.powf(-0.0832));
        assert_relative_eq!(f[1], t.powf(-0.5) * b.powf(0.0288));
        assert_relative_eq!(f[2], t.powf(0.518) * b.powf(0.583));
        assert_relative_eq!(f[3], t.powf(0.625) * b.powf(0.530));
    }

    #[test]
    fn test_pixels_follow_their_module() {
        let mut temps = [-8.0; N_MODULES];
        temps[7] = 0.0;
        temps[0] = 20.0;
        let model = TemperatureBiasModel::new(ModuleConditions::new(temps, [-120.0; N_MODULES]));
        let coefficients = model.apply(&unit_lut1());

        // At 0 degC the reduced temperature is exactly 1.
        let p7 = PixelCoord::new(0, 0).index().unwrap();
        let [gh, oh, gt, ot] = coefficients.get(p7);
        assert_relative_eq!(gh, 1.2f64.powf(-0.0832), epsilon = 1e-12);
        assert_relative_eq!(oh, 1.2f64.powf(0.0288), epsilon = 1e-12);
        assert_relative_eq!(gt, 1.2f64.powf(0.583), epsilon = 1e-12);
        assert_relative_eq!(ot, 1.2f64.powf(0.530), epsilon = 1e-12);

        let p0 = PixelCoord::new(127, 127).index().unwrap();
        let expected = model.module_factors(0);
        let got = coefficients.get(p0);
        for k in 0..4 {
            assert_relative_eq!(got[k], expected[k], epsilon = 1e-12);
        }
    }
}
