//! Immutable per-run calibration state.

use crate::dual_law::{rescale_pulse_height, rescale_rise_time, rise_time_class, DualLawModel};
use crate::interpolation::Lut2Interpolator;
use crate::temperature::{ModuleConditions, PixelCoefficients, TemperatureBiasModel};
use isgri_core::diagnostics::EventOutcome;
use isgri_core::pixel::PixelIndex;
use isgri_core::soa::CorrectedEvent;
use isgri_core::tables::CalibrationTables;
use log::debug;

/// Rise-time class whose law parameters are reported in the run log.
pub const REPORT_CLASS: usize = 35;

/// The two uniform draws an event consumes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EventDraws {
    /// Law-selection draw; `None` when gain-drift correction is off.
    pub law: Option<f64>,
    /// LUT2 random-plane draw.
    pub plane: f64,
}

/// Tables, effective pixel coefficients and laws for one run.
///
/// Built once, then shared read-only by every event.
#[derive(Debug)]
pub struct CalibrationContext<'t> {
    tables: &'t CalibrationTables,
    conditions: ModuleConditions,
    coefficients: PixelCoefficients,
    laws: DualLawModel,
}

impl<'t> CalibrationContext<'t> {
    /// Scales LUT1 by `conditions` and evaluates the laws at `revolution`.
    #[must_use]
    pub fn new(tables: &'t CalibrationTables, conditions: ModuleConditions, revolution: i64) -> Self {
        let coefficients = TemperatureBiasModel::new(conditions).apply(&tables.lut1);
        let laws = DualLawModel::new(&tables.law2, revolution);

        debug!(
            "GAIN1, OFFSET1 for PHA        : {:8.6}  {:8.4}",
            laws.gain1(),
            laws.offset1()
        );
        debug!(
            "GAIN2, OFFSET2 for PHA (RT={REPORT_CLASS}): {:8.6}  {:8.4}",
            laws.gain2(REPORT_CLASS),
            laws.offset2(REPORT_CLASS)
        );
        debug!(
            "Equal energy for laws  (RT={REPORT_CLASS}): {:5.2} keV",
            laws.crossover_energy_kev(REPORT_CLASS)
        );

        Self {
            tables,
            conditions,
            coefficients,
            laws,
        }
    }

    /// The calibration tables.
    #[must_use]
    pub fn tables(&self) -> &CalibrationTables {
        self.tables
    }

    /// Module conditions the coefficients were scaled with.
    #[must_use]
    pub fn conditions(&self) -> &ModuleConditions {
        &self.conditions
    }

    /// Effective per-pixel coefficients.
    #[must_use]
    pub fn coefficients(&self) -> &PixelCoefficients {
        &self.coefficients
    }

    /// Law 1 / law 2 model.
    #[must_use]
    pub fn laws(&self) -> &DualLawModel {
        &self.laws
    }

    /// Revolution the laws were evaluated at.
    #[must_use]
    pub fn revolution(&self) -> i64 {
        self.laws.revolution()
    }

    /// Interpolator over the shared LUT2 cube.
    #[must_use]
    pub fn interpolator(&self) -> Lut2Interpolator<'t> {
        Lut2Interpolator::new(&self.tables.lut2)
    }

    /// Corrects one event.
    ///
    /// Pure in its inputs: the same event and draws always give the same
    /// result.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn correct_event(
        &self,
        pixel: PixelIndex,
        pulse_height: u16,
        rise_time: u8,
        draws: EventDraws,
    ) -> (CorrectedEvent, EventOutcome) {
        let [gh, oh, gt, ot] = self.coefficients.get(pixel);

        let rt = rescale_rise_time(rise_time, gt, ot);
        let pha = rescale_pulse_height(pulse_height, gh, oh);
        let (class, rise_clamp) = rise_time_class(rt);

        let corrected = self.laws.correct(pha, class, draws.law);
        let lookup = self.interpolator().lookup(corrected.channel, class, draws.plane);

        let event = CorrectedEvent {
            rise_time_class: class as u8,
            energy: lookup.energy as f32,
            pha1: pha as u16,
            rt1: rt as u8,
            pha2: lookup.channel as u16,
        };
        let outcome = EventOutcome {
            rise_time_milli: (rt * 1000.0) as i64,
            rise_time: rise_clamp,
            amplitude: lookup.amplitude,
            forced_zero: lookup.forced_zero,
        };
        (event, outcome)
    }
}
