//! Housekeeping averaging: turns raw temperature/bias telemetry samples into
//! the per-module conditions used by [`TemperatureBiasModel`].
//!
//! [`TemperatureBiasModel`]: crate::TemperatureBiasModel

use crate::temperature::{ModuleConditions, DEFAULT_BIAS_V, DEFAULT_TEMPERATURE_C};
use isgri_core::pixel::N_MODULES;
use log::{info, warn};

/// Temperature samples at or below this are read-out zeros (degC).
pub const MIN_VALID_TEMPERATURE_C: f64 = -50.5;

/// Bias samples at or above this are read-out zeros (V).
pub const MAX_VALID_BIAS_V: f64 = -60.0;

/// Largest accepted deviation of a module mean from the global mean (degC).
pub const MAX_TEMPERATURE_DEVIATION_C: f64 = 1.2;

/// Known offset of each module's temperature sensor from the global mean (degC).
pub const SENSOR_OFFSETS_C: [f64; N_MODULES] = [0.43, -0.39, -0.77, 0.84, -0.78, 1.09, -0.08, -0.31];

/// Raw telemetry samples, one series per module and quantity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HousekeepingSamples {
    /// Temperature samples per module (degC).
    pub temperatures: [Vec<f64>; N_MODULES],
    /// Bias samples per module (V).
    pub biases: [Vec<f64>; N_MODULES],
}

impl HousekeepingSamples {
    /// Empty sample set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one temperature sample. Out-of-range modules are ignored.
    pub fn push_temperature(&mut self, module: usize, value: f64) {
        if let Some(series) = self.temperatures.get_mut(module) {
            series.push(value);
        }
    }

    /// Adds one bias sample. Out-of-range modules are ignored.
    pub fn push_bias(&mut self, module: usize, value: f64) {
        if let Some(series) = self.biases.get_mut(module) {
            series.push(value);
        }
    }

    /// True if no sample of either kind was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.temperatures.iter().all(Vec::is_empty) && self.biases.iter().all(Vec::is_empty)
    }
}

/// Result of averaging one run's telemetry.
#[derive(Clone, Debug, PartialEq)]
pub struct HousekeepingSummary {
    /// Per-module means, defaults where no valid sample existed.
    pub conditions: ModuleConditions,
    /// Mean temperature over the accepted modules (degC).
    pub global_mean_temperature: f64,
    /// Modules whose mean temperature failed the sensor consistency check.
    pub rejected_modules: Vec<usize>,
    /// Modules with at least one valid temperature sample.
    pub valid_temperature_modules: usize,
    /// Modules with at least one valid bias sample.
    pub valid_bias_modules: usize,
}

/// Averages telemetry into module conditions.
///
/// Rejected temperature sensors are excluded from the global mean only;
/// their per-module value is kept in the returned conditions.
#[must_use]
pub fn average_housekeeping(samples: &HousekeepingSamples) -> HousekeepingSummary {
    let mut conditions = ModuleConditions::default();

    let mut temperature_counts = [0usize; N_MODULES];
    for (module, series) in samples.temperatures.iter().enumerate() {
        if let Some((mean, count)) = filtered_mean(series, |v| v > MIN_VALID_TEMPERATURE_C) {
            conditions.temperatures_c[module] = mean;
            temperature_counts[module] = count;
        } else {
            warn!("MCE{module} temperature has no valid data");
        }
    }
    let valid_temperature_modules = temperature_counts.iter().filter(|&&n| n > 0).count();

    let mut rejected_modules = Vec::new();
    let global_mean_temperature = if valid_temperature_modules == 0 {
        warn!("Using default ISGRI mean temperature: {DEFAULT_TEMPERATURE_C:+6.2} degC");
        DEFAULT_TEMPERATURE_C
    } else {
        let mean = mean_over(&conditions.temperatures_c, &temperature_counts);
        info!(
            "Mean temp. ({:05.1} values) on {valid_temperature_modules} MCEs: {mean:+6.2} degC",
            average_count(&temperature_counts)
        );

        let mut accepted = temperature_counts;
        for module in 0..N_MODULES {
            if accepted[module] == 0 {
                continue;
            }
            let deviation = conditions.temperatures_c[module] - mean - SENSOR_OFFSETS_C[module];
            if deviation.abs() > MAX_TEMPERATURE_DEVIATION_C {
                warn!(
                    "REJECTING mean temp. on MDU{module}: {:+6.2} degC",
                    conditions.temperatures_c[module]
                );
                accepted[module] = 0;
                rejected_modules.push(module);
            }
        }

        if rejected_modules.is_empty() {
            mean
        } else if rejected_modules.len() == valid_temperature_modules {
            warn!("NO new mean temp., keeping {mean:+6.2} degC");
            mean
        } else {
            let recomputed = mean_over(&conditions.temperatures_c, &accepted);
            info!(
                "NEW  mean  ({:05.1} values) on {} MCEs: {recomputed:+6.2} degC",
                average_count(&accepted),
                accepted.iter().filter(|&&n| n > 0).count()
            );
            recomputed
        }
    };

    let mut bias_counts = [0usize; N_MODULES];
    for (module, series) in samples.biases.iter().enumerate() {
        if let Some((mean, count)) = filtered_mean(series, |v| v < MAX_VALID_BIAS_V) {
            conditions.biases_v[module] = mean;
            bias_counts[module] = count;
        } else {
            warn!("MCE{module} bias has no valid data");
        }
    }
    let valid_bias_modules = bias_counts.iter().filter(|&&n| n > 0).count();
    if valid_bias_modules == 0 {
        warn!("Using default ISGRI mean bias: {DEFAULT_BIAS_V:+6.1} V");
    } else {
        info!(
            "Mean bias ({:05.1} values) on {valid_bias_modules} MCEs: {:+6.1} V",
            average_count(&bias_counts),
            mean_over(&conditions.biases_v, &bias_counts)
        );
    }

    HousekeepingSummary {
        conditions,
        global_mean_temperature,
        rejected_modules,
        valid_temperature_modules,
        valid_bias_modules,
    }
}

#[allow(clippy::cast_precision_loss)]
fn filtered_mean(series: &[f64], keep: impl Fn(f64) -> bool) -> Option<(f64, usize)> {
    let (sum, count) = series
        .iter()
        .copied()
        .filter(|&v| keep(v))
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| (sum / count as f64, count))
}

/// Unweighted mean of the module values whose count is non-zero.
#[allow(clippy::cast_precision_loss)]
fn mean_over(values: &[f64; N_MODULES], counts: &[usize; N_MODULES]) -> f64 {
    let (sum, modules) = values
        .iter()
        .zip(counts)
        .filter(|(_, &n)| n > 0)
        .fold((0.0, 0usize), |(s, m), (v, _)| (s + v, m + 1));
    sum / modules as f64
}

#[allow(clippy::cast_precision_loss)]
fn average_count(counts: &[usize; N_MODULES]) -> f64 {
    let modules = counts.iter().filter(|&&n| n > 0).count();
    counts.iter().sum::<usize>() as f64 / modules as f64
}
