//! isgri-algorithms: Energy correction engine for ISGRI events.
//!
//! This crate provides the stages of the correction:
//! - **Temperature/bias model** - per-module scaling of the LUT1 coefficients
//! - **Housekeeping averaging** - telemetry samples to module conditions
//! - **Dual-law model** - gain-drift correction with a per-class crossover
//! - **LUT2 interpolation** - corrected channel to energy
//! - **Pipeline** - sequential or parallel batch transform
#![warn(missing_docs)]

mod context;
mod dual_law;
mod housekeeping;
mod interpolation;
mod pipeline;
mod temperature;

pub use context::{CalibrationContext, EventDraws, REPORT_CLASS};
pub use dual_law::{
    rescale_pulse_height, rescale_rise_time, rise_time_class, CorrectedPulse, DualLawModel, Law,
};
pub use housekeeping::{
    average_housekeeping, HousekeepingSamples, HousekeepingSummary, MAX_VALID_BIAS_V,
    MIN_VALID_TEMPERATURE_C, SENSOR_OFFSETS_C,
};
pub use interpolation::{random_plane, EnergyLookup, Lut2Interpolator, FINAL_OFFSET_KEV};
pub use pipeline::{
    transform_events, EnergyTransform, ExecutionMode, TransformConfig, TransformOutput,
    DIAGNOSTICS_TARGET,
};
pub use temperature::{
    ModuleConditions, PixelCoefficients, TemperatureBiasModel, DEFAULT_BIAS_V,
    DEFAULT_TEMPERATURE_C, PINNED_REDUCED_BIAS,
};

// Re-export core types used in the public API
pub use isgri_core::diagnostics::TransformDiagnostics;
