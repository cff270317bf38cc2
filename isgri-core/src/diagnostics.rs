//! Boundary-condition counters collected over a run.
//!
//! None of these change the produced values; they are reported once the
//! batch is done.

use crate::rounding::Clamp;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Initial value of the rise-time minimum for a non-empty batch (x1000).
pub const RISE_TIME_MIN_SEED: i64 = 0;
/// Initial value of the rise-time maximum for a non-empty batch (x1000).
pub const RISE_TIME_MAX_SEED: i64 = -99;

/// What happened to a single event at the table edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventOutcome {
    /// Rescaled rise time x1000, truncated toward zero.
    pub rise_time_milli: i64,
    /// Rise-time class clamping.
    pub rise_time: Clamp,
    /// Pulse-height channel range (`Low` below 0, `High` at or above 2048).
    pub amplitude: Clamp,
    /// Energy was forced to exactly 0.0.
    pub forced_zero: bool,
}

/// Aggregate diagnostic counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransformDiagnostics {
    /// Events processed.
    pub events: u64,
    /// Rise-time class below 0, clamped to 0.
    pub rise_time_low: u64,
    /// Rise-time class above 255, clamped to 255.
    pub rise_time_high: u64,
    /// Pulse-height channel below 0 (energy 0).
    pub amplitude_low: u64,
    /// Pulse-height channel at or above 2048 (top LUT2 edge).
    pub amplitude_high: u64,
    /// Smallest rescaled rise time x1000.
    pub rise_time_min_milli: i64,
    /// Largest rescaled rise time x1000.
    pub rise_time_max_milli: i64,
    /// Energies forced to 0.0, including the low-amplitude ones.
    pub forced_zero: u64,
}

impl TransformDiagnostics {
    /// Accumulator for a non-empty batch, carrying the historical min/max seeds.
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            rise_time_min_milli: RISE_TIME_MIN_SEED,
            rise_time_max_milli: RISE_TIME_MAX_SEED,
            ..Self::default()
        }
    }

    /// Folds one event into the counters.
    pub fn record(&mut self, outcome: &EventOutcome) {
        self.events += 1;
        match outcome.rise_time {
            Clamp::Low => self.rise_time_low += 1,
            Clamp::High => self.rise_time_high += 1,
            Clamp::InRange => {}
        }
        match outcome.amplitude {
            Clamp::Low => self.amplitude_low += 1,
            Clamp::High => self.amplitude_high += 1,
            Clamp::InRange => {}
        }
        if outcome.forced_zero {
            self.forced_zero += 1;
        }
        self.rise_time_min_milli = self.rise_time_min_milli.min(outcome.rise_time_milli);
        self.rise_time_max_milli = self.rise_time_max_milli.max(outcome.rise_time_milli);
    }

    /// Combines two partial accumulators. Order-independent.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            events: self.events + other.events,
            rise_time_low: self.rise_time_low + other.rise_time_low,
            rise_time_high: self.rise_time_high + other.rise_time_high,
            amplitude_low: self.amplitude_low + other.amplitude_low,
            amplitude_high: self.amplitude_high + other.amplitude_high,
            rise_time_min_milli: self.rise_time_min_milli.min(other.rise_time_min_milli),
            rise_time_max_milli: self.rise_time_max_milli.max(other.rise_time_max_milli),
            forced_zero: self.forced_zero + other.forced_zero,
        }
    }

    /// Events whose LUT2 value resolved to zero or below (forced-zero
    /// events that were not already below the amplitude range).
    #[must_use]
    pub fn non_positive_lut2(&self) -> u64 {
        self.forced_zero.saturating_sub(self.amplitude_low)
    }

    /// Observed rescaled rise-time interval.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn rise_time_interval(&self) -> (f64, f64) {
        (
            self.rise_time_min_milli as f64 / 1000.0,
            self.rise_time_max_milli as f64 / 1000.0,
        )
    }
}

impl fmt::Display for TransformDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (min, max) = self.rise_time_interval();
        writeln!(f, "Total COR rise-time <= -1: {:9}", self.rise_time_low)?;
        writeln!(f, "Total COR rise-time >=256: {:9}", self.rise_time_high)?;
        writeln!(f, "COR rise-time interval: {min:4.1} to {max:5.1}")?;
        writeln!(f, "Total COR amplitude <= -1: {:9}", self.amplitude_low)?;
        writeln!(f, "Total COR amplitude>=2048: {:9}", self.amplitude_high)?;
        write!(f, "Total with LUT2 coef. <=0: {:9}", self.non_positive_lut2())
    }
}
