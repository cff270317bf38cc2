//! Energy transform over a whole event batch.

use crate::context::{CalibrationContext, EventDraws};
use crate::temperature::ModuleConditions;
use isgri_core::diagnostics::{EventOutcome, TransformDiagnostics};
use isgri_core::error::{Error, Result};
use isgri_core::random::RandomSource;
use isgri_core::soa::{CorrectedBatch, CorrectedEvent, EventBatch};
use isgri_core::tables::CalibrationTables;
use log::info;
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Log target of the end-of-run diagnostic summary.
pub const DIAGNOSTICS_TARGET: &str = "isgri_algorithms::diagnostics";

/// How the per-event loop runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ExecutionMode {
    /// One event after another, in input order.
    #[default]
    Sequential,
    /// Draws taken sequentially, events corrected on the rayon pool.
    Parallel,
}

/// Run-level settings of the transform.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransformConfig {
    /// Mission revolution of the whole batch.
    pub revolution: i64,
    /// Apply the dual-law gain-drift correction.
    pub correct_gain_drift: bool,
    /// Execution strategy.
    pub execution: ExecutionMode,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            revolution: 0,
            correct_gain_drift: true,
            execution: ExecutionMode::Sequential,
        }
    }
}

impl TransformConfig {
    /// Sets the revolution.
    #[must_use]
    pub fn with_revolution(mut self, revolution: i64) -> Self {
        self.revolution = revolution;
        self
    }

    /// Enables or disables gain-drift correction.
    #[must_use]
    pub fn with_gain_drift_correction(mut self, enabled: bool) -> Self {
        self.correct_gain_drift = enabled;
        self
    }

    /// Sets the execution mode.
    #[must_use]
    pub fn with_execution(mut self, execution: ExecutionMode) -> Self {
        self.execution = execution;
        self
    }
}

/// Output of one transform run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransformOutput {
    /// Corrected columns, in input order.
    pub corrected: CorrectedBatch,
    /// Boundary-condition counters.
    pub diagnostics: TransformDiagnostics,
}

/// Applies the energy correction to event batches.
#[derive(Clone, Debug, Default)]
pub struct EnergyTransform {
    config: TransformConfig,
}

impl EnergyTransform {
    /// Creates a transform with the given settings.
    #[must_use]
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    /// Transform settings.
    #[must_use]
    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Builds the calibration context for this transform's revolution.
    #[must_use]
    pub fn prepare<'t>(
        &self,
        tables: &'t CalibrationTables,
        conditions: ModuleConditions,
    ) -> CalibrationContext<'t> {
        CalibrationContext::new(tables, conditions, self.config.revolution)
    }

    /// Corrects every event of `events`.
    ///
    /// All pixel coordinates are validated before the first event is
    /// corrected. Each event takes its law-selection draw (drift correction
    /// only) and then its LUT2 draw from `rng`, in input order, so both
    /// execution modes give identical output for the same seed.
    ///
    /// # Errors
    /// Returns an error if the event columns differ in length, a pixel
    /// coordinate is off the detector, or the context was built for a
    /// different revolution.
    pub fn run<R: RandomSource>(
        &self,
        context: &CalibrationContext<'_>,
        events: &EventBatch,
        rng: &mut R,
    ) -> Result<TransformOutput> {
        if context.revolution() != self.config.revolution {
            return Err(Error::ConfigError(format!(
                "context built for revolution {}, transform configured for {}",
                context.revolution(),
                self.config.revolution
            )));
        }
        let pixels = events.pixel_indices()?;
        info!("{} events selected", events.len());

        if events.is_empty() {
            info!("NO event selected");
            return Ok(TransformOutput::default());
        }

        let drift = self.config.correct_gain_drift;
        let draws: Vec<EventDraws> = (0..events.len())
            .map(|_| {
                let law = drift.then(|| rng.next_uniform());
                EventDraws {
                    law,
                    plane: rng.next_uniform(),
                }
            })
            .collect();

        let correct = |i: usize| {
            context.correct_event(pixels[i], events.pha[i], events.rise_time[i], draws[i])
        };

        let output = match self.config.execution {
            ExecutionMode::Sequential => {
                let mut corrected = CorrectedBatch::with_capacity(events.len());
                let mut diagnostics = TransformDiagnostics::seeded();
                for i in 0..events.len() {
                    let (event, outcome) = correct(i);
                    corrected.push(&event);
                    diagnostics.record(&outcome);
                }
                TransformOutput {
                    corrected,
                    diagnostics,
                }
            }
            ExecutionMode::Parallel => {
                let results: Vec<(CorrectedEvent, EventOutcome)> =
                    (0..events.len()).into_par_iter().map(correct).collect();
                let diagnostics = results
                    .par_iter()
                    .fold(TransformDiagnostics::seeded, |mut acc, (_, outcome)| {
                        acc.record(outcome);
                        acc
                    })
                    .reduce(TransformDiagnostics::seeded, TransformDiagnostics::merge);
                TransformOutput {
                    corrected: results.into_iter().map(|(event, _)| event).collect(),
                    diagnostics,
                }
            }
        };

        for line in output.diagnostics.to_string().lines() {
            info!(target: DIAGNOSTICS_TARGET, "{line}");
        }
        Ok(output)
    }
}

/// Builds the context and runs the transform in one call.
///
/// # Errors
/// See [`EnergyTransform::run`].
pub fn transform_events<R: RandomSource>(
    tables: &CalibrationTables,
    conditions: ModuleConditions,
    events: &EventBatch,
    config: TransformConfig,
    rng: &mut R,
) -> Result<TransformOutput> {
    let transform = EnergyTransform::new(config);
    let context = transform.prepare(tables, conditions);
    transform.run(&context, events, rng)
}
