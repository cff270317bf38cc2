//! isgri-core: Core types and calibration tables for ISGRI energy correction.
//!
//! This crate provides detector geometry, event batches, the calibration
//! tables (LUT1, LUT2, law-2 coefficients), random sources and the
//! diagnostic counters used by the correction pipeline.

pub mod diagnostics;
pub mod error;
pub mod law2;
pub mod lut1;
pub mod lut2;
pub mod pixel;
pub mod random;
pub mod rounding;
pub mod soa;
pub mod tables;

pub use diagnostics::{EventOutcome, TransformDiagnostics};
pub use error::{Error, Result};
pub use law2::{Law2Coefficients, Law2Laws};
pub use lut1::Lut1;
pub use lut2::{Lut2Cube, LUT2_ENERGY_CHANNELS, LUT2_LEN, LUT2_RANDOM_PLANES, LUT2_RISE_TIME_CLASSES};
pub use pixel::{ModuleId, PixelCoord, PixelIndex, DETECTOR_SIDE, N_MODULES, N_PIXELS};
pub use random::{RandomSource, ReplayRandom, SeededRandom};
pub use rounding::{clamp_index, round_half_up, Clamp};
pub use soa::{CorrectedBatch, CorrectedEvent, EventBatch};
pub use tables::CalibrationTables;
