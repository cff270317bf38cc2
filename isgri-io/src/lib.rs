//! isgri-io: Calibration and event file I/O for the ISGRI energy correction.
//!
//! This crate loads the calibration tables with their exact dimensions
//! enforced, reads event lists and housekeeping telemetry, and writes the
//! corrected columns. Raw binary inputs are memory-mapped via memmap2.

mod calibration;
mod error;
#[cfg(feature = "hdf5")]
pub mod hdf5;
mod housekeeping;
mod reader;
mod run_config;
mod writer;

pub use calibration::{
    decode_lut2, load_calibration, load_law2, load_lut1, load_lut2, parse_lut1, parse_rows,
    require_file, CalibrationPaths,
};
pub use error::{Error, Result};
pub use housekeeping::{parse_housekeeping, read_housekeeping};
pub use reader::{
    decode_events_binary, parse_events_csv, read_events, EventFormat, MappedFileReader,
    EVENT_RECORD_BYTES,
};
pub use run_config::RunConfig;
pub use writer::{
    write_corrected, CorrectedEventWriter, CORRECTED_RECORD_BYTES, CSV_DIAGNOSTIC_HEADER,
    CSV_HEADER,
};
