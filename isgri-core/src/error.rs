//! Error types for isgri-core.

use thiserror::Error;

/// Result type alias for isgri operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for isgri operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Pixel coordinate outside the 128x128 detector plane.
    #[error("invalid pixel coordinate: (y={y}, z={z})")]
    InvalidCoordinate { y: u8, z: u8 },

    /// Calibration table with unexpected dimensions.
    #[error("{table}: expected {expected}, found {found}")]
    TableShape {
        table: &'static str,
        expected: String,
        found: String,
    },

    /// Event columns of unequal length.
    #[error("column {column} has {found} entries, expected {expected}")]
    LengthMismatch {
        column: &'static str,
        expected: usize,
        found: usize,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    pub(crate) fn shape(
        table: &'static str,
        expected: impl ToString,
        found: impl ToString,
    ) -> Self {
        Self::TableShape {
            table,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
