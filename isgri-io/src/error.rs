//! I/O error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid file format.
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    /// Unparseable value in a text table.
    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Unknown file extension.
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(PathBuf),

    /// Malformed CSV table.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Run configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// HDF5 library error.
    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] isgri_core::Error),
}
