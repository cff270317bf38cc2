//! Writers for corrected event columns.

use crate::reader::EventFormat;
use crate::{Error, Result};
use isgri_core::soa::CorrectedBatch;
use log::debug;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Bytes per event in the packed binary output (u8 class + f32 energy).
pub const CORRECTED_RECORD_BYTES: usize = 5;

/// CSV header of the corrected columns.
pub const CSV_HEADER: &str = "rise_time_class,energy_kev";

/// CSV header suffix of the diagnostic columns.
pub const CSV_DIAGNOSTIC_HEADER: &str = ",pha1,rt1,pha2";

/// Buffered writer for corrected event columns.
pub struct CorrectedEventWriter {
    writer: BufWriter<File>,
}

impl CorrectedEventWriter {
    /// Creates a new file writer.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self { writer })
    }

    /// Writes the batch as CSV, optionally with `pha1,rt1,pha2`.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_csv(&mut self, batch: &CorrectedBatch, diagnostic_columns: bool) -> Result<()> {
        if diagnostic_columns {
            writeln!(self.writer, "{CSV_HEADER}{CSV_DIAGNOSTIC_HEADER}")?;
        } else {
            writeln!(self.writer, "{CSV_HEADER}")?;
        }

        for i in 0..batch.len() {
            write!(
                self.writer,
                "{},{}",
                batch.rise_time_class[i], batch.energy[i]
            )?;
            if diagnostic_columns {
                write!(
                    self.writer,
                    ",{},{},{}",
                    batch.pha1[i], batch.rt1[i], batch.pha2[i]
                )?;
            }
            writeln!(self.writer)?;
        }

        self.writer.flush()?;
        Ok(())
    }

    /// Writes the batch as packed binary records.
    ///
    /// Format: for each event, u8 (rise-time class) + f32 LE (energy, keV).
    /// Total: 5 bytes per event
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_binary(&mut self, batch: &CorrectedBatch) -> Result<()> {
        for (class, energy) in batch.rise_time_class.iter().zip(&batch.energy) {
            self.writer.write_all(&[*class])?;
            self.writer.write_all(&energy.to_le_bytes())?;
        }

        self.writer.flush()?;
        Ok(())
    }

    /// Flushes the writer.
    ///
    /// # Errors
    /// Returns an error if flushing fails.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes corrected columns, choosing the layout from the extension.
///
/// The binary layout has no room for diagnostic columns; asking for them
/// there is an error.
///
/// # Errors
/// Returns an error for an unknown extension or if writing fails.
pub fn write_corrected<P: AsRef<Path>>(
    path: P,
    batch: &CorrectedBatch,
    diagnostic_columns: bool,
) -> Result<()> {
    let path = path.as_ref();
    match EventFormat::from_path(path)? {
        EventFormat::Csv => CorrectedEventWriter::create(path)?.write_csv(batch, diagnostic_columns)?,
        EventFormat::Binary => {
            if diagnostic_columns {
                return Err(Error::InvalidFormat(
                    "diagnostic columns need CSV or HDF5 output".to_string(),
                ));
            }
            CorrectedEventWriter::create(path)?.write_binary(batch)?;
        }
        #[cfg(feature = "hdf5")]
        EventFormat::Hdf5 => crate::hdf5::write_corrected_hdf5(path, batch, diagnostic_columns)?,
        #[cfg(not(feature = "hdf5"))]
        EventFormat::Hdf5 => {
            return Err(Error::InvalidFormat(
                "HDF5 support not enabled (build with the `hdf5` feature)".to_string(),
            ))
        }
    }
    debug!("wrote {} corrected events to {}", batch.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use isgri_core::soa::CorrectedEvent;
    use tempfile::NamedTempFile;

    fn sample_batch() -> CorrectedBatch {
        [
            CorrectedEvent {
                rise_time_class: 73,
                energy: 499.75,
                pha1: 1015,
                rt1: 73,
                pha2: 500,
            },
            CorrectedEvent {
                rise_time_class: 0,
                energy: 0.0,
                pha1: 0,
                rt1: 0,
                pha2: 0,
            },
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_write_csv() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = CorrectedEventWriter::create(file.path()).unwrap();
        writer.write_csv(&sample_batch(), false).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["rise_time_class,energy_kev", "73,499.75", "0,0"]);
    }

    #[test]
    fn test_write_csv_with_diagnostics() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = CorrectedEventWriter::create(file.path()).unwrap();
        writer.write_csv(&sample_batch(), true).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.starts_with("rise_time_class,energy_kev,pha1,rt1,pha2\n"));
        assert!(content.contains("73,499.75,1015,73,500"));
    }

    #[test]
    fn test_write_binary() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = CorrectedEventWriter::create(file.path()).unwrap();
        writer.write_binary(&sample_batch()).unwrap();

        let data = std::fs::read(file.path()).unwrap();
        assert_eq!(data.len(), 2 * CORRECTED_RECORD_BYTES);
        assert_eq!(data[0], 73);
        assert_eq!(&data[1..5], &499.75f32.to_le_bytes());
    }

    #[test]
    fn test_write_corrected_dispatch() {
        let csv = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write_corrected(csv.path(), &CorrectedBatch::default(), false).unwrap();
        let content = std::fs::read_to_string(csv.path()).unwrap();
        assert_eq!(content, "rise_time_class,energy_kev\n");

        let bin = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        assert!(write_corrected(bin.path(), &sample_batch(), true).is_err());
        write_corrected(bin.path(), &sample_batch(), false).unwrap();
        assert_eq!(std::fs::metadata(bin.path()).unwrap().len(), 10);

        assert!(write_corrected("out.fits", &sample_batch(), false).is_err());
    }
}
