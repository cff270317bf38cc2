//! Memory-mapped file readers, CSV tables and event list decoding.

use crate::{Error, Result};
use isgri_core::soa::EventBatch;
use log::debug;
use memmap2::Mmap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Bytes per event in the packed binary event format.
pub const EVENT_RECORD_BYTES: usize = 5;

/// A memory-mapped file reader.
///
/// Uses memmap2 to efficiently access file contents without
/// loading the entire file into memory.
pub struct MappedFileReader {
    mmap: Mmap,
    path: PathBuf,
}

impl MappedFileReader {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
        // This is the standard safety contract for memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self {
            mmap,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap[..]
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Path the mapping was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// On-disk layout of an event or corrected-column file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventFormat {
    /// Comma-separated text rows.
    Csv,
    /// Packed little-endian records.
    Binary,
    /// One HDF5 dataset per column.
    Hdf5,
}

impl EventFormat {
    /// Picks the format from a file extension.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedFormat`] for unknown extensions.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv" | "txt") => Ok(Self::Csv),
            Some("bin" | "dat") => Ok(Self::Binary),
            Some("h5" | "hdf5") => Ok(Self::Hdf5),
            _ => Err(Error::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Reads an event list, choosing the decoder from the extension.
///
/// # Errors
/// Returns an error if the file cannot be read or decoded.
pub fn read_events<P: AsRef<Path>>(path: P) -> Result<EventBatch> {
    let path = path.as_ref();
    let batch = match EventFormat::from_path(path)? {
        EventFormat::Csv => parse_events_csv(path, &std::fs::read_to_string(path)?)?,
        EventFormat::Binary => {
            let reader = MappedFileReader::open(path)?;
            decode_events_binary(reader.as_bytes())?
        }
        #[cfg(feature = "hdf5")]
        EventFormat::Hdf5 => crate::hdf5::read_events_hdf5(path)?,
        #[cfg(not(feature = "hdf5"))]
        EventFormat::Hdf5 => {
            return Err(Error::InvalidFormat(
                "HDF5 support not enabled (build with the `hdf5` feature)".to_string(),
            ))
        }
    };
    debug!("read {} events from {}", batch.len(), path.display());
    Ok(batch)
}

/// One `pha,rise_time,y,z` row.
#[derive(Debug, Deserialize)]
struct EventRow {
    pha: u16,
    rise_time: u8,
    y: u8,
    z: u8,
}

/// Parses `pha,rise_time,y,z` rows.
///
/// # Errors
/// Returns [`Error::Parse`] on a malformed row. `path` only labels errors.
pub fn parse_events_csv(path: &Path, text: &str) -> Result<EventBatch> {
    let mut batch = EventBatch::default();
    for row in read_rows::<EventRow>(path, text, 4)? {
        batch.push(row.pha, row.rise_time, row.y, row.z);
    }
    Ok(batch)
}

/// Decodes packed 5-byte event records.
///
/// # Errors
/// Returns [`Error::InvalidFormat`] if the length is not a whole number of records.
pub fn decode_events_binary(bytes: &[u8]) -> Result<EventBatch> {
    if bytes.len() % EVENT_RECORD_BYTES != 0 {
        return Err(Error::InvalidFormat(format!(
            "event file length {} is not a multiple of {EVENT_RECORD_BYTES}",
            bytes.len()
        )));
    }
    let mut batch = EventBatch::with_capacity(bytes.len() / EVENT_RECORD_BYTES);
    for record in bytes.chunks_exact(EVENT_RECORD_BYTES) {
        batch.push(
            u16::from_le_bytes([record[0], record[1]]),
            record[2],
            record[3],
            record[4],
        );
    }
    Ok(batch)
}

/// CSV reader shared by the text tables: `#` comments, trimmed fields.
///
/// Record lengths may vary; [`read_rows`] checks them per row so the error
/// can name the line.
fn table_reader(text: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes())
}

/// Deserializes every data row of a CSV table with exactly `columns` fields.
///
/// A first record with no numeric field is the header and is skipped.
pub(crate) fn read_rows<T: DeserializeOwned>(
    path: &Path,
    text: &str,
    columns: usize,
) -> Result<Vec<T>> {
    Ok(read_numbered_rows(path, text, columns)?
        .into_iter()
        .map(|(_, row)| row)
        .collect())
}

/// Like [`read_rows`], pairing each row with its 1-based line number.
pub(crate) fn read_numbered_rows<T: DeserializeOwned>(
    path: &Path,
    text: &str,
    columns: usize,
) -> Result<Vec<(usize, T)>> {
    let mut reader = table_reader(text);
    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        if i == 0 && is_header(&record) {
            continue;
        }
        let line = record
            .position()
            .map_or(0, |pos| usize::try_from(pos.line()).unwrap_or(usize::MAX));
        if record.len() != columns {
            return Err(parse_error(
                path,
                line,
                format!("expected {columns} columns, found {}", record.len()),
            ));
        }
        let row = record
            .deserialize(None)
            .map_err(|e| parse_error(path, line, e.to_string()))?;
        rows.push((line, row));
    }
    Ok(rows)
}

fn is_header(record: &csv::StringRecord) -> bool {
    record.iter().all(|field| field.parse::<f64>().is_err())
}

/// Error for a bad value on a given line of a text table.
pub(crate) fn parse_error(path: &Path, line: usize, message: String) -> Error {
    Error::Parse {
        path: path.to_path_buf(),
        line,
        message,
    }
}
