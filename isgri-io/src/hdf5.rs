//! HDF5 event input and corrected-column output.
//!
//! Input events live in `events/{isgri_pha,rise_time,isgri_y,isgri_z}`;
//! corrected columns are written to
//! `corrected/{isgri_pi,isgri_energy[,isgri_pha1,isgri_rt1,isgri_pha2]}`.

use crate::{Error, Result};
use hdf5::types::{H5Type, VarLenUnicode};
use hdf5::{Dataset, File, Group};
use isgri_core::soa::{CorrectedBatch, EventBatch};
use ndarray::{s, ArrayView1};
use std::path::Path;
use std::str::FromStr;

/// Group holding the input event columns.
pub const EVENTS_GROUP: &str = "events";

/// Group holding the corrected columns.
pub const CORRECTED_GROUP: &str = "corrected";

const FORMAT_VERSION: &str = "0.1";

/// Dataset layout options.
///
/// Columns are created chunked with an unlimited extent, so an empty batch
/// still gets a compressible dataset of length zero.
#[derive(Clone, Debug)]
pub struct ColumnWriteOptions {
    /// Events per chunk; zero is treated as one.
    pub chunk_events: usize,
    /// Deflate level, or `None` for no compression.
    pub compression: Option<u8>,
    /// Apply the byte-shuffle filter before compression.
    pub shuffle: bool,
}

impl Default for ColumnWriteOptions {
    fn default() -> Self {
        Self {
            chunk_events: 100_000,
            compression: Some(1),
            shuffle: true,
        }
    }
}

/// Reads input events.
///
/// # Errors
/// Returns an error if HDF5 I/O fails or the columns differ in length.
pub fn read_events_hdf5<P: AsRef<Path>>(path: P) -> Result<EventBatch> {
    let file = File::open(path)?;
    let group = file.group(EVENTS_GROUP)?;
    let batch = EventBatch::from_columns(
        read_dataset_vec::<u16>(&group, "isgri_pha")?,
        read_dataset_vec::<u8>(&group, "rise_time")?,
        read_dataset_vec::<u8>(&group, "isgri_y")?,
        read_dataset_vec::<u8>(&group, "isgri_z")?,
    )?;
    Ok(batch)
}

/// Writes input events, e.g. to prepare a test file.
///
/// # Errors
/// Returns an error if HDF5 I/O fails.
pub fn write_events_hdf5<P: AsRef<Path>>(
    path: P,
    batch: &EventBatch,
    options: &ColumnWriteOptions,
) -> Result<()> {
    batch.check_lengths()?;
    let file = File::create(path)?;
    set_attr_str_file(&file, "isgri_format_version", FORMAT_VERSION)?;

    let group = file.create_group(EVENTS_GROUP)?;
    set_attr_str_group(&group, "NX_class", "NXevent_data")?;
    write_column(&group, "isgri_pha", &batch.pha, options)?;
    write_column(&group, "rise_time", &batch.rise_time, options)?;
    write_column(&group, "isgri_y", &batch.y, options)?;
    write_column(&group, "isgri_z", &batch.z, options)?;
    Ok(())
}

/// Writes corrected columns with default layout options.
///
/// # Errors
/// Returns an error if HDF5 I/O fails.
pub fn write_corrected_hdf5<P: AsRef<Path>>(
    path: P,
    batch: &CorrectedBatch,
    diagnostic_columns: bool,
) -> Result<()> {
    write_corrected_hdf5_with(path, batch, diagnostic_columns, &ColumnWriteOptions::default())
}

/// Writes corrected columns.
///
/// # Errors
/// Returns an error if HDF5 I/O fails.
pub fn write_corrected_hdf5_with<P: AsRef<Path>>(
    path: P,
    batch: &CorrectedBatch,
    diagnostic_columns: bool,
    options: &ColumnWriteOptions,
) -> Result<()> {
    let file = File::create(path)?;
    set_attr_str_file(&file, "isgri_format_version", FORMAT_VERSION)?;

    let group = file.create_group(CORRECTED_GROUP)?;
    set_attr_str_group(&group, "NX_class", "NXevent_data")?;
    write_column(&group, "isgri_pi", &batch.rise_time_class, options)?;
    let energy = write_column(&group, "isgri_energy", &batch.energy, options)?;
    set_dataset_units(&energy, "keV")?;

    if diagnostic_columns {
        write_column(&group, "isgri_pha1", &batch.pha1, options)?;
        write_column(&group, "isgri_rt1", &batch.rt1, options)?;
        write_column(&group, "isgri_pha2", &batch.pha2, options)?;
    }
    Ok(())
}

/// Corrected columns read back from a file.
#[derive(Clone, Debug, Default)]
pub struct CorrectedColumns {
    pub rise_time_class: Vec<u8>,
    pub energy: Vec<f32>,
    pub pha1: Option<Vec<u16>>,
    pub rt1: Option<Vec<u8>>,
    pub pha2: Option<Vec<u16>>,
}

/// Reads corrected columns; diagnostic columns are `None` when absent.
///
/// # Errors
/// Returns an error if HDF5 I/O fails.
pub fn read_corrected_hdf5<P: AsRef<Path>>(path: P) -> Result<CorrectedColumns> {
    let file = File::open(path)?;
    let group = file.group(CORRECTED_GROUP)?;
    Ok(CorrectedColumns {
        rise_time_class: read_dataset_vec(&group, "isgri_pi")?,
        energy: read_dataset_vec(&group, "isgri_energy")?,
        pha1: read_dataset_vec_opt(&group, "isgri_pha1")?,
        rt1: read_dataset_vec_opt(&group, "isgri_rt1")?,
        pha2: read_dataset_vec_opt(&group, "isgri_pha2")?,
    })
}

fn write_column<T: H5Type>(
    group: &Group,
    name: &str,
    data: &[T],
    options: &ColumnWriteOptions,
) -> Result<Dataset> {
    let dataset = create_extendable_dataset::<T>(
        group,
        name,
        options.chunk_events.max(1),
        options.compression,
        options.shuffle,
    )?;
    fill_column(&dataset, data)?;
    Ok(dataset)
}

fn create_extendable_dataset<T: H5Type>(
    group: &Group,
    name: &str,
    chunk_events: usize,
    compression: Option<u8>,
    shuffle: bool,
) -> Result<Dataset> {
    let mut builder = group
        .new_dataset::<T>()
        .shape((0..,))
        .chunk((chunk_events,));

    if let Some(level) = compression {
        builder = builder.deflate(level);
    }

    if shuffle {
        builder = builder.shuffle();
    }

    Ok(builder.create(name)?)
}

fn fill_column<T: H5Type>(dataset: &Dataset, data: &[T]) -> Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    dataset.resize((data.len(),))?;
    dataset.write_slice(ArrayView1::from(data), s![..])?;
    Ok(())
}

fn set_dataset_units(dataset: &Dataset, units: &str) -> Result<()> {
    let value = to_var_len_unicode(units)?;
    dataset
        .new_attr::<VarLenUnicode>()
        .create("units")?
        .write_scalar(&value)?;
    Ok(())
}

fn set_attr_str_file(file: &File, name: &str, value: &str) -> Result<()> {
    let value = to_var_len_unicode(value)?;
    file.new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

fn set_attr_str_group(group: &Group, name: &str, value: &str) -> Result<()> {
    let value = to_var_len_unicode(value)?;
    group
        .new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

fn read_dataset_vec<T: H5Type>(group: &Group, name: &str) -> Result<Vec<T>> {
    let dataset = group.dataset(name)?;
    Ok(dataset.read_raw::<T>()?)
}

fn read_dataset_vec_opt<T: H5Type>(group: &Group, name: &str) -> Result<Option<Vec<T>>> {
    match group.dataset(name) {
        Ok(dataset) => Ok(Some(dataset.read_raw::<T>()?)),
        Err(_) => Ok(None),
    }
}

fn to_var_len_unicode(value: &str) -> Result<VarLenUnicode> {
    VarLenUnicode::from_str(value)
        .map_err(|e| Error::InvalidFormat(format!("invalid utf-8 attribute: {e}")))
}
