//! Structure of Arrays (`SoA`) event columns.
//!
//! Raw events come in as parallel columns (pulse height, rise time, Y, Z)
//! and corrected events go out the same way, so the per-event loop reads
//! and writes contiguous memory.

use crate::error::{Error, Result};
use crate::pixel::{PixelCoord, PixelIndex};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A batch of raw ISGRI events stored in `SoA` format.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventBatch {
    /// Raw pulse height (`ISGRI_PHA`).
    pub pha: Vec<u16>,
    /// Raw rise time byte (`RISE_TIME`).
    pub rise_time: Vec<u8>,
    /// Y coordinate (row).
    pub y: Vec<u8>,
    /// Z coordinate (column).
    pub z: Vec<u8>,
}

impl EventBatch {
    /// Creates a new empty batch with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pha: Vec::with_capacity(capacity),
            rise_time: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            z: Vec::with_capacity(capacity),
        }
    }

    /// Builds a batch from already-read columns.
    ///
    /// # Errors
    /// Returns [`Error::LengthMismatch`] if the columns differ in length.
    pub fn from_columns(pha: Vec<u16>, rise_time: Vec<u8>, y: Vec<u8>, z: Vec<u8>) -> Result<Self> {
        let batch = Self {
            pha,
            rise_time,
            y,
            z,
        };
        batch.check_lengths()?;
        Ok(batch)
    }

    /// Returns the number of events in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pha.len()
    }

    /// Returns true if the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pha.is_empty()
    }

    /// Clears all columns.
    pub fn clear(&mut self) {
        self.pha.clear();
        self.rise_time.clear();
        self.y.clear();
        self.z.clear();
    }

    /// Appends all events from another batch to this one.
    pub fn append(&mut self, other: &EventBatch) {
        self.pha.extend_from_slice(&other.pha);
        self.rise_time.extend_from_slice(&other.rise_time);
        self.y.extend_from_slice(&other.y);
        self.z.extend_from_slice(&other.z);
    }

    /// Pushes a single event into the batch.
    pub fn push(&mut self, pha: u16, rise_time: u8, y: u8, z: u8) {
        self.pha.push(pha);
        self.rise_time.push(rise_time);
        self.y.push(y);
        self.z.push(z);
    }

    /// Pixel coordinate of event `i`.
    #[inline]
    #[must_use]
    pub fn coord(&self, i: usize) -> PixelCoord {
        PixelCoord::new(self.y[i], self.z[i])
    }

    /// Checks that every column has the same length.
    ///
    /// # Errors
    /// Returns [`Error::LengthMismatch`] naming the first short or long column.
    pub fn check_lengths(&self) -> Result<()> {
        let expected = self.pha.len();
        for (column, found) in [
            ("rise_time", self.rise_time.len()),
            ("y", self.y.len()),
            ("z", self.z.len()),
        ] {
            if found != expected {
                return Err(Error::LengthMismatch {
                    column,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }

    /// Resolves every event's pixel index.
    ///
    /// Runs before any event is corrected, so a bad coordinate aborts the
    /// run with no partial output.
    ///
    /// # Errors
    /// Returns an error if the columns differ in length or a coordinate is
    /// off the detector plane.
    pub fn pixel_indices(&self) -> Result<Vec<PixelIndex>> {
        self.check_lengths()?;
        (0..self.len()).map(|i| self.coord(i).index()).collect()
    }
}

/// Corrected per-event output columns.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CorrectedBatch {
    /// Rise-time class 0..=255 (`ISGRI_PI`).
    pub rise_time_class: Vec<u8>,
    /// Calibrated energy in keV, never negative (`ISGRI_ENERGY`).
    pub energy: Vec<f32>,
    /// LUT1-rescaled pulse height (`ISGRI_PHA1`).
    pub pha1: Vec<u16>,
    /// LUT1-rescaled rise time before rounding (`ISGRI_RT1`).
    pub rt1: Vec<u8>,
    /// LUT2 energy channel used for the lookup (`ISGRI_PHA2`).
    pub pha2: Vec<u16>,
}

impl CorrectedBatch {
    /// Creates a new empty batch with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rise_time_class: Vec::with_capacity(capacity),
            energy: Vec::with_capacity(capacity),
            pha1: Vec::with_capacity(capacity),
            rt1: Vec::with_capacity(capacity),
            pha2: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of events in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.energy.len()
    }

    /// Returns true if the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.energy.is_empty()
    }

    /// Pushes a single corrected event.
    pub fn push(&mut self, event: &CorrectedEvent) {
        self.rise_time_class.push(event.rise_time_class);
        self.energy.push(event.energy);
        self.pha1.push(event.pha1);
        self.rt1.push(event.rt1);
        self.pha2.push(event.pha2);
    }

    /// Appends all events from another batch to this one.
    pub fn append(&mut self, other: &CorrectedBatch) {
        self.rise_time_class
            .extend_from_slice(&other.rise_time_class);
        self.energy.extend_from_slice(&other.energy);
        self.pha1.extend_from_slice(&other.pha1);
        self.rt1.extend_from_slice(&other.rt1);
        self.pha2.extend_from_slice(&other.pha2);
    }
}

impl FromIterator<CorrectedEvent> for CorrectedBatch {
    fn from_iter<I: IntoIterator<Item = CorrectedEvent>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut batch = Self::with_capacity(iter.size_hint().0);
        for event in iter {
            batch.push(&event);
        }
        batch
    }
}

/// One corrected event (row view of [`CorrectedBatch`]).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CorrectedEvent {
    /// Rise-time class.
    pub rise_time_class: u8,
    /// Energy in keV.
    pub energy: f32,
    /// LUT1-rescaled pulse height.
    pub pha1: u16,
    /// LUT1-rescaled rise time.
    pub rt1: u8,
    /// LUT2 energy channel.
    pub pha2: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_batch_operations() {
        let mut batch = EventBatch::with_capacity(10);
        assert!(batch.is_empty());

        batch.push(1000, 128, 0, 0);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.pha[0], 1000);

        batch.push(500, 40, 64, 32);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.coord(1), PixelCoord::new(64, 32));

        batch.clear();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_from_columns_rejects_ragged_input() {
        let err = EventBatch::from_columns(vec![1, 2], vec![0, 0], vec![0], vec![0, 0]).unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch {
                column: "y",
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_pixel_indices_rejects_off_plane() {
        let mut batch = EventBatch::default();
        batch.push(10, 10, 5, 5);
        batch.push(10, 10, 130, 5);
        assert!(matches!(
            batch.pixel_indices(),
            Err(Error::InvalidCoordinate { y: 130, z: 5 })
        ));
    }

    #[test]
    fn test_corrected_batch_collect() {
        let batch: CorrectedBatch = (0..3)
            .map(|i| CorrectedEvent {
                rise_time_class: i,
                energy: f32::from(i) * 10.0,
                ..Default::default()
            })
            .collect();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.rise_time_class, vec![0, 1, 2]);
    }
}
