//! Flat observation buffer with one fixed slice per sensor.
//!
//! Slices are laid out in registration order, so the order sensors are
//! registered in is the order of the observation vector.

use bevy::prelude::*;
use caterpillar_core::error::ValidationError;
use caterpillar_core::types::Observation;

/// Where one sensor's values live inside the buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SensorSlot {
    pub name: String,
    pub dim: usize,
    pub offset: usize,
}

impl SensorSlot {
    const fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.dim
    }
}

/// The most recently assembled observation, sliced per sensor.
#[derive(Resource, Clone, Debug, Default)]
pub struct ObservationBuffer {
    data: Vec<f32>,
    slots: Vec<SensorSlot>,
}

impl ObservationBuffer {
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            slots: Vec::new(),
        }
    }

    /// Append a slot of `dim` values and return its index.
    pub fn register(&mut self, name: impl Into<String>, dim: usize) -> usize {
        self.slots.push(SensorSlot {
            name: name.into(),
            dim,
            offset: self.data.len(),
        });
        self.data.resize(self.data.len() + dim, 0.0);
        self.slots.len() - 1
    }

    /// Total observation dimension.
    pub const fn dim(&self) -> usize {
        self.data.len()
    }

    pub const fn sensor_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[SensorSlot] {
        &self.slots
    }

    /// Index of the slot registered under `name`.
    pub fn slot_index(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.name == name)
    }

    /// Overwrite one slot.
    ///
    /// Fails without touching the buffer if `values` has the wrong length
    /// or the slot does not exist.
    pub fn write(&mut self, slot_index: usize, values: &[f32]) -> Result<(), ValidationError> {
        let Some(slot) = self.slots.get(slot_index) else {
            return Err(ValidationError::ObservationDimMismatch {
                expected: 0,
                got: values.len(),
            });
        };
        if values.len() != slot.dim {
            return Err(ValidationError::ObservationDimMismatch {
                expected: slot.dim,
                got: values.len(),
            });
        }
        let range = slot.range();
        self.data[range].copy_from_slice(values);
        Ok(())
    }

    /// Values of one slot, empty for an unknown index.
    pub fn read(&self, slot_index: usize) -> &[f32] {
        self.slots
            .get(slot_index)
            .map_or(&[], |slot| &self.data[slot.range()])
    }

    pub fn as_observation(&self) -> Observation {
        Observation::new(self.data.clone())
    }

    /// Zero every value; slots stay registered.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer() {
        let buffer = ObservationBuffer::default();
        assert_eq!(buffer.dim(), 0);
        assert_eq!(buffer.sensor_count(), 0);
        assert!(buffer.as_slice().is_empty());
    }

    #[test]
    fn slots_are_laid_out_in_order() {
        let mut buffer = ObservationBuffer::new();
        assert_eq!(buffer.register("base_pose", 7), 0);
        assert_eq!(buffer.register("base_velocity", 6), 1);
        assert_eq!(buffer.register("gait_phase", 2), 2);
        assert_eq!(buffer.dim(), 15);
        assert_eq!(buffer.slots()[1].offset, 7);
        assert_eq!(buffer.slots()[2].offset, 13);
        assert_eq!(buffer.slot_index("gait_phase"), Some(2));
        assert_eq!(buffer.slot_index("missing"), None);
    }

    #[test]
    fn write_then_read() {
        let mut buffer = ObservationBuffer::new();
        let a = buffer.register("a", 2);
        let b = buffer.register("b", 1);
        buffer.write(a, &[1.0, 2.0]).unwrap();
        buffer.write(b, &[3.0]).unwrap();
        assert_eq!(buffer.read(a), &[1.0, 2.0]);
        assert_eq!(buffer.as_observation().into_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn wrong_length_is_rejected_untouched() {
        let mut buffer = ObservationBuffer::new();
        let a = buffer.register("a", 3);
        buffer.write(a, &[1.0, 1.0, 1.0]).unwrap();
        let err = buffer.write(a, &[2.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ObservationDimMismatch {
                expected: 3,
                got: 2
            }
        );
        assert_eq!(buffer.read(a), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn unknown_slot_reads_empty_and_rejects_writes() {
        let mut buffer = ObservationBuffer::new();
        assert!(buffer.read(4).is_empty());
        assert!(buffer.write(4, &[1.0]).is_err());
    }

    #[test]
    fn clear_keeps_slots() {
        let mut buffer = ObservationBuffer::new();
        let a = buffer.register("a", 2);
        buffer.write(a, &[5.0, 6.0]).unwrap();
        buffer.clear();
        assert_eq!(buffer.read(a), &[0.0, 0.0]);
        assert_eq!(buffer.sensor_count(), 1);
    }
}
