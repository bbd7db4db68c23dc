//! Device discovery registry.

use crate::record::DeviceIndex;

/// Slot assignment for an observed device index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// First appearance of this index; a display slot must be created.
    New(usize),
    /// The index was already registered at this slot.
    Known(usize),
}

impl Slot {
    /// The slot position regardless of novelty.
    pub fn position(&self) -> usize {
        match *self {
            Slot::New(pos) | Slot::Known(pos) => pos,
        }
    }
}

/// Append-only map from device index to display slot.
///
/// Devices are numbered by discovery order, not by the magnitude of their
/// index: the first index seen in the stream gets slot 0, whatever its value.
/// Once registered, an index keeps its slot for the rest of the session and
/// is never removed, so the registry length always equals the number of
/// slots the consumer has been told to create.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    indices: Vec<DeviceIndex>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation of `index`, registering it on first sight.
    pub fn observe(&mut self, index: DeviceIndex) -> Slot {
        match self.slot_of(index) {
            Some(pos) => Slot::Known(pos),
            None => {
                self.indices.push(index);
                Slot::New(self.indices.len() - 1)
            }
        }
    }

    /// Slot of an already-registered index.
    pub fn slot_of(&self, index: DeviceIndex) -> Option<usize> {
        self.indices.iter().position(|&i| i == index)
    }

    /// Registered indices in discovery order.
    pub fn indices(&self) -> &[DeviceIndex] {
        &self.indices
    }

    /// Number of registered devices.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether no device has been discovered yet.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
