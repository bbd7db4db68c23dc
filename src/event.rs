//! Events delivered to the consumer.

use crate::MonitorError;
use crate::record::Record;

/// One event from the ingestion pipeline.
///
/// Events are delivered strictly in the order their source lines arrived.
/// A `DeviceRegistered` for a slot always precedes any `DeviceUpdated` for
/// that slot, and each record is a full current-state snapshot, not a delta.
#[derive(Debug)]
pub enum MonitorEvent {
    /// A device index appeared in the stream for the first time. The
    /// consumer should create display slot `slot` and apply the record.
    DeviceRegistered { slot: usize, record: Record },

    /// A fresh reading for an already-registered device.
    DeviceUpdated { slot: usize, record: Record },

    /// Terminal event: the stream closed before shutdown was requested.
    /// Emitted exactly once; no further events follow. Device state should
    /// be frozen at last-known values.
    Closed { error: MonitorError },
}

impl MonitorEvent {
    /// The record carried by a device event, if any.
    pub fn record(&self) -> Option<&Record> {
        match self {
            MonitorEvent::DeviceRegistered { record, .. }
            | MonitorEvent::DeviceUpdated { record, .. } => Some(record),
            MonitorEvent::Closed { .. } => None,
        }
    }

    /// The slot addressed by a device event, if any.
    pub fn slot(&self) -> Option<usize> {
        match self {
            MonitorEvent::DeviceRegistered { slot, .. }
            | MonitorEvent::DeviceUpdated { slot, .. } => Some(*slot),
            MonitorEvent::Closed { .. } => None,
        }
    }

    /// Whether this event registers a new device slot.
    pub fn is_registration(&self) -> bool {
        matches!(self, MonitorEvent::DeviceRegistered { .. })
    }

    /// Whether this event is terminal for the session.
    pub fn is_closed(&self) -> bool {
        matches!(self, MonitorEvent::Closed { .. })
    }
}
