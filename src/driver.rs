//! Driver spawns and manages the telemetry ingestion task.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::event::MonitorEvent;
use crate::framer::LineFramer;
use crate::record::Record;
use crate::registry::{DeviceRegistry, Slot};
use crate::schema::FieldSchema;
use crate::source::TelemetrySource;
use crate::MonitorError;

/// Capacity of the ordered event channel. A consumer slower than this gets
/// backpressure (the ingestion task awaits), never dropped or reordered
/// events.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Result of spawning the ingestion task.
pub struct DriverChannels {
    /// Ordered receiver for device and terminal events.
    pub events: mpsc::Receiver<MonitorEvent>,
    /// Cancellation token for shutdown.
    pub cancel: CancellationToken,
    /// Handle of the ingestion task, for bounded-grace joins.
    pub task: JoinHandle<()>,
}

/// Driver spawns and manages the telemetry ingestion task.
///
/// The task owns the source, framer, and registry exclusively; the bounded
/// event channel is the only state shared with the consumer.
pub struct Driver;

impl Driver {
    /// Spawn the ingestion task for the given source.
    ///
    /// Must be called within a tokio runtime.
    pub fn spawn<S>(source: S, schema: Arc<FieldSchema>) -> DriverChannels
    where
        S: TelemetrySource,
    {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let cancel_task = cancel.clone();
        let task = tokio::spawn(async move {
            Self::ingest_task(source, schema, event_tx, cancel_task).await;
        });

        DriverChannels { events: event_rx, cancel, task }
    }

    /// Ingestion task: read chunks, frame lines, parse records, dispatch
    /// events in arrival order.
    async fn ingest_task<S>(
        mut source: S,
        schema: Arc<FieldSchema>,
        event_tx: mpsc::Sender<MonitorEvent>,
        cancel: CancellationToken,
    ) where
        S: TelemetrySource,
    {
        info!("ingest task started");
        let mut framer = LineFramer::new();
        let mut registry = DeviceRegistry::new();
        let mut line_count = 0u64;
        let mut dropped_count = 0u64;

        'ingest: loop {
            // Biased: once shutdown is requested, no already-completed read
            // may still produce events.
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("ingest cancelled");
                    break;
                }
                chunk = source.next_chunk() => chunk,
            };

            match chunk {
                Ok(Some(bytes)) => {
                    for line in framer.push(&bytes) {
                        line_count += 1;
                        let record = Record::parse(&line, &schema);

                        // Lossy-drop policy: a line without a parsable device
                        // index must never crash or stall the session.
                        let Some(index) = record.device_index() else {
                            dropped_count += 1;
                            trace!(%line, "dropped line without parsable device index");
                            continue;
                        };

                        let event = match registry.observe(index) {
                            Slot::New(slot) => {
                                debug!(index, slot, "device discovered");
                                MonitorEvent::DeviceRegistered { slot, record }
                            }
                            Slot::Known(slot) => {
                                trace!(index, slot, "device updated");
                                MonitorEvent::DeviceUpdated { slot, record }
                            }
                        };

                        // Bounded handoff: block on a slow consumer rather
                        // than drop or reorder, but stay cancellable.
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => {
                                info!("ingest cancelled during dispatch");
                                break 'ingest;
                            }
                            sent = event_tx.send(event) => {
                                if sent.is_err() {
                                    debug!("event receiver dropped, shutting down");
                                    break 'ingest;
                                }
                            }
                        }
                    }
                }
                Ok(None) => {
                    if !cancel.is_cancelled() {
                        info!(lines = line_count, "telemetry stream ended before shutdown");
                        let closed = MonitorEvent::Closed {
                            error: MonitorError::stream_closed(
                                "telemetry stream ended before shutdown was requested",
                            ),
                        };
                        let _ = event_tx.send(closed).await;
                    }
                    break;
                }
                Err(e) => {
                    if !cancel.is_cancelled() {
                        error!("telemetry stream failed: {e}");
                        let _ = event_tx.send(MonitorEvent::Closed { error: e }).await;
                    }
                    break;
                }
            }
        }

        source.close().await;

        info!(
            lines = line_count,
            dropped = dropped_count,
            devices = registry.len(),
            "ingest task ended"
        );
    }
}
