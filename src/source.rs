//! Source trait for telemetry byte streams.

use crate::Result;

/// Trait for raw telemetry byte sources.
///
/// Sources abstract over where the CSV stream comes from (live subprocess,
/// scripted playback) and handle their own timing internally. The ingestion
/// loop only ever awaits the next chunk.
#[async_trait::async_trait]
pub trait TelemetrySource: Send + 'static {
    /// Read the next chunk of raw bytes.
    ///
    /// Returns:
    /// - `Ok(Some(bytes))` - more stream data, possibly ending mid-line
    /// - `Ok(None)` - the stream ended (child closed its output)
    /// - `Err(e)` - the stream failed
    ///
    /// Suspends until the source produces data or closes; there is no
    /// polling loop, the collection command controls its own cadence.
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>>;

    /// Release the source's resources, forcefully if needed.
    ///
    /// Called once when the ingestion loop ends, whether by shutdown,
    /// stream closure, or consumer disconnect. Must be safe to call after
    /// the stream has already ended.
    async fn close(&mut self) {}
}
