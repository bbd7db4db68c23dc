//! Scripted playback source.

use std::collections::VecDeque;
use std::time::Duration;

use crate::Result;
use crate::source::TelemetrySource;

/// Source that replays a fixed sequence of byte chunks.
///
/// Chunks are yielded exactly as given, so chunk boundaries (including splits
/// mid-line) are reproduced faithfully. The stream ends when the script runs
/// out. Intended for tests and offline replay of captured telemetry.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    chunks: VecDeque<Vec<u8>>,
    pace: Option<Duration>,
}

impl ScriptedSource {
    /// Create a source that replays `chunks` in order.
    pub fn new<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        Self { chunks: chunks.into_iter().map(Into::into).collect(), pace: None }
    }

    /// Delay each chunk by `interval`, simulating a polling cadence.
    pub fn paced(mut self, interval: Duration) -> Self {
        self.pace = Some(interval);
        self
    }

    /// Chunks not yet yielded.
    pub fn remaining(&self) -> usize {
        self.chunks.len()
    }
}

#[async_trait::async_trait]
impl TelemetrySource for ScriptedSource {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        match self.chunks.pop_front() {
            Some(chunk) => {
                if let Some(pace) = self.pace {
                    tokio::time::sleep(pace).await;
                }
                Ok(Some(chunk))
            }
            None => Ok(None),
        }
    }
}
