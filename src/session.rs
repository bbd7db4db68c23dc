//! Session lifecycle.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::CommandSpec;
use crate::driver::Driver;
use crate::event::MonitorEvent;
use crate::schema::FieldSchema;
use crate::source::TelemetrySource;
use crate::sources::ProcessSource;
use crate::Result;

/// Bound on how long shutdown waits for the ingestion task to finish after
/// requesting termination.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// One running telemetry collection.
///
/// A session owns the collection process, its output stream, and the
/// ingestion task; the consumer sees only the ordered event stream. Exactly
/// one session is active per collection command.
///
/// `Session` implements [`Stream`] over [`MonitorEvent`], so a consumer
/// drives it with `StreamExt::next`:
///
/// ```rust,no_run
/// use futures::StreamExt;
/// use gpuwatch::{CommandSpec, MonitorEvent, Session};
///
/// # #[tokio::main]
/// # async fn main() -> gpuwatch::Result<()> {
/// let mut session = Session::start(CommandSpec::local()).await?;
/// while let Some(event) = session.next().await {
///     match event {
///         MonitorEvent::DeviceRegistered { slot, record } => {
///             println!("new device at slot {slot}: {:?}", record.get("name"));
///         }
///         MonitorEvent::DeviceUpdated { slot, record } => {
///             println!("slot {slot}: {}% memory", record.memory_percent());
///         }
///         MonitorEvent::Closed { error } => {
///             eprintln!("collection ended: {error}");
///             break;
///         }
///     }
/// }
/// session.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct Session {
    events: ReceiverStream<MonitorEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    schema: Arc<FieldSchema>,
}

impl Session {
    /// Start a collection session.
    ///
    /// Spawns the collection process and the ingestion task. A process that
    /// cannot be started is fatal: the error is returned immediately and no
    /// session exists. Once `Ok`, device discovery happens as records arrive
    /// on the stream.
    pub async fn start(spec: CommandSpec) -> Result<Self> {
        let (program, args) = spec.build();
        info!(command = %spec.label(), "starting telemetry session");

        let source = ProcessSource::spawn(&program, &args)?;
        Ok(Self::with_source(source, spec.schema_arc()))
    }

    /// Build a session over an arbitrary [`TelemetrySource`].
    ///
    /// Used for scripted playback and testing; [`start`](Self::start) is the
    /// subprocess-backed equivalent. Must be called within a tokio runtime.
    pub fn with_source<S>(source: S, schema: Arc<FieldSchema>) -> Self
    where
        S: TelemetrySource,
    {
        let channels = Driver::spawn(source, Arc::clone(&schema));
        Self {
            events: ReceiverStream::new(channels.events),
            cancel: channels.cancel,
            task: Some(channels.task),
            schema,
        }
    }

    /// Receive the next event, or `None` once the session has fully ended.
    pub async fn recv(&mut self) -> Option<MonitorEvent> {
        use futures::StreamExt;
        self.events.next().await
    }

    /// The session's field schema.
    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Request shutdown and wait for resources to be released.
    ///
    /// Idempotent and safe to call at any time, including before the first
    /// device is discovered. Termination of the collection process is
    /// requested immediately; this method returns once the ingestion task
    /// has finished or a bounded grace period elapses. No events are
    /// dispatched after the request is observed.
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            debug!("waiting for ingest task to finish");
            match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
                Ok(Ok(())) => debug!("ingest task finished"),
                Ok(Err(e)) => warn!("ingest task panicked: {e}"),
                Err(_) => warn!("ingest task did not finish within grace period"),
            }
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("schema", &self.schema)
            .field("shutdown", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Stream for Session {
    type Item = MonitorEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!("dropping session");
        // Cancel the ingest task on drop; the process source kills its
        // child when released.
        self.cancel.cancel();
    }
}
