//! Async Rust library for streaming GPU telemetry from nvidia-smi.
//!
//! Gpuwatch runs the vendor CLI in streaming mode (locally or on a remote
//! host over ssh), parses its line-oriented CSV output, and delivers ordered
//! per-device readings as they arrive.
//!
//! # Features
//!
//! - **Streaming ingestion**: subprocess lifecycle, partial-read line
//!   framing, positional CSV parsing
//! - **Dynamic discovery**: devices get stable display slots in order of
//!   first appearance in the stream
//! - **Ordered delivery**: a bounded channel with backpressure; registration
//!   always precedes updates for a slot
//! - **Remote collection**: ssh-wrapped commands with non-interactive
//!   transport settings
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use gpuwatch::{Gpuwatch, MonitorEvent};
//!
//! #[tokio::main]
//! async fn main() -> gpuwatch::Result<()> {
//!     let mut session = Gpuwatch::local().await?;
//!
//!     while let Some(event) = session.next().await {
//!         match event {
//!             MonitorEvent::DeviceRegistered { slot, record } => {
//!                 println!("GPU #{slot}: {}", record.get_or("name", "Unknown GPU"));
//!             }
//!             MonitorEvent::DeviceUpdated { slot, record } => {
//!                 println!("GPU #{slot}: {}% mem", record.memory_percent());
//!             }
//!             MonitorEvent::Closed { error } => {
//!                 eprintln!("{error}");
//!                 break;
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
pub mod event;
pub mod record;
pub mod registry;
pub mod schema;

// Ingestion pipeline
pub mod command;
pub mod driver;
pub mod framer;
pub mod session;
pub mod source;
pub mod sources;

// Core exports
pub use error::{MonitorError, Result};
pub use event::MonitorEvent;
pub use record::{DeviceIndex, Record};
pub use registry::{DeviceRegistry, Slot};
pub use schema::{DEFAULT_GPU_FIELDS, FieldSchema, INDEX_FIELD};

// Pipeline exports
pub use command::{CommandSpec, DEFAULT_INTERVAL, RemoteHost};
pub use session::Session;
pub use source::TelemetrySource;
pub use sources::{ProcessSource, ScriptedSource};

/// Unified entry point for telemetry sessions.
///
/// This factory provides a consistent API for starting local and remote
/// collection; [`Session::start`] with a [`CommandSpec`] offers full control.
///
/// # Examples
///
/// ## Local collection
/// ```rust,no_run
/// use gpuwatch::Gpuwatch;
///
/// #[tokio::main]
/// async fn main() -> gpuwatch::Result<()> {
///     let session = Gpuwatch::local().await?;
///     // Drive the session stream...
///     Ok(())
/// }
/// ```
///
/// ## Remote collection over ssh
/// ```rust,no_run
/// use gpuwatch::Gpuwatch;
///
/// #[tokio::main]
/// async fn main() -> gpuwatch::Result<()> {
///     let session = Gpuwatch::remote("ops@gpu-box").await?;
///     // Drive the session stream...
///     Ok(())
/// }
/// ```
pub struct Gpuwatch;

impl Gpuwatch {
    /// Start monitoring GPUs on this machine.
    ///
    /// Runs `nvidia-smi` in streaming mode with the default schema and
    /// polling interval.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::ProcessStart`] when nvidia-smi cannot be
    /// launched (e.g. not on PATH). A start failure is fatal: no device can
    /// ever appear, so it is surfaced immediately rather than retried.
    pub async fn local() -> Result<Session> {
        Session::start(CommandSpec::local()).await
    }

    /// Start monitoring GPUs on a remote host over ssh.
    ///
    /// `host` may be `host` or `user@host`. The transport must be
    /// pre-authenticated (keys/agent); interactive prompts are disabled. An
    /// unreachable or unauthenticated host does not fail here — it surfaces
    /// as empty output followed by a single terminal
    /// [`MonitorEvent::Closed`] event.
    pub async fn remote(host: impl Into<String>) -> Result<Session> {
        Session::start(CommandSpec::remote(RemoteHost::new(host))).await
    }
}
