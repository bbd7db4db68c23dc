//! Error types for telemetry collection.
//!
//! The taxonomy follows the fault model of the ingestion pipeline:
//!
//! - **Start errors**: the collection command could not be launched at all.
//!   Fatal to the session and surfaced immediately from [`Session::start`].
//! - **Stream errors**: the collection process exited or its output pipe
//!   failed before shutdown was requested. Terminal to the session; reported
//!   exactly once as a [`MonitorEvent::Closed`] event, never retried.
//! - **Schema errors**: a field schema that cannot describe a CSV line at all
//!   (e.g. empty). Rejected at construction time.
//!
//! Malformed telemetry lines are deliberately *not* an error: a line whose
//! device index cannot be parsed is dropped and the stream continues, since a
//! single bad tick must not disrupt monitoring.
//!
//! [`Session::start`]: crate::session::Session::start
//! [`MonitorEvent::Closed`]: crate::event::MonitorEvent::Closed

use thiserror::Error;

/// Result type alias for telemetry operations.
pub type Result<T, E = MonitorError> = std::result::Result<T, E>;

/// Main error type for telemetry collection.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MonitorError {
    #[error("Failed to start collection process `{command}`: {reason}")]
    ProcessStart {
        command: String,
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Telemetry stream closed: {reason}")]
    StreamClosed {
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid field schema: {reason}")]
    Schema { reason: String },
}

impl MonitorError {
    /// Returns whether this error ends the session.
    ///
    /// Start failures mean no device can ever appear, and stream closures are
    /// not silently reconnected because that could duplicate or skip device
    /// state. Schema errors are caller bugs caught before a session exists.
    pub fn is_terminal(&self) -> bool {
        match self {
            MonitorError::ProcessStart { .. } => true,
            MonitorError::StreamClosed { .. } => true,
            MonitorError::Schema { .. } => false,
        }
    }

    /// Helper constructor for process start failures.
    pub fn process_start(command: impl Into<String>, source: std::io::Error) -> Self {
        MonitorError::ProcessStart {
            command: command.into(),
            reason: source.to_string(),
            source: Some(source),
        }
    }

    /// Helper constructor for process start failures without an io source.
    pub fn process_start_reason(command: impl Into<String>, reason: impl Into<String>) -> Self {
        MonitorError::ProcessStart { command: command.into(), reason: reason.into(), source: None }
    }

    /// Helper constructor for stream closures.
    pub fn stream_closed(reason: impl Into<String>) -> Self {
        MonitorError::StreamClosed { reason: reason.into(), source: None }
    }

    /// Helper constructor for stream closures caused by an io failure.
    pub fn stream_failed(reason: impl Into<String>, source: std::io::Error) -> Self {
        MonitorError::StreamClosed { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for schema construction errors.
    pub fn schema(reason: impl Into<String>) -> Self {
        MonitorError::Schema { reason: reason.into() }
    }
}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        MonitorError::StreamClosed {
            reason: "io error on telemetry stream".into(),
            source: Some(err),
        }
    }
}
