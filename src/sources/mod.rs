//! Telemetry source implementations.

pub mod process;
pub mod scripted;

pub use process::ProcessSource;
pub use scripted::ScriptedSource;
