//! Live subprocess source.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::source::TelemetrySource;
use crate::{MonitorError, Result};

const READ_BUF_SIZE: usize = 4096;
const KILL_GRACE: Duration = Duration::from_secs(2);

/// Source that streams stdout from a spawned collection process.
///
/// The child gets no stdin (the transport is non-interactive) and its stderr
/// is drained to tracing at warn level by a side task, so ssh diagnostics
/// stay observable without corrupting the CSV stream. This is a deliberate
/// departure from the classic approach of merging stderr into the stdout
/// pipe: merged diagnostics would reach the CSV parser as malformed lines,
/// while a separate drain keeps them out of the record stream entirely. The
/// parent controls read timing; the child's polling cadence comes from the
/// command itself.
pub struct ProcessSource {
    child: Child,
    stdout: ChildStdout,
    command: String,
}

impl ProcessSource {
    /// Spawn the collection process with its output piped to this source.
    ///
    /// Fails with [`MonitorError::ProcessStart`] when the executable cannot
    /// be located or the platform declines to create the process. A remote
    /// host that is unreachable or unauthenticated does not fail here; it
    /// surfaces later as empty output and stream closure.
    pub fn spawn(program: &str, args: &[String]) -> Result<Self> {
        let command = format!("{program} {}", args.join(" "));

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MonitorError::process_start(&command, e))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            MonitorError::process_start_reason(&command, "child stdout was not captured")
        })?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!(target: "gpuwatch::child", "{line}");
                }
            });
        }

        info!(pid = child.id(), %command, "collection process started");

        Ok(Self { child, stdout, command })
    }

    /// The full command line this source runs, for diagnostics.
    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait::async_trait]
impl TelemetrySource for ProcessSource {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let mut buf = vec![0u8; READ_BUF_SIZE];
        let n = self
            .stdout
            .read(&mut buf)
            .await
            .map_err(|e| MonitorError::stream_failed("failed to read collection output", e))?;
        if n == 0 {
            debug!("collection process closed its output");
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some(buf))
    }

    async fn close(&mut self) {
        // Termination is requested immediately; the grace period only bounds
        // how long we wait to reap the child.
        if let Err(e) = self.child.start_kill() {
            debug!("kill request failed (child likely already exited): {e}");
        }
        match tokio::time::timeout(KILL_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => debug!(%status, "collection process terminated"),
            Ok(Err(e)) => warn!("failed to reap collection process: {e}"),
            Err(_) => warn!("collection process did not exit within grace period"),
        }
    }
}
