//! Collection command construction.
//!
//! The telemetry stream comes from running the vendor CLI in streaming mode:
//!
//! ```text
//! nvidia-smi --query-gpu=<fields> --format=csv,noheader,nounits -lms <ms>
//! ```
//!
//! For remote hosts the same invocation is wrapped in a pre-authenticated
//! `ssh` command with interactive prompts disabled and a connection timeout,
//! so an unreachable or unauthenticated host surfaces as empty output and
//! eventual stream closure rather than a hang.

use std::sync::Arc;
use std::time::Duration;

use crate::schema::FieldSchema;

/// Default polling cadence of the collection command.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(300);

const GPU_TOOL: &str = "nvidia-smi";
const SSH_CONNECT_TIMEOUT_SECS: u32 = 10;

/// Remote host specification for ssh-wrapped collection.
#[derive(Debug, Clone)]
pub struct RemoteHost {
    host: String,
    user: Option<String>,
    port: u16,
    extra_args: Vec<String>,
}

impl RemoteHost {
    /// Create a remote host spec. `host` may be `host` or `user@host`; an
    /// embedded user is split off at the last `@` unless one is set
    /// explicitly via [`user`](Self::user).
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into();
        let (user, host) = match host.rfind('@') {
            Some(at) => (Some(host[..at].to_string()), host[at + 1..].to_string()),
            None => (None, host),
        };
        Self { host, user, port: 22, extra_args: Vec::new() }
    }

    /// Override the login user.
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Override the ssh port (default 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Extra arguments passed to ssh verbatim (e.g. `-i key.pem`).
    pub fn extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// The `[user@]host` destination string.
    fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }

    /// The hostname without any user prefix.
    pub fn hostname(&self) -> &str {
        &self.host
    }
}

#[derive(Debug, Clone)]
enum Invocation {
    Local,
    Remote(RemoteHost),
    Custom { program: String, args: Vec<String> },
}

/// Specification of the collection command for one session.
///
/// Fixed once the session starts: the schema decides both the query fragment
/// sent to the tool and the positional parse of every line it emits.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    invocation: Invocation,
    interval: Duration,
    schema: Arc<FieldSchema>,
}

impl CommandSpec {
    /// Collect from nvidia-smi on this machine.
    pub fn local() -> Self {
        Self {
            invocation: Invocation::Local,
            interval: DEFAULT_INTERVAL,
            schema: Arc::new(FieldSchema::default()),
        }
    }

    /// Collect from nvidia-smi on a remote host over ssh.
    pub fn remote(host: RemoteHost) -> Self {
        Self {
            invocation: Invocation::Remote(host),
            interval: DEFAULT_INTERVAL,
            schema: Arc::new(FieldSchema::default()),
        }
    }

    /// Run an arbitrary command that emits schema-ordered CSV on stdout.
    ///
    /// The command is used as given; no query fragment or interval is
    /// appended. Useful for testing and for pre-composed remote commands.
    pub fn custom<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            invocation: Invocation::Custom {
                program: program.into(),
                args: args.into_iter().map(Into::into).collect(),
            },
            interval: DEFAULT_INTERVAL,
            schema: Arc::new(FieldSchema::default()),
        }
    }

    /// Override the polling interval embedded in the command (default 300ms).
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Override the field schema (default: the full GPU query schema).
    pub fn schema(mut self, schema: FieldSchema) -> Self {
        self.schema = Arc::new(schema);
        self
    }

    /// The session's field schema.
    pub fn schema_arc(&self) -> Arc<FieldSchema> {
        Arc::clone(&self.schema)
    }

    /// A human-readable label for logging and error messages.
    pub fn label(&self) -> String {
        match &self.invocation {
            Invocation::Local => GPU_TOOL.to_string(),
            Invocation::Remote(host) => format!("{GPU_TOOL} via ssh on {}", host.hostname()),
            Invocation::Custom { program, .. } => program.clone(),
        }
    }

    /// Build the program and argument vector to execute.
    pub fn build(&self) -> (String, Vec<String>) {
        match &self.invocation {
            Invocation::Local => (GPU_TOOL.to_string(), self.tool_args()),
            Invocation::Remote(host) => {
                let mut args = vec![
                    "-p".to_string(),
                    host.port.to_string(),
                    "-o".to_string(),
                    "BatchMode=yes".to_string(),
                    "-o".to_string(),
                    format!("ConnectTimeout={SSH_CONNECT_TIMEOUT_SECS}"),
                ];
                args.extend(host.extra_args.iter().cloned());
                args.push(host.destination());
                // The remote side gets the full collection command as one
                // string; ssh hands it to the remote shell.
                let mut remote_cmd = vec![GPU_TOOL.to_string()];
                remote_cmd.extend(self.tool_args());
                args.push(remote_cmd.join(" "));
                ("ssh".to_string(), args)
            }
            Invocation::Custom { program, args } => (program.clone(), args.clone()),
        }
    }

    fn tool_args(&self) -> Vec<String> {
        vec![
            format!("--query-gpu={}", self.schema.query_fragment()),
            "--format=csv,noheader,nounits".to_string(),
            "-lms".to_string(),
            self.interval.as_millis().to_string(),
        ]
    }
}
