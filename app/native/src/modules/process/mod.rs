//! Process supervision.
//!
//! The apply pipeline only ever needs three things from the OS: find
//! processes by executable name, send them `SIGTERM`, and start detached
//! children it never waits on. [`ProcessControl`] captures exactly that so
//! the orchestrator can be driven by [`SystemProcesses`] in production and by
//! a recording fake in tests.

mod system;
pub mod testing;

use std::fmt;

use thiserror::Error;

pub use system::SystemProcesses;

use crate::constants::SHELL;

/// Operating system process ID.
pub type Pid = u32;

/// Errors reported by a [`ProcessControl`] implementation.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The process table cannot be read on this system.
    #[error("Process listing is not supported on this system")]
    Unsupported,
    /// Querying the process table failed.
    #[error("Failed to query processes named '{name}': {reason}")]
    Query { name: String, reason: String },
    /// Sending the termination signal failed.
    #[error("Failed to terminate process {pid}: {reason}")]
    Terminate { pid: Pid, reason: String },
    /// The child process could not be started.
    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// A command to start as a detached child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedCommand {
    /// Executable to run.
    pub program: String,
    /// Arguments passed to the executable.
    pub args: Vec<String>,
    /// Redirect stdin/stdout/stderr to the null device instead of inheriting them.
    pub suppress_output: bool,
}

impl DetachedCommand {
    /// Creates a command running `program` with `args`.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            suppress_output: false,
        }
    }

    /// Creates a command that hands `command_line` to `sh -c`.
    #[must_use]
    pub fn shell(command_line: &str) -> Self { Self::new(SHELL, ["-c", command_line]) }

    /// Sets whether the child's standard streams go to the null device.
    #[must_use]
    pub const fn suppress_output(mut self, suppress: bool) -> Self {
        self.suppress_output = suppress;
        self
    }
}

impl fmt::Display for DetachedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Access to the process table and detached spawning.
pub trait ProcessControl: Send + Sync {
    /// Returns the PIDs of running processes whose executable is named `name`.
    ///
    /// No match is an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only if the process table cannot be queried.
    fn find_process_ids(&self, name: &str) -> Result<Vec<Pid>, ProcessError>;

    /// Sends a graceful termination signal to `pid`.
    ///
    /// # Errors
    ///
    /// Returns an error if the signal cannot be delivered.
    fn terminate(&self, pid: Pid) -> Result<(), ProcessError>;

    /// Starts `command` in its own process group and returns without waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be started.
    fn spawn_detached(&self, command: &DetachedCommand) -> Result<Pid, ProcessError>;

    /// Terminates every process named `name`, returning how many were signalled.
    ///
    /// Stops at the first PID that cannot be terminated; earlier PIDs stay
    /// signalled and the failure is reported.
    ///
    /// # Errors
    ///
    /// Returns the query error or the first termination error.
    fn kill_all_by_name(&self, name: &str) -> Result<usize, ProcessError> {
        let pids = self.find_process_ids(name)?;

        if pids.is_empty() {
            tracing::debug!(name, "no running processes found");
            return Ok(0);
        }

        tracing::info!(name, count = pids.len(), "terminating running processes");
        for pid in &pids {
            self.terminate(*pid)?;
            tracing::debug!(name, pid, "sent SIGTERM");
        }

        Ok(pids.len())
    }
}
