//! [`ProcessControl`] backed by the real process table.

use std::ffi::OsStr;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use parking_lot::Mutex;
use sysinfo::{
    Pid as SysPid, Process, ProcessRefreshKind, ProcessesToUpdate, Signal, System, UpdateKind,
};

use super::{DetachedCommand, Pid, ProcessControl, ProcessError};

/// Process control through `sysinfo` and `std::process`.
pub struct SystemProcesses {
    system: Mutex<System>,
}

impl SystemProcesses {
    /// Creates a process controller with an empty process snapshot.
    #[must_use]
    pub fn new() -> Self { Self { system: Mutex::new(System::new()) } }
}

impl Default for SystemProcesses {
    fn default() -> Self { Self::new() }
}

/// Returns true when `process` runs an executable called `name`.
///
/// The kernel truncates `comm` to 15 bytes, so the executable path and
/// `argv[0]` are checked as well.
fn matches_name(process: &Process, name: &str) -> bool {
    let name = OsStr::new(name);

    if process.name() == name {
        return true;
    }

    if process.exe().and_then(Path::file_name) == Some(name) {
        return true;
    }

    process.cmd().first().and_then(|argv0| Path::new(argv0).file_name()) == Some(name)
}

/// Waits on `child` from a detached thread so it never lingers as a zombie.
fn reap_in_background(mut child: Child) {
    let pid = child.id();
    let spawned = std::thread::Builder::new().name(format!("reap-{pid}")).spawn(move || {
        match child.wait() {
            Ok(status) => tracing::debug!(pid, %status, "detached process exited"),
            Err(err) => tracing::debug!(pid, error = %err, "failed to wait on detached process"),
        }
    });

    if let Err(err) = spawned {
        tracing::warn!(pid, error = %err, "failed to start reaper thread");
    }
}

impl ProcessControl for SystemProcesses {
    fn find_process_ids(&self, name: &str) -> Result<Vec<Pid>, ProcessError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(ProcessError::Unsupported);
        }

        let own_pid = sysinfo::get_current_pid().ok();
        let mut system = self.system.lock();
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing()
                .with_exe(UpdateKind::OnlyIfNotSet)
                .with_cmd(UpdateKind::OnlyIfNotSet),
        );

        let mut pids: Vec<Pid> = system
            .processes()
            .iter()
            .filter(|(pid, process)| {
                Some(**pid) != own_pid
                    && process.thread_kind().is_none()
                    && matches_name(process, name)
            })
            .map(|(pid, _)| pid.as_u32())
            .collect();
        pids.sort_unstable();

        Ok(pids)
    }

    fn terminate(&self, pid: Pid) -> Result<(), ProcessError> {
        let sys_pid = SysPid::from_u32(pid);
        let mut system = self.system.lock();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[sys_pid]),
            true,
            ProcessRefreshKind::nothing(),
        );

        // Already gone: nothing holds the display any more.
        let Some(process) = system.process(sys_pid) else {
            tracing::debug!(pid, "process exited before it could be signalled");
            return Ok(());
        };

        match process.kill_with(Signal::Term) {
            Some(true) => Ok(()),
            Some(false) => Err(ProcessError::Terminate {
                pid,
                reason: "signal could not be delivered".to_string(),
            }),
            None => Err(ProcessError::Terminate {
                pid,
                reason: "SIGTERM is not supported on this platform".to_string(),
            }),
        }
    }

    fn spawn_detached(&self, command: &DetachedCommand) -> Result<Pid, ProcessError> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args).process_group(0);

        if command.suppress_output {
            cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
        }

        let child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            command: command.to_string(),
            source,
        })?;

        let pid = child.id();
        tracing::debug!(pid, command = %command, "detached process started");
        reap_in_background(child);

        Ok(pid)
    }
}
