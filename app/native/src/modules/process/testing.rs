//! Recording [`ProcessControl`] fake for tests.
//!
//! Nothing is ever started or signalled; calls are recorded so tests can
//! assert on sequencing. A spawn gate lets a test hold an apply sequence
//! inside `spawn_detached` while it probes the orchestrator from another
//! thread.

#![cfg(test)]

use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, Receiver, Sender};

use parking_lot::Mutex;

use super::{DetachedCommand, Pid, ProcessControl, ProcessError};

/// Handle returned by [`RecordingProcesses::hold_next_spawn`] and
/// [`RecordingProcesses::hold_spawn_containing`].
pub struct SpawnGate {
    /// Receives once the held spawn has been entered.
    pub entered: Receiver<()>,
    /// Send to let the held spawn continue.
    pub release: Sender<()>,
}

struct HeldSpawn {
    needle: Option<String>,
    entered: Sender<()>,
    release: Receiver<()>,
}

#[derive(Default)]
struct State {
    running: HashMap<String, Vec<Pid>>,
    next_pid: Pid,
    queries: Vec<String>,
    terminated: Vec<Pid>,
    spawned: Vec<DetachedCommand>,
    failing_pids: HashSet<Pid>,
    failing_spawns: Vec<String>,
    fail_queries: bool,
}

/// Process control fake that records every call.
#[derive(Default)]
pub struct RecordingProcesses {
    state: Mutex<State>,
    gate: Mutex<Option<HeldSpawn>>,
}

impl RecordingProcesses {
    pub fn new() -> Self {
        let processes = Self::default();
        processes.state.lock().next_pid = 1000;
        processes
    }

    /// Pretends processes called `name` are running with `pids`.
    pub fn with_running(self, name: &str, pids: &[Pid]) -> Self {
        self.state.lock().running.insert(name.to_string(), pids.to_vec());
        self
    }

    /// Makes `terminate(pid)` fail.
    pub fn fail_terminate(&self, pid: Pid) { self.state.lock().failing_pids.insert(pid); }

    /// Makes spawns whose rendered command contains `needle` fail.
    pub fn fail_spawns_containing(&self, needle: &str) {
        self.state.lock().failing_spawns.push(needle.to_string());
    }

    /// Makes every process-table query fail.
    pub fn fail_queries(&self) { self.state.lock().fail_queries = true; }

    /// Blocks the next `spawn_detached` call until the gate is released.
    pub fn hold_next_spawn(&self) -> SpawnGate { self.hold(None) }

    /// Blocks the first spawn whose rendered command contains `needle`.
    pub fn hold_spawn_containing(&self, needle: &str) -> SpawnGate {
        self.hold(Some(needle.to_string()))
    }

    fn hold(&self, needle: Option<String>) -> SpawnGate {
        let (entered_tx, entered) = mpsc::channel();
        let (release, release_rx) = mpsc::channel();
        *self.gate.lock() = Some(HeldSpawn { needle, entered: entered_tx, release: release_rx });
        SpawnGate { entered, release }
    }

    pub fn queries(&self) -> Vec<String> { self.state.lock().queries.clone() }

    pub fn terminated(&self) -> Vec<Pid> { self.state.lock().terminated.clone() }

    pub fn spawned(&self) -> Vec<DetachedCommand> { self.state.lock().spawned.clone() }

    /// Rendered command lines of every spawn, in order.
    pub fn spawned_lines(&self) -> Vec<String> {
        self.spawned().iter().map(ToString::to_string).collect()
    }

    /// Total number of calls made on the fake.
    pub fn call_count(&self) -> usize {
        let state = self.state.lock();
        state.queries.len() + state.terminated.len() + state.spawned.len()
    }
}

impl ProcessControl for RecordingProcesses {
    fn find_process_ids(&self, name: &str) -> Result<Vec<Pid>, ProcessError> {
        let mut state = self.state.lock();
        state.queries.push(name.to_string());

        if state.fail_queries {
            return Err(ProcessError::Query {
                name: name.to_string(),
                reason: "process table unavailable".to_string(),
            });
        }

        Ok(state.running.get(name).cloned().unwrap_or_default())
    }

    fn terminate(&self, pid: Pid) -> Result<(), ProcessError> {
        let mut state = self.state.lock();

        if state.failing_pids.contains(&pid) {
            return Err(ProcessError::Terminate {
                pid,
                reason: "operation not permitted".to_string(),
            });
        }

        for pids in state.running.values_mut() {
            pids.retain(|running| *running != pid);
        }
        state.terminated.push(pid);
        Ok(())
    }

    fn spawn_detached(&self, command: &DetachedCommand) -> Result<Pid, ProcessError> {
        let line = command.to_string();

        let held = {
            let mut gate = self.gate.lock();
            let matches = gate.as_ref().is_some_and(|held| {
                held.needle.as_ref().is_none_or(|needle| line.contains(needle.as_str()))
            });
            if matches { gate.take() } else { None }
        };
        if let Some(held) = held {
            let _ = held.entered.send(());
            let _ = held.release.recv();
        }

        let mut state = self.state.lock();

        if state.failing_spawns.iter().any(|needle| line.contains(needle.as_str())) {
            return Err(ProcessError::Spawn {
                command: line,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "command not found"),
            });
        }

        state.spawned.push(command.clone());
        state.next_pid += 1;
        Ok(state.next_pid)
    }
}
