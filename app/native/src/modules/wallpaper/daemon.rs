//! Hand-off of the captured screenshot to `swww`.

use std::path::Path;

use crate::constants::daemon::{CLIENT, PROCESS};
use crate::modules::process::{DetachedCommand, ProcessControl, ProcessError};

/// How the daemon was found when the screenshot was handed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonHandoff {
    /// `swww-daemon` was already running.
    AlreadyRunning,
    /// `swww-daemon` had to be started first.
    Started,
}

/// Makes sure `swww-daemon` runs, then asks it to display `screenshot`.
///
/// The client is spawned directly, without a shell.
///
/// # Errors
///
/// Returns the first query or spawn error.
pub fn hand_off(
    processes: &dyn ProcessControl,
    screenshot: &Path,
    suppress_output: bool,
) -> Result<DaemonHandoff, ProcessError> {
    let handoff = if processes.find_process_ids(PROCESS)?.is_empty() {
        tracing::info!("starting {PROCESS}");
        processes.spawn_detached(
            &DetachedCommand::new(PROCESS, Vec::<String>::new()).suppress_output(suppress_output),
        )?;
        DaemonHandoff::Started
    } else {
        DaemonHandoff::AlreadyRunning
    };

    let image = screenshot.to_string_lossy().into_owned();
    processes.spawn_detached(
        &DetachedCommand::new(CLIENT, ["img".to_string(), image]).suppress_output(suppress_output),
    )?;

    Ok(handoff)
}
