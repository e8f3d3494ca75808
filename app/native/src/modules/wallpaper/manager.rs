//! Single-flight apply sequence.
//!
//! [`WallpaperManager`] drives one wallpaper from "requested" to "on screen":
//! kill the running renderer, spawn the new one, then run the optional
//! post-processing chain (delay, screenshot export, post-command, `swww`
//! hand-off). At most one sequence runs at a time; a request made while one
//! is in flight is rejected with [`ApplyError::Busy`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rand::Rng;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use super::catalog::{Catalog, WallpaperEntry};
use super::command::{CommandBuilder, format_volume, process_name};
use super::daemon::{self, DaemonHandoff};
use super::processing::{self, ProcessingError};
use super::template::{self, TemplateVars};
use crate::config::{EngineConfig, PostProcessingConfig};
use crate::modules::process::{DetachedCommand, Pid, ProcessControl, ProcessError};
use crate::platform::path::{expand, resolve};

/// Where an apply sequence currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApplyPhase {
    #[default]
    Idle,
    Applying,
    PostProcessing,
}

/// Status updates published while a sequence runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyStatus {
    Starting { id: String },
    Delaying { id: String },
    PostProcessing { id: String },
    Applied { id: String },
    Failed { id: String, error: String },
}

impl fmt::Display for ApplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starting { .. } => f.write_str("Starting linux-wallpaperengine..."),
            Self::Delaying { .. } => f.write_str("Delaying post-processing..."),
            Self::PostProcessing { .. } => f.write_str("Running post-processing..."),
            Self::Applied { id } => write!(f, "Applied {id}."),
            Self::Failed { id, error } => write!(f, "Failed to apply {id}: {error}"),
        }
    }
}

/// Errors that abort or refuse an apply sequence.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// Another sequence is still applying or post-processing.
    #[error("A wallpaper is already being applied")]
    Busy,
    /// `restore` was requested but nothing has been applied yet.
    #[error("No wallpaper to restore")]
    NothingToRestore,
    /// `random` found no wallpaper that is not marked as broken.
    #[error("No wallpapers available")]
    NoWallpapers,
    /// The running renderer could not be stopped.
    #[error("Failed to stop the running renderer: {0}")]
    KillFailed(#[source] ProcessError),
    /// The new renderer could not be started.
    #[error("Failed to start the renderer: {0}")]
    SpawnFailed(#[source] ProcessError),
    /// The wallpaper path could not be resolved.
    #[error("Invalid wallpaper path {path}: {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The background apply thread could not be started.
    #[error("Failed to start apply thread: {0}")]
    Thread(#[source] std::io::Error),
}

/// Settings an apply sequence runs with.
///
/// Captured once at the start of each sequence; changing them does not
/// affect a sequence that is already running.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOptions {
    pub engine: EngineConfig,
    pub post_processing: PostProcessingConfig,
    /// Directory holding the captured screenshot.
    pub cache_root: PathBuf,
    pub volume: f64,
}

/// What the post-processing chain did. Failures are listed, never fatal.
#[derive(Debug, Default)]
pub struct PostProcessReport {
    /// Files written from the screenshot.
    pub exported: Vec<PathBuf>,
    /// Destinations skipped for an unsupported extension.
    pub skipped: Vec<PathBuf>,
    /// Human-readable descriptions of the steps that failed.
    pub failures: Vec<String>,
    pub post_command_pid: Option<Pid>,
    pub daemon_handoff: Option<DaemonHandoff>,
}

/// Outcome of a completed apply sequence.
#[derive(Debug)]
pub struct ApplyReport {
    pub id: String,
    pub renderer_pid: Pid,
    pub command_line: String,
    /// Number of renderer instances stopped first.
    pub killed: usize,
    /// `None` when post-processing is disabled.
    pub post_processing: Option<PostProcessReport>,
}

#[derive(Default)]
struct ApplyState {
    in_flight: AtomicBool,
    phase: Mutex<ApplyPhase>,
}

/// Ownership of the single-flight slot. Releasing it returns the phase to idle.
struct InFlight(Arc<ApplyState>);

impl InFlight {
    fn acquire(state: &Arc<ApplyState>) -> Result<Self, ApplyError> {
        state
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ApplyError::Busy)?;
        *state.phase.lock() = ApplyPhase::Applying;
        Ok(Self(Arc::clone(state)))
    }

    fn enter(&self, phase: ApplyPhase) { *self.0.phase.lock() = phase; }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        *self.0.phase.lock() = ApplyPhase::Idle;
        self.0.in_flight.store(false, Ordering::Release);
    }
}

/// Applies wallpapers through a [`ProcessControl`] implementation.
pub struct WallpaperManager {
    processes: Arc<dyn ProcessControl>,
    options: RwLock<ApplyOptions>,
    state: Arc<ApplyState>,
    last_applied: Mutex<Option<String>>,
    status: Option<UnboundedSender<ApplyStatus>>,
}

impl WallpaperManager {
    pub fn new(processes: Arc<dyn ProcessControl>, options: ApplyOptions) -> Self {
        Self {
            processes,
            options: RwLock::new(options),
            state: Arc::new(ApplyState::default()),
            last_applied: Mutex::new(None),
            status: None,
        }
    }

    /// Publishes status updates on `sender`.
    #[must_use]
    pub fn with_status_channel(mut self, sender: UnboundedSender<ApplyStatus>) -> Self {
        self.status = Some(sender);
        self
    }

    /// Seeds the last applied ID from persisted state. Empty means none.
    #[must_use]
    pub fn with_last_applied(self, id: &str) -> Self {
        *self.last_applied.lock() = (!id.trim().is_empty()).then(|| id.trim().to_string());
        self
    }

    /// Replaces the options used by sequences started from now on.
    pub fn set_options(&self, options: ApplyOptions) { *self.options.write() = options; }

    #[must_use]
    pub fn options(&self) -> ApplyOptions { self.options.read().clone() }

    #[must_use]
    pub fn phase(&self) -> ApplyPhase { *self.state.phase.lock() }

    #[must_use]
    pub fn is_applying(&self) -> bool { self.state.in_flight.load(Ordering::Acquire) }

    #[must_use]
    pub fn last_applied(&self) -> Option<String> { self.last_applied.lock().clone() }

    /// Returns the renderer command line `apply` would run for `path`.
    #[must_use]
    pub fn preview_command(&self, path: &Path) -> String {
        let options = self.options.read();
        CommandBuilder::from_config(&options.engine, &options.post_processing, &options.cache_root)
            .build(path, options.volume)
            .command_line
    }

    /// Stops every running renderer instance.
    ///
    /// # Errors
    ///
    /// Returns `ApplyError::KillFailed` if the process table cannot be read
    /// or a renderer cannot be signalled.
    pub fn kill_renderer(&self) -> Result<usize, ApplyError> {
        let name = process_name(&self.options.read().engine.binary);
        self.processes.kill_all_by_name(&name).map_err(ApplyError::KillFailed)
    }

    /// Runs the full apply sequence for `id` at `path` on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns `ApplyError::Busy` when another sequence is in flight, or the
    /// kill or spawn error that aborted this one.
    pub fn apply(&self, id: &str, path: &Path) -> Result<ApplyReport, ApplyError> {
        let guard = InFlight::acquire(&self.state)?;
        self.run(&guard, id, path)
    }

    /// Starts the apply sequence on a background thread.
    ///
    /// The single-flight slot is taken before returning, so a busy manager is
    /// reported here rather than from the thread.
    ///
    /// # Errors
    ///
    /// Returns `ApplyError::Busy` or `ApplyError::Thread`.
    pub fn spawn_apply(
        self: &Arc<Self>,
        id: String,
        path: PathBuf,
    ) -> Result<JoinHandle<Result<ApplyReport, ApplyError>>, ApplyError> {
        let guard = InFlight::acquire(&self.state)?;
        let manager = Arc::clone(self);

        thread::Builder::new()
            .name("apply".to_string())
            .spawn(move || manager.run(&guard, &id, &path))
            .map_err(ApplyError::Thread)
    }

    /// Resolves the last applied wallpaper inside the content directory.
    ///
    /// # Errors
    ///
    /// Returns `ApplyError::NothingToRestore` when nothing has been applied
    /// and `ApplyError::InvalidPath` when the path cannot be resolved.
    pub fn restore_target(&self) -> Result<(String, PathBuf), ApplyError> {
        let id = self.last_applied().ok_or(ApplyError::NothingToRestore)?;
        let content_dir = self.options.read().engine.content_dir.clone();
        let joined = expand(&content_dir).join(&id);
        let raw = joined.to_string_lossy().into_owned();

        let path = resolve(&raw).map_err(|source| ApplyError::InvalidPath { path: raw, source })?;
        Ok((id, path))
    }

    /// Re-applies the last applied wallpaper.
    ///
    /// # Errors
    ///
    /// See [`restore_target`](Self::restore_target) and [`apply`](Self::apply).
    pub fn restore(&self) -> Result<ApplyReport, ApplyError> {
        let (id, path) = self.restore_target()?;
        self.apply(&id, &path)
    }

    /// Applies a random wallpaper that is not marked as broken.
    ///
    /// # Errors
    ///
    /// Returns `ApplyError::NoWallpapers` if every entry is broken, or any
    /// [`apply`](Self::apply) error.
    pub fn apply_random(&self, catalog: &Catalog) -> Result<ApplyReport, ApplyError> {
        let entry = pick_random(catalog)?;
        self.apply(&entry.id, &entry.path)
    }

    fn run(&self, guard: &InFlight, id: &str, path: &Path) -> Result<ApplyReport, ApplyError> {
        let result = self.run_sequence(guard, id, path);

        match &result {
            Ok(_) => self.publish(ApplyStatus::Applied { id: id.to_string() }),
            Err(err) => {
                tracing::error!(id, error = %err, "apply failed");
                self.publish(ApplyStatus::Failed { id: id.to_string(), error: err.to_string() });
            }
        }

        result
    }

    fn run_sequence(
        &self,
        guard: &InFlight,
        id: &str,
        path: &Path,
    ) -> Result<ApplyReport, ApplyError> {
        let options = self.options();
        self.publish(ApplyStatus::Starting { id: id.to_string() });

        let killed = self
            .processes
            .kill_all_by_name(&process_name(&options.engine.binary))
            .map_err(ApplyError::KillFailed)?;

        let command = CommandBuilder::from_config(
            &options.engine,
            &options.post_processing,
            &options.cache_root,
        )
        .build(path, options.volume);

        let renderer_pid = self
            .processes
            .spawn_detached(
                &DetachedCommand::shell(&command.command_line)
                    .suppress_output(options.engine.discard_process_logs),
            )
            .map_err(ApplyError::SpawnFailed)?;

        tracing::info!(id, pid = renderer_pid, command = %command.command_line, "renderer started");

        let post_processing = match &command.screenshot {
            Some(screenshot) if options.post_processing.enabled => {
                guard.enter(ApplyPhase::PostProcessing);
                Some(self.post_process(&options, id, path, screenshot, renderer_pid))
            }
            _ => None,
        };

        *self.last_applied.lock() = Some(id.to_string());

        Ok(ApplyReport {
            id: id.to_string(),
            renderer_pid,
            command_line: command.command_line,
            killed,
            post_processing,
        })
    }

    fn post_process(
        &self,
        options: &ApplyOptions,
        id: &str,
        path: &Path,
        screenshot: &Path,
        renderer_pid: Pid,
    ) -> PostProcessReport {
        let settings = &options.post_processing;
        let suppress = options.engine.discard_process_logs;
        let mut report = PostProcessReport::default();

        if settings.artificial_delay > 0 {
            self.publish(ApplyStatus::Delaying { id: id.to_string() });
            thread::sleep(Duration::from_secs(settings.artificial_delay));
        }
        self.publish(ApplyStatus::PostProcessing { id: id.to_string() });

        let destinations: Vec<PathBuf> = settings
            .screenshot_files
            .iter()
            .filter(|file| !file.trim().is_empty())
            .map(|file| expand(file.trim()))
            .collect();

        for (destination, result) in processing::export_all(screenshot, &destinations) {
            match result {
                Ok(written) => {
                    tracing::info!(path = %written.display(), "exported screenshot");
                    report.exported.push(written);
                }
                Err(ProcessingError::UnsupportedFormat(_)) => {
                    tracing::warn!(
                        path = %destination.display(),
                        "unsupported screenshot format, skipping"
                    );
                    report.skipped.push(destination);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "screenshot export failed");
                    report.failures.push(err.to_string());
                }
            }
        }

        if !settings.post_command.trim().is_empty() {
            let vars = TemplateVars {
                screenshot: screenshot.to_string_lossy().into_owned(),
                wallpaper_path: path.to_string_lossy().into_owned(),
                wallpaper_id: id.to_string(),
                volume: format_volume(options.volume),
                pid: renderer_pid.to_string(),
            };
            let line = template::render(&settings.post_command, &vars);

            let command = DetachedCommand::shell(&line).suppress_output(suppress);
            match self.processes.spawn_detached(&command) {
                Ok(pid) => {
                    tracing::info!(pid, command = %line, "post-command started");
                    report.post_command_pid = Some(pid);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "post-command failed");
                    report.failures.push(err.to_string());
                }
            }
        }

        if settings.set_swww {
            match daemon::hand_off(self.processes.as_ref(), screenshot, suppress) {
                Ok(handoff) => report.daemon_handoff = Some(handoff),
                Err(err) => {
                    tracing::warn!(error = %err, "swww hand-off failed");
                    report.failures.push(err.to_string());
                }
            }
        }

        report
    }

    fn publish(&self, status: ApplyStatus) {
        tracing::debug!(%status, "apply status");
        if let Some(sender) = &self.status {
            let _ = sender.send(status);
        }
    }
}

/// Picks a uniformly random entry among those not marked as broken.
///
/// # Errors
///
/// Returns `ApplyError::NoWallpapers` if there is none.
pub fn pick_random(catalog: &Catalog) -> Result<&WallpaperEntry, ApplyError> {
    let candidates = catalog.non_broken();

    if candidates.is_empty() {
        return Err(ApplyError::NoWallpapers);
    }

    let index = rand::rng().random_range(0..candidates.len());
    Ok(candidates[index])
}
