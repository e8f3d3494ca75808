//! Renderer command construction.
//!
//! Builds the `linux-wallpaperengine` command line handed to `sh -c`:
//!
//! ```text
//! <binary> --screen-root <screen> --bg <entry> (--silent | --volume <n>)
//!          [--screenshot <cache>/screenshot.png] [--assets-dir <dir>]
//! ```

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::config::{EngineConfig, PostProcessingConfig};
use crate::constants::renderer::SCREENSHOT_FILE;
use crate::platform::path::expand;

/// A renderer invocation and the screenshot it will capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderCommand {
    /// Full command line, ready for `sh -c`.
    pub command_line: String,
    /// Screenshot written by the renderer; `None` when post-processing is off.
    pub screenshot: Option<PathBuf>,
}

/// Builds renderer invocations from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBuilder {
    binary: String,
    screen: String,
    assets_dir: Option<PathBuf>,
    screenshot: Option<PathBuf>,
}

impl CommandBuilder {
    /// Creates a builder for `binary` drawing on `screen`.
    pub fn new(binary: impl Into<String>, screen: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            screen: screen.into(),
            assets_dir: None,
            screenshot: None,
        }
    }

    /// Creates a builder from the engine and post-processing settings.
    ///
    /// The screenshot switch is only added when post-processing is enabled.
    #[must_use]
    pub fn from_config(
        engine: &EngineConfig,
        post_processing: &PostProcessingConfig,
        cache_root: &Path,
    ) -> Self {
        let mut builder = Self::new(engine.binary.trim(), engine.screen.trim());

        if !engine.assets_dir.trim().is_empty() {
            builder = builder.with_assets_dir(expand(&engine.assets_dir));
        }

        if post_processing.enabled {
            builder = builder.with_screenshot(screenshot_path(cache_root));
        }

        builder
    }

    /// Adds an `--assets-dir` switch.
    #[must_use]
    pub fn with_assets_dir(mut self, dir: PathBuf) -> Self {
        self.assets_dir = Some(dir);
        self
    }

    /// Adds a `--screenshot` switch writing to `path`.
    #[must_use]
    pub fn with_screenshot(mut self, path: PathBuf) -> Self {
        self.screenshot = Some(path);
        self
    }

    /// Builds the command line for `entry_path` at `volume`.
    ///
    /// A volume of 1 or less (or NaN) renders silently; anything above maps
    /// to `--volume` with the value rounded to an integer.
    #[must_use]
    pub fn build(&self, entry_path: &Path, volume: f64) -> RenderCommand {
        let mut parts: Vec<Cow<'_, str>> = vec![
            Cow::Borrowed(self.binary.as_str()),
            Cow::Borrowed("--screen-root"),
            shell_quote(&self.screen),
            Cow::Borrowed("--bg"),
            quote_path(entry_path),
        ];

        match volume_switch(volume) {
            Some(level) => {
                parts.push(Cow::Borrowed("--volume"));
                parts.push(Cow::Owned(level.to_string()));
            }
            None => parts.push(Cow::Borrowed("--silent")),
        }

        if let Some(screenshot) = &self.screenshot {
            parts.push(Cow::Borrowed("--screenshot"));
            parts.push(quote_path(screenshot));
        }

        if let Some(assets_dir) = &self.assets_dir {
            parts.push(Cow::Borrowed("--assets-dir"));
            parts.push(quote_path(assets_dir));
        }

        RenderCommand {
            command_line: parts.join(" "),
            screenshot: self.screenshot.clone(),
        }
    }
}

/// Returns the fixed screenshot path inside `cache_root`.
#[must_use]
pub fn screenshot_path(cache_root: &Path) -> PathBuf { cache_root.join(SCREENSHOT_FILE) }

/// Returns the `--volume` level, or `None` when the renderer should be silent.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // volume is clamped to 0..=100 upstream
pub fn volume_switch(volume: f64) -> Option<i64> {
    if volume > 1.0 {
        Some(volume.round() as i64)
    } else {
        None
    }
}

/// Formats `volume` the way it appears on the command line and in templates.
#[must_use]
pub fn format_volume(volume: f64) -> String { format!("{:.0}", volume.round()) }

/// Returns the process name of the renderer configured as `binary`.
///
/// `binary` may be a path and may carry extra arguments; only the file name
/// of the first word is matched against the process table.
#[must_use]
pub fn process_name(binary: &str) -> String {
    let program = binary.split_whitespace().next().unwrap_or_default();
    Path::new(program)
        .file_name()
        .map_or_else(|| program.to_string(), |name| name.to_string_lossy().into_owned())
}

fn quote_path(path: &Path) -> Cow<'_, str> {
    match path.to_string_lossy() {
        Cow::Borrowed(text) => shell_quote(text),
        Cow::Owned(text) => Cow::Owned(shell_quote(&text).into_owned()),
    }
}

/// Single-quotes `arg` for `sh` unless it only contains safe characters.
#[must_use]
pub fn shell_quote(arg: &str) -> Cow<'_, str> {
    let is_safe = |c: char| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c);

    if !arg.is_empty() && arg.chars().all(is_safe) {
        Cow::Borrowed(arg)
    } else {
        Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''")))
    }
}
