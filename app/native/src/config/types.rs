//! Configuration types for lwe-helper.
//!
//! This module provides the configuration types and loading functionality.
//! The configuration file supports JSONC format (JSON with comments).
//! Both single-line (`//`) and multi-line (`/* */`) comments are allowed.
//!
//! Unlike most of the settings, the `state` section is written back by the
//! helper itself (last applied wallpaper, favorites, volume, ...).

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{APP_NAME, catalog, post_processing, renderer};

/// Sort criterion for the wallpaper catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Most recently modified first.
    #[default]
    DateDesc,
    /// Oldest first.
    DateAsc,
    /// Title, A to Z.
    NameAsc,
    /// Title, Z to A.
    NameDesc,
}

impl SortBy {
    /// Returns the configuration value for this criterion.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DateDesc => "date_desc",
            Self::DateAsc => "date_asc",
            Self::NameAsc => "name_asc",
            Self::NameDesc => "name_desc",
        }
    }
}

impl std::fmt::Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortBy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "date_desc" => Ok(Self::DateDesc),
            "date_asc" => Ok(Self::DateAsc),
            "name_asc" => Ok(Self::NameAsc),
            "name_desc" => Ok(Self::NameDesc),
            other => Err(format!(
                "Unknown sort criterion '{other}' (expected date_desc, date_asc, name_asc or name_desc)"
            )),
        }
    }
}

/// Renderer and content settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Renderer executable (name on `PATH` or absolute path).
    /// Default: "linux-wallpaperengine"
    pub binary: String,

    /// Directory holding one subdirectory per wallpaper.
    /// Default: "~/.steam/steam/steamapps/workshop/content/431960"
    pub content_dir: String,

    /// Optional renderer asset directory, passed as `--assets-dir` when set.
    pub assets_dir: String,

    /// Output the renderer draws on, passed as `--screen-root`.
    /// Default: "HDMI-A-1"
    pub screen: String,

    /// Redirect stdin/stdout/stderr of spawned processes to `/dev/null`.
    /// Default: true
    pub discard_process_logs: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: renderer::BINARY.to_string(),
            content_dir: catalog::DEFAULT_CONTENT_DIR.to_string(),
            assets_dir: String::new(),
            screen: renderer::DEFAULT_SCREEN.to_string(),
            discard_process_logs: true,
        }
    }
}

/// Steps run after the renderer has been started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct PostProcessingConfig {
    /// Enable screenshot capture and the post-processing chain.
    pub enabled: bool,

    /// Seconds to wait before the captured screenshot is read.
    /// Default: 1
    pub artificial_delay: u64,

    /// Destination files for the screenshot (`.png`, `.jpg`, `.jpeg` or `.bmp`).
    /// A path without an extension gets `.png`.
    pub screenshot_files: Vec<String>,

    /// Command run after the screenshot is exported.
    /// Placeholders: `%screenshot%`, `%wallpaperPath%`, `%wallpaperId%`, `%volume%`, `%pid%`.
    pub post_command: String,

    /// Hand the screenshot to `swww`, starting `swww-daemon` when needed.
    pub set_swww: bool,
}

impl Default for PostProcessingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            artificial_delay: post_processing::DEFAULT_DELAY_SECS,
            screenshot_files: vec![
                config_dir().join(renderer::SCREENSHOT_FILE).to_string_lossy().into_owned(),
            ],
            post_command: String::new(),
            set_swww: false,
        }
    }
}

/// State written back by the helper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct SavedState {
    /// ID of the last successfully applied wallpaper.
    pub last_set_id: String,

    /// Catalog sort criterion.
    pub sort_by: SortBy,

    /// Renderer volume, 0 to 100.
    pub volume: f64,

    /// Remove broken wallpapers from listings instead of moving them last.
    pub hide_broken: bool,

    /// IDs of favorite wallpapers.
    pub favorites: BTreeSet<String>,

    /// IDs of wallpapers marked as broken.
    pub broken: BTreeSet<String>,
}

impl Default for SavedState {
    fn default() -> Self {
        Self {
            last_set_id: String::new(),
            sort_by: SortBy::default(),
            volume: renderer::DEFAULT_VOLUME,
            hide_broken: false,
            favorites: BTreeSet::new(),
            broken: BTreeSet::new(),
        }
    }
}

impl SavedState {
    /// Flips favorite membership for `id`, returning the new membership.
    pub fn toggle_favorite(&mut self, id: &str) -> bool { toggle(&mut self.favorites, id) }

    /// Flips broken membership for `id`, returning the new membership.
    pub fn toggle_broken(&mut self, id: &str) -> bool { toggle(&mut self.broken, id) }
}

fn toggle(set: &mut BTreeSet<String>, id: &str) -> bool {
    if set.remove(id) {
        false
    } else {
        set.insert(id.to_string());
        true
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct HelperConfig {
    /// Renderer and content settings.
    pub engine: EngineConfig,

    /// Post-processing chain.
    pub post_processing: PostProcessingConfig,

    /// Persisted UI state.
    pub state: SavedState,
}

impl HelperConfig {
    /// Replaces unusable values with defaults.
    ///
    /// Empty renderer binary, content directory or screen fall back to their
    /// defaults and the volume is clamped into `0..=100`.
    pub fn validate(&mut self) {
        let defaults = EngineConfig::default();

        if self.engine.binary.trim().is_empty() {
            tracing::warn!(default = %defaults.binary, "empty renderer binary, using default");
            self.engine.binary = defaults.binary;
        }
        if self.engine.content_dir.trim().is_empty() {
            tracing::warn!(
                default = %defaults.content_dir,
                "empty content directory, using default"
            );
            self.engine.content_dir = defaults.content_dir;
        }
        if self.engine.screen.trim().is_empty() {
            self.engine.screen = defaults.screen;
        }

        self.state.volume = if self.state.volume.is_finite() {
            self.state.volume.clamp(0.0, renderer::MAX_VOLUME)
        } else {
            renderer::DEFAULT_VOLUME
        };
    }
}

/// Errors that can occur when loading or saving the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No configuration file was found in any of the expected locations.
    #[error("No configuration file found at {0}")]
    NotFound(PathBuf),
    /// The configuration file exists but could not be read or written.
    #[error("Failed to access configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The configuration file contains invalid JSON.
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The configuration could not be serialized.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ConfigError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }
}

/// Configuration file names to search for (in priority order).
pub const CONFIG_FILE_NAMES: &[&str] = &["config.jsonc", "config.json"];

/// Returns the helper's configuration directory.
///
/// `$XDG_CONFIG_HOME/{APP_NAME}` when set, otherwise the platform config
/// directory, otherwise `~/.config/{APP_NAME}`.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(xdg_config) = std::env::var_os("XDG_CONFIG_HOME").filter(|dir| !dir.is_empty()) {
        return PathBuf::from(xdg_config).join(APP_NAME);
    }

    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join(APP_NAME)
}

/// Returns the possible configuration file paths in priority order.
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let dir = config_dir();
    CONFIG_FILE_NAMES.iter().map(|name| dir.join(name)).collect()
}

/// Loads and validates the configuration at `path`.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if the file does not exist, `ConfigError::Io`
/// if it cannot be read and `ConfigError::Parse` if it contains invalid JSON.
pub fn load_config_from_path(path: &Path) -> Result<HelperConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let file = fs::File::open(path).map_err(|err| ConfigError::io(path, err))?;
    // Strip comments from JSONC before parsing
    let reader = json_comments::StripComments::new(file);
    let mut config: HelperConfig = serde_json::from_reader(reader)
        .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;

    config.validate();
    Ok(config)
}

/// Loads the configuration from the first available config file.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if no configuration file exists, or the
/// load error of the first file found.
pub fn load_config() -> Result<(HelperConfig, PathBuf), ConfigError> {
    let paths = config_paths();

    for path in &paths {
        if path.exists() {
            let config = load_config_from_path(path)?;
            return Ok((config, path.clone()));
        }
    }

    Err(ConfigError::NotFound(paths.into_iter().next().unwrap_or_default()))
}

/// Writes `config` to `path` as pretty-printed JSON, creating parent directories.
///
/// # Errors
///
/// Returns an error if serialization fails or the file cannot be written.
pub fn save_config(config: &HelperConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        crate::platform::path::ensure_dir(parent).map_err(|err| ConfigError::io(parent, err))?;
    }

    let mut json = serde_json::to_string_pretty(config)?;
    json.push('\n');
    fs::write(path, json).map_err(|err| ConfigError::io(path, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = HelperConfig::default();
        assert_eq!(config.engine.binary, "linux-wallpaperengine");
        assert_eq!(config.engine.screen, "HDMI-A-1");
        assert!(config.engine.discard_process_logs);
        assert!(config.engine.assets_dir.is_empty());
        assert!(!config.post_processing.enabled);
        assert_eq!(config.post_processing.artificial_delay, 1);
        assert_eq!(config.post_processing.screenshot_files.len(), 1);
        assert!(config.post_processing.screenshot_files[0].ends_with("screenshot.png"));
        assert_eq!(config.state.sort_by, SortBy::DateDesc);
        assert!((config.state.volume - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_deserializes_camel_case_with_comments() {
        let json = r#"{
            // renderer settings
            "engine": { "binary": "/opt/lwe/linux-wallpaperengine", "assetsDir": "~/assets" },
            /* post processing */
            "postProcessing": { "enabled": true, "artificialDelay": 3, "setSwww": true },
            "state": { "sortBy": "name_asc", "favorites": ["1", "2"], "lastSetId": "42" }
        }"#;
        let reader = json_comments::StripComments::new(json.as_bytes());
        let config: HelperConfig = serde_json::from_reader(reader).unwrap();

        assert_eq!(config.engine.binary, "/opt/lwe/linux-wallpaperengine");
        assert_eq!(config.engine.assets_dir, "~/assets");
        assert_eq!(config.engine.screen, "HDMI-A-1");
        assert!(config.post_processing.enabled);
        assert_eq!(config.post_processing.artificial_delay, 3);
        assert!(config.post_processing.set_swww);
        assert_eq!(config.state.sort_by, SortBy::NameAsc);
        assert_eq!(config.state.last_set_id, "42");
        assert!(config.state.favorites.contains("2"));
    }

    #[test]
    fn test_validate_restores_empty_fields_and_clamps_volume() {
        let mut config = HelperConfig::default();
        config.engine.binary = String::new();
        config.engine.content_dir = "  ".to_string();
        config.engine.screen = String::new();
        config.state.volume = 250.0;

        config.validate();

        assert_eq!(config.engine.binary, "linux-wallpaperengine");
        assert_eq!(config.engine.content_dir, catalog::DEFAULT_CONTENT_DIR);
        assert_eq!(config.engine.screen, "HDMI-A-1");
        assert!((config.state.volume - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_negative_volume_clamps_to_zero() {
        let mut config = HelperConfig::default();
        config.state.volume = -5.0;
        config.validate();
        assert!(config.state.volume.abs() < f64::EPSILON);
    }

    #[test]
    fn test_toggle_favorite_flips_membership() {
        let mut state = SavedState::default();
        assert!(state.toggle_favorite("100"));
        assert!(state.favorites.contains("100"));
        assert!(!state.toggle_favorite("100"));
        assert!(state.favorites.is_empty());
    }

    #[test]
    fn test_toggle_broken_is_independent_of_favorites() {
        let mut state = SavedState::default();
        state.toggle_favorite("7");
        assert!(state.toggle_broken("7"));
        assert!(state.favorites.contains("7"));
        assert!(state.broken.contains("7"));
    }

    #[test]
    fn test_sort_by_from_str() {
        assert_eq!("date_asc".parse::<SortBy>().unwrap(), SortBy::DateAsc);
        assert_eq!("Name-Desc".parse::<SortBy>().unwrap(), SortBy::NameDesc);
        assert!("size".parse::<SortBy>().is_err());
    }

    #[test]
    fn test_sort_by_serializes_snake_case() {
        let json = serde_json::to_string(&SortBy::NameDesc).unwrap();
        assert_eq!(json, "\"name_desc\"");
    }

    #[test]
    fn test_config_paths_prefer_jsonc() {
        let paths = config_paths();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("config.jsonc"));
        assert!(paths[1].ends_with("config.json"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested").join("config.json");

        let mut config = HelperConfig::default();
        config.state.last_set_id = "2882917381".to_string();
        config.state.broken.insert("1".to_string());
        config.post_processing.post_command = "notify-send %wallpaperId%".to_string();

        save_config(&config, &path).unwrap();
        let loaded = load_config_from_path(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_into_file_occupied_directory_fails() {
        let temp = tempfile::tempdir().unwrap();
        let occupied = temp.path().join("linux-wallpaperengine-helper");
        fs::write(&occupied, "not a directory").unwrap();

        let err = save_config(&HelperConfig::default(), &occupied.join("config.json")).unwrap_err();

        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let temp = tempfile::tempdir().unwrap();
        let err = load_config_from_path(&temp.path().join("config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_json_is_parse_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_config_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
