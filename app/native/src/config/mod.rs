//! Configuration module for lwe-helper.
//!
//! This module provides configuration types, loading and saving, and JSON
//! Schema generation. There is no global configuration instance: the loaded
//! value is owned by [`crate::context::AppContext`].
//!
//! The configuration file supports JSONC format (JSON with comments).
//! Both single-line (`//`) and multi-line (`/* */`) comments are allowed.

pub mod types;

use std::path::{Path, PathBuf};

pub use types::{
    CONFIG_FILE_NAMES, ConfigError, EngineConfig, HelperConfig, PostProcessingConfig, SavedState,
    SortBy, config_dir, config_paths, load_config as load_config_default, load_config_from_path,
    save_config,
};

/// Loads the configuration, creating a default file on first run.
///
/// A custom path (from `--config`) must exist. Without one the default search
/// paths are used; when none exists a default `config.json` is written to the
/// configuration directory and defaults are returned.
///
/// # Errors
///
/// Returns an error if the custom file is missing or any file found cannot be
/// read or parsed.
pub fn load_or_create(custom: Option<&Path>) -> Result<(HelperConfig, PathBuf), ConfigError> {
    if let Some(path) = custom {
        let config = load_config_from_path(path)?;
        return Ok((config, path.to_path_buf()));
    }

    match load_config_default() {
        Ok(loaded) => Ok(loaded),
        Err(ConfigError::NotFound(_)) => {
            Ok((HelperConfig::default(), create_default_config_file()))
        }
        Err(err) => Err(err),
    }
}

/// Writes a default configuration file and returns its path.
///
/// Failures are logged; the path is returned regardless so a later save can
/// retry.
fn create_default_config_file() -> PathBuf {
    let path = config_dir().join("config.json");

    match save_config(&HelperConfig::default(), &path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "created default configuration file");
        }
        Err(err) => {
            tracing::warn!(
                error = %err,
                path = %path.display(),
                "failed to create default configuration file"
            );
        }
    }

    path
}

/// Returns the JSON Schema of the configuration file, pretty-printed.
///
/// # Errors
///
/// Returns an error if the schema cannot be serialized.
pub fn print_schema() -> Result<String, serde_json::Error> {
    let schema = schemars::schema_for!(HelperConfig);
    serde_json::to_string_pretty(&schema)
}
