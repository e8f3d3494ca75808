//! Path utilities for shell-like path expansion.
//!
//! This module provides centralized path expansion functionality,
//! supporting tilde (`~`) expansion, relative path resolution and
//! directory creation for the config and cache roots.

use std::fs::DirBuilder;
use std::io;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

/// Permission bits for directories created by the helper.
const DIR_MODE: u32 = 0o755;

/// Expands shell-like paths (tilde) to absolute paths.
///
/// The path can be:
/// - Absolute (starts with `/`): returned as-is
/// - Home-relative (starts with `~`): expanded to the user's home directory
/// - Relative: returned as-is (use [`resolve`] to make it absolute)
///
/// # Examples
///
/// ```ignore
/// use lwe_helper_lib::platform::path::expand;
///
/// let content = expand("~/.steam/steam/steamapps/workshop/content/431960");
/// assert!(!content.to_string_lossy().starts_with("~"));
/// ```
#[must_use]
pub fn expand(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return PathBuf::new();
    }

    let expanded = shellexpand::tilde(path);
    PathBuf::from(expanded.as_ref())
}

/// Expands a leading `~` and makes the path absolute against the current directory.
///
/// The path does not need to exist.
///
/// # Errors
///
/// Returns an error if the path is empty or the current directory cannot be read.
pub fn resolve(path: &str) -> io::Result<PathBuf> {
    let expanded = expand(path);

    if expanded.as_os_str().is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "path is empty"));
    }

    std::path::absolute(expanded)
}

/// Makes `dir` absolute and creates it (and parents) with mode `0755` unless
/// a directory already exists there. Returns the absolute path.
///
/// # Errors
///
/// Returns an error if the path is empty, creation fails, or a non-directory
/// already occupies the path.
pub fn ensure_dir(dir: &Path) -> io::Result<PathBuf> {
    if dir.as_os_str().is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "path is empty"));
    }

    let resolved = std::path::absolute(dir)?;

    if resolved.is_dir() {
        return Ok(resolved);
    }

    if resolved.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} exists and is not a directory", resolved.display()),
        ));
    }

    DirBuilder::new().recursive(true).mode(DIR_MODE).create(&resolved)?;
    Ok(resolved)
}
