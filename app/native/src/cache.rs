//! Cache directory utilities.
//!
//! Provides a centralized way to get the application's cache directory.
//! Uses `$XDG_CACHE_HOME/{APP_NAME}/` (or `~/.cache/{APP_NAME}/`), with a
//! fallback to the system temp directory if no cache directory is available.
//!
//! The renderer writes its screenshot into the cache root and thumbnails
//! live in one subdirectory per wallpaper ID.

use std::path::{Path, PathBuf};

use crate::constants::APP_NAME;

/// Returns the root cache directory for the application.
///
/// `$XDG_CACHE_HOME` wins when set and non-empty; otherwise the platform
/// cache directory is used, then the temp directory.
#[must_use]
pub fn get_cache_dir() -> PathBuf {
    if let Some(xdg_cache) = std::env::var_os("XDG_CACHE_HOME").filter(|dir| !dir.is_empty()) {
        return PathBuf::from(xdg_cache).join(APP_NAME);
    }

    dirs::cache_dir().map_or_else(
        || std::env::temp_dir().join(APP_NAME),
        |cache| cache.join(APP_NAME),
    )
}

/// Clears the entire cache directory.
///
/// # Errors
///
/// Returns an error on permission or I/O failures while removing files.
pub fn clear_cache() -> std::io::Result<u64> { clear_cache_at(&get_cache_dir()) }

/// Removes `cache_dir` and everything below it.
///
/// Returns the approximate number of bytes freed; a missing directory frees
/// nothing and is not an error.
///
/// # Errors
///
/// Returns an error on permission or I/O failures while removing files.
pub fn clear_cache_at(cache_dir: &Path) -> std::io::Result<u64> {
    if !cache_dir.exists() {
        return Ok(0);
    }

    let bytes_freed = calculate_dir_size(cache_dir)?;

    std::fs::remove_dir_all(cache_dir)?;

    Ok(bytes_freed)
}

/// Calculates the total size of a directory in bytes.
fn calculate_dir_size(path: &Path) -> std::io::Result<u64> {
    let mut total = 0u64;

    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                total += calculate_dir_size(&path)?;
            } else {
                total += entry.metadata().map(|m| m.len()).unwrap_or(0);
            }
        }
    }

    Ok(total)
}

/// Formats a byte count as a human-readable string.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Precision loss is acceptable for human-readable output
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} bytes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_cache_dir_ends_with_app_name() {
        let path = get_cache_dir();
        assert!(path.ends_with(APP_NAME), "Path should end with app name: {}", path.display());
    }

    #[test]
    fn test_clear_cache_at_missing_dir_frees_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("missing");
        assert_eq!(clear_cache_at(&missing).unwrap(), 0);
    }

    #[test]
    fn test_clear_cache_at_reports_bytes_and_removes_tree() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("cache");
        std::fs::create_dir_all(root.join("42")).unwrap();
        std::fs::write(root.join("screenshot.png"), [0u8; 100]).unwrap();
        std::fs::write(root.join("42").join("thumbnail.png"), [0u8; 28]).unwrap();

        let freed = clear_cache_at(&root).unwrap();

        assert_eq!(freed, 128);
        assert!(!root.exists());
    }

    #[test]
    fn test_format_bytes_bytes() {
        assert_eq!(format_bytes(0), "0 bytes");
        assert_eq!(format_bytes(1023), "1023 bytes");
    }

    #[test]
    fn test_format_bytes_kb() {
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
    }

    #[test]
    fn test_format_bytes_mb_and_gb() {
        assert_eq!(format_bytes(1024 * 1024), "1.00 MB");
        assert_eq!(format_bytes(1024 * 1024 * 1024), "1.00 GB");
    }
}
