//! Error types for lwe-helper.
//!
//! Each component owns a focused error enum; this module folds them into a
//! single [`Error`] that CLI handlers and the interactive shell return.

use thiserror::Error;

use crate::config::ConfigError;
use crate::modules::wallpaper::{ApplyError, CatalogError};

/// Errors that can occur during application execution.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid command arguments.
    #[error("{0}")]
    InvalidArguments(String),
    /// No catalog entry carries the requested ID.
    #[error("Wallpaper not found: {0}")]
    EntryNotFound(String),
    /// Configuration could not be loaded or saved.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The content directory could not be scanned.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// An apply sequence was rejected or aborted.
    #[error(transparent)]
    Apply(#[from] ApplyError),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
