//! Wallpaper catalog and apply pipeline.
//!
//! - [`catalog`] - content directory scanning, sorting and search
//! - [`command`] - renderer command lines
//! - [`manager`] - single-flight apply sequence
//! - [`processing`] - screenshot export
//! - [`template`] - post-command placeholders
//! - [`daemon`] - `swww` hand-off
//! - [`thumbnail`] - preview thumbnail cache

pub mod catalog;
pub mod command;
pub mod daemon;
pub mod manager;
pub mod processing;
pub mod template;
pub mod thumbnail;


pub use catalog::{Catalog, CatalogError, Manifest, WallpaperEntry};
pub use command::{CommandBuilder, RenderCommand};
pub use manager::{ApplyError, ApplyOptions, ApplyPhase, ApplyReport, ApplyStatus, WallpaperManager};
pub use processing::ProcessingError;
pub use thumbnail::{ThumbnailCache, ThumbnailError};
