//! lwe-helper - launcher for linux-wallpaperengine.
//!
//! This library provides the wallpaper catalog, the single-flight apply
//! pipeline that supervises the renderer process, screenshot
//! post-processing, and the CLI and interactive front ends built on them.

pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod interactive;
pub mod logging;
pub mod modules;
pub mod platform;

pub use context::AppContext;
pub use error::{Error, Result};

/// Runs the helper with the process arguments.
///
/// # Errors
///
/// Returns the error of the command that ran.
pub fn run() -> Result<()> { cli::run() }
