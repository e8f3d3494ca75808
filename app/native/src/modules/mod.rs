//! Feature modules.
//!
//! - [`process`] - process table queries, termination and detached spawning
//! - [`wallpaper`] - wallpaper catalog and apply pipeline

pub mod process;
pub mod wallpaper;
