#![allow(clippy::multiple_crate_versions)]

//! lwe-helper - launcher for linux-wallpaperengine.
//!
//! This binary serves as both the CLI and the interactive mode:
//! - When called with a subcommand (e.g., `lwe-helper restore`): runs it and exits
//! - When called without one: starts the interactive mode

// Emit a clear compile-time error if attempted to compile on unsupported platforms
#[cfg(not(unix))]
compile_error!("This application only supports Unix-like systems.");

fn main() {
    lwe_helper_lib::logging::init();

    if let Err(err) = lwe_helper_lib::run() {
        eprintln!("lwe-helper: {err}");
        std::process::exit(1);
    }
}
