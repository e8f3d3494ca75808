//! Logging initialization using the `tracing` crate.
//!
//! This module configures the tracing subscriber with sensible defaults:
//! - Uses `RUST_LOG` environment variable for filtering (default: `info`)
//! - Writes to stderr so stdout stays clean for `list --json`, `schema` and completions
//! - Compact single-line format

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Initializes the global tracing subscriber.
///
/// This should be called once at application startup, before any logging occurs.
///
/// The log level can be controlled via the `RUST_LOG` environment variable:
/// - `RUST_LOG=debug` - Show debug and above
/// - `RUST_LOG=lwe_helper_lib=debug,warn` - Debug for the helper, warn for others
/// - `RUST_LOG=trace` - Show all logs including trace
///
/// Default level is `info` for release builds and `debug` for debug builds.
pub fn init() {
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,lwe_helper_lib={default_level},lwe_helper={default_level}"
        ))
    });

    let subscriber = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(filter).with(subscriber).try_init();
}
