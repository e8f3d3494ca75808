//! CLI module for lwe-helper.
//!
//! This module provides the command-line interface. Subcommands run once and
//! exit; without a subcommand the interactive mode starts.

mod commands;
pub(crate) mod output;

use clap::Parser;
pub use commands::{Cli, Commands};

use crate::error::Result;

/// Runs the CLI.
///
/// Parses command-line arguments and executes the appropriate command.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    cli.execute()
}
