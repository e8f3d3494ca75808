//! Cache CLI commands.

use clap::Subcommand;

use crate::cache;
use crate::error::Result;

/// Cache subcommands for managing the helper's cache.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum CacheCommands {
    /// Clear the helper's cache directory.
    ///
    /// Removes cached thumbnails and the captured screenshot. Thumbnails are
    /// regenerated the next time they are needed.
    #[command(after_long_help = r#"Examples:
  lwe-helper cache clear   # Clear all cached data"#)]
    Clear,

    /// Show the cache directory location.
    #[command(after_long_help = r#"Examples:
  lwe-helper cache path    # Print the cache directory path"#)]
    Path,
}

/// Execute cache subcommands.
///
/// # Errors
///
/// Returns an error if the cache directory cannot be removed.
pub fn execute(cmd: &CacheCommands) -> Result<()> {
    match cmd {
        CacheCommands::Clear => {
            let cache_dir = cache::get_cache_dir();
            if !cache_dir.exists() {
                println!("Cache directory does not exist. Nothing to clear.");
                return Ok(());
            }

            let freed = cache::clear_cache()?;
            println!("Cache cleared successfully. Freed {}.", cache::format_bytes(freed));
        }
        CacheCommands::Path => {
            println!("{}", cache::get_cache_dir().display());
        }
    }
    Ok(())
}
