//! CLI command definitions using Clap.
//!
//! This module defines all CLI commands and their arguments, organized into
//! domain-specific submodules:
//!
//! - `cache` - Cache management commands
//! - `wallpaper` - Apply, restore, kill and catalog commands

use std::io;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};

use crate::config::{self, SortBy};
use crate::error::Result;
use crate::interactive;

pub mod cache;
pub mod wallpaper;

pub use cache::CacheCommands;
pub use wallpaper::PostProcessingArgs;

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Binary name used in completions.
const BIN_NAME: &str = "lwe-helper";

/// lwe-helper - Wallpaper Engine launcher for Linux.
///
/// Run without a command to start the interactive mode.
#[derive(Parser, Debug)]
#[command(name = "lwe-helper")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a custom configuration file.
    ///
    /// Overrides the default configuration file search paths.
    /// Supports JSONC format (JSON with comments).
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum Commands {
    /// Re-apply the last applied wallpaper.
    ///
    /// Overrides only apply to this run and are not saved.
    #[command(
        visible_alias = "r",
        after_long_help = r#"Examples:
  lwe-helper restore                                  # Restore with saved settings
  lwe-helper restore --no-post-processing             # Skip post-processing
  lwe-helper restore --delay 3 --screenshot ~/wall.jpg
  lwe-helper restore --post-command 'wal -i %screenshot%' --swww"#
    )]
    Restore(PostProcessingArgs),

    /// Stop every running linux-wallpaperengine instance.
    #[command(visible_alias = "k")]
    Kill,

    /// Apply a wallpaper by ID.
    Apply {
        /// Wallpaper ID (its directory name).
        #[arg(value_name = "ID")]
        id: String,

        #[command(flatten)]
        post_processing: PostProcessingArgs,
    },

    /// Apply a random wallpaper that is not marked as broken.
    Random(PostProcessingArgs),

    /// List available wallpapers.
    #[command(after_long_help = r#"Examples:
  lwe-helper list                      # Table in the saved sort order
  lwe-helper list --sort name-asc      # Sort by title
  lwe-helper list --search rain --json # Search and print JSON"#)]
    List {
        /// Output as JSON.
        #[arg(long, short)]
        json: bool,

        /// Only show wallpapers whose title, description or tags contain this text.
        #[arg(long, short, value_name = "QUERY")]
        search: Option<String>,

        /// Sort order: date_desc, date_asc, name_asc or name_desc.
        #[arg(long, value_name = "ORDER")]
        sort: Option<SortBy>,
    },

    /// Show details of one wallpaper.
    Info {
        /// Wallpaper ID (its directory name).
        #[arg(value_name = "ID")]
        id: String,

        /// Output as JSON.
        #[arg(long, short)]
        json: bool,
    },

    /// Pre-generate thumbnails for every wallpaper.
    Thumbnails,

    /// Cache management commands.
    ///
    /// Manage the helper's cache directory.
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Output the configuration JSON Schema.
    ///
    /// Outputs a JSON Schema to stdout that describes the structure of the
    /// configuration file. Can be redirected to a file for use with editors
    /// that support JSON Schema validation.
    Schema,

    /// Generate shell completions.
    ///
    /// Outputs shell completion script to stdout for the specified shell.
    ///
    /// Usage:
    ///   eval "$(lwe-helper completions --shell zsh)"
    ///   lwe-helper completions --shell fish > ~/.config/fish/completions/lwe-helper.fish
    #[command(verbatim_doc_comment)]
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Returns the custom config path if specified via --config flag.
    #[must_use]
    pub fn config_path(&self) -> Option<PathBuf> { self.config.as_ref().map(PathBuf::from) }

    /// Execute the CLI command, or the interactive mode without one.
    ///
    /// # Errors
    ///
    /// Returns an error if the command execution fails.
    pub fn execute(&self) -> Result<()> {
        let config_path = self.config_path();
        let config = config_path.as_deref();

        match &self.command {
            None => interactive::run(config),
            Some(command) => Self::execute_command(command, config),
        }
    }

    fn execute_command(command: &Commands, config: Option<&Path>) -> Result<()> {
        match command {
            Commands::Restore(args) => wallpaper::restore(config, args),
            Commands::Kill => wallpaper::kill(config),
            Commands::Apply { id, post_processing } => {
                wallpaper::apply(config, id, post_processing)
            }
            Commands::Random(args) => wallpaper::random(config, args),
            Commands::List { json, search, sort } => {
                wallpaper::list(config, *json, search.as_deref(), *sort)
            }
            Commands::Info { id, json } => wallpaper::info(config, id, *json),
            Commands::Thumbnails => wallpaper::thumbnails(config),
            Commands::Cache(cmd) => cache::execute(cmd),
            Commands::Schema => {
                println!("{}", config::print_schema()?);
                Ok(())
            }
            Commands::Completions { shell } => {
                Self::print_completions(*shell);
                Ok(())
            }
        }
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        generate(generator, &mut cmd, BIN_NAME, &mut io::stdout());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // CLI parsing tests
    // ========================================================================

    #[test]
    fn test_cli_without_command_is_interactive() {
        let cli = Cli::try_parse_from(["lwe-helper"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parses_restore() {
        let cli = Cli::try_parse_from(["lwe-helper", "restore"]).unwrap();
        match cli.command {
            Some(Commands::Restore(args)) => assert_eq!(args, PostProcessingArgs::default()),
            _ => panic!("Expected Restore command"),
        }
    }

    #[test]
    fn test_cli_parses_restore_alias_and_overrides() {
        let cli = Cli::try_parse_from([
            "lwe-helper",
            "r",
            "--no-post-processing",
            "--delay",
            "5",
            "--screenshot",
            "/tmp/a.png",
            "--screenshot",
            "/tmp/b.bmp",
            "--command",
            "notify-send %wallpaperId%",
            "--swww",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Restore(args)) => {
                let overrides = args.overrides();
                assert_eq!(overrides.enabled, Some(false));
                assert_eq!(overrides.artificial_delay, Some(5));
                assert_eq!(
                    overrides.screenshot_files,
                    Some(vec!["/tmp/a.png".to_string(), "/tmp/b.bmp".to_string()])
                );
                assert_eq!(overrides.post_command.as_deref(), Some("notify-send %wallpaperId%"));
                assert_eq!(overrides.set_swww, Some(true));
            }
            _ => panic!("Expected Restore command"),
        }
    }

    #[test]
    fn test_cli_last_toggle_wins() {
        let cli = Cli::try_parse_from([
            "lwe-helper",
            "restore",
            "--post-processing",
            "--no-post-processing",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Restore(args)) => assert_eq!(args.overrides().enabled, Some(false)),
            _ => panic!("Expected Restore command"),
        }
    }

    #[test]
    fn test_cli_parses_kill_alias() {
        let cli = Cli::try_parse_from(["lwe-helper", "k"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Kill)));
    }

    #[test]
    fn test_cli_parses_apply() {
        let cli =
            Cli::try_parse_from(["lwe-helper", "apply", "2882917381", "--artificial-delay", "0"])
                .unwrap();
        match cli.command {
            Some(Commands::Apply { id, post_processing }) => {
                assert_eq!(id, "2882917381");
                assert_eq!(post_processing.artificial_delay, Some(0));
            }
            _ => panic!("Expected Apply command"),
        }
    }

    #[test]
    fn test_cli_parses_delay_with_seconds_suffix() {
        let cli = Cli::try_parse_from(["lwe-helper", "restore", "--delay=2s"]).unwrap();
        match cli.command {
            Some(Commands::Restore(args)) => assert_eq!(args.artificial_delay, Some(2)),
            _ => panic!("Expected Restore command"),
        }

        assert!(Cli::try_parse_from(["lwe-helper", "restore", "--delay", "soon"]).is_err());
    }

    #[test]
    fn test_cli_apply_requires_id() {
        assert!(Cli::try_parse_from(["lwe-helper", "apply"]).is_err());
    }

    #[test]
    fn test_cli_parses_random() {
        let cli = Cli::try_parse_from(["lwe-helper", "random", "--no-swww"]).unwrap();
        match cli.command {
            Some(Commands::Random(args)) => assert_eq!(args.overrides().set_swww, Some(false)),
            _ => panic!("Expected Random command"),
        }
    }

    #[test]
    fn test_cli_parses_list() {
        let cli = Cli::try_parse_from([
            "lwe-helper",
            "list",
            "--json",
            "--search",
            "rain",
            "--sort",
            "name-asc",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::List { json, search, sort }) => {
                assert!(json);
                assert_eq!(search.as_deref(), Some("rain"));
                assert_eq!(sort, Some(SortBy::NameAsc));
            }
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_sort() {
        assert!(Cli::try_parse_from(["lwe-helper", "list", "--sort", "random"]).is_err());
    }

    #[test]
    fn test_cli_parses_info() {
        let cli = Cli::try_parse_from(["lwe-helper", "info", "123", "--json"]).unwrap();
        match cli.command {
            Some(Commands::Info { id, json }) => {
                assert_eq!(id, "123");
                assert!(json);
            }
            _ => panic!("Expected Info command"),
        }
    }

    #[test]
    fn test_cli_parses_thumbnails() {
        let cli = Cli::try_parse_from(["lwe-helper", "thumbnails"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Thumbnails)));
    }

    #[test]
    fn test_cli_parses_cache_commands() {
        let cli = Cli::try_parse_from(["lwe-helper", "cache", "clear"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Cache(CacheCommands::Clear))));

        let cli = Cli::try_parse_from(["lwe-helper", "cache", "path"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Cache(CacheCommands::Path))));
    }

    #[test]
    fn test_cli_parses_schema() {
        let cli = Cli::try_parse_from(["lwe-helper", "schema"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Schema)));
    }

    #[test]
    fn test_cli_parses_completions() {
        let cli = Cli::try_parse_from(["lwe-helper", "completions", "--shell", "zsh"]).unwrap();
        match cli.command {
            Some(Commands::Completions { shell }) => assert_eq!(shell, Shell::Zsh),
            _ => panic!("Expected Completions command"),
        }
    }

    // ========================================================================
    // --config flag tests
    // ========================================================================

    #[test]
    fn test_cli_parses_config_flag() {
        let cli =
            Cli::try_parse_from(["lwe-helper", "--config", "/path/to/config.json", "kill"])
                .unwrap();
        assert_eq!(cli.config, Some("/path/to/config.json".to_string()));
        assert!(matches!(cli.command, Some(Commands::Kill)));
    }

    #[test]
    fn test_cli_parses_config_flag_after_subcommand() {
        let cli =
            Cli::try_parse_from(["lwe-helper", "restore", "-c", "/path/to/config.json"]).unwrap();
        assert_eq!(cli.config_path(), Some(PathBuf::from("/path/to/config.json")));
    }

    #[test]
    fn test_cli_config_flag_without_command() {
        let cli = Cli::try_parse_from(["lwe-helper", "--config", "/path/to/config.json"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config_path().is_some());
    }

    #[test]
    fn test_cli_definition_is_valid() { Cli::command().debug_assert(); }

    #[test]
    fn test_app_version_is_not_empty() {
        assert!(!APP_VERSION.is_empty());
    }
}
