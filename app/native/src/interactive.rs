//! Interactive mode.
//!
//! A line-oriented shell over the same [`AppContext`] the CLI uses. The
//! control loop never waits on an apply sequence or on thumbnail generation:
//! both run on background threads and report back through status lines
//! printed by a dedicated thread.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::thread;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::cli::output;
use crate::config::SortBy;
use crate::constants::thumbnail::SIZE as THUMBNAIL_SIZE;
use crate::context::AppContext;
use crate::error::{Error, Result};
use crate::modules::process::{ProcessControl, SystemProcesses};
use crate::modules::wallpaper::ApplyStatus;
use crate::modules::wallpaper::manager::pick_random;

/// Status line shown while nothing is being applied.
pub const IDLE_STATUS: &str = "Type `apply <id>` to apply a wallpaper.";

const PROMPT: &str = "lwe> ";

/// One line typed at the prompt.
#[derive(Parser, Debug)]
#[command(multicall = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

/// Commands available at the prompt.
#[derive(Subcommand, Debug, PartialEq)]
enum ShellCommand {
    /// List wallpapers in the current order.
    #[command(visible_alias = "ls")]
    List,
    /// Show wallpapers matching a text.
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Change the sort order (date_desc, date_asc, name_asc, name_desc).
    Sort { order: SortBy },
    /// Apply a wallpaper in the background.
    Apply { id: String },
    /// Apply a random non-broken wallpaper.
    Random,
    /// Re-apply the last applied wallpaper.
    Restore,
    /// Toggle the favorite flag.
    #[command(visible_alias = "favorite")]
    Fav { id: String },
    /// Toggle the broken flag.
    Broken { id: String },
    /// Toggle hiding broken wallpapers.
    HideBroken,
    /// Show or set the renderer volume (0-100).
    Volume { value: Option<f64> },
    /// Print the renderer command for a wallpaper.
    Command { id: String },
    /// Show details of a wallpaper.
    Info { id: String },
    /// Scan the content directory again.
    Rescan,
    /// Stop every running renderer.
    Kill,
    /// Leave and save the configuration.
    #[command(visible_aliases = ["exit", "q"])]
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Runs the interactive mode until `quit` or end of input.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or saved.
pub fn run(config: Option<&Path>) -> Result<()> {
    let (sender, receiver) = mpsc::unbounded_channel();
    let processes: Arc<dyn ProcessControl> = Arc::new(SystemProcesses::new());
    let mut ctx = AppContext::load(config, processes, Some(sender))?;

    spawn_status_printer(receiver)?;
    rescan(&mut ctx);
    println!("{IDLE_STATUS} Type `help` for commands.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{PROMPT}");
        io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            println!();
            break;
        };

        match handle_line(&mut ctx, &line) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(err) => eprintln!("{} {err}", "error:".red()),
        }
    }

    ctx.save()?;
    tracing::info!(path = %ctx.config_path().display(), "configuration saved");
    Ok(())
}

fn handle_line(ctx: &mut AppContext, line: &str) -> Result<Flow> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(Flow::Continue);
    }

    match ShellLine::try_parse_from(words) {
        Ok(parsed) => dispatch(ctx, parsed.command),
        Err(err) => {
            // help and parse errors render themselves
            let _ = err.print();
            Ok(Flow::Continue)
        }
    }
}

fn dispatch(ctx: &mut AppContext, command: ShellCommand) -> Result<Flow> {
    match command {
        ShellCommand::List => output::print_entries(&ctx.view("")),
        ShellCommand::Search { query } => output::print_entries(&ctx.view(&query.join(" "))),
        ShellCommand::Sort { order } => {
            ctx.set_sort(order);
            output::print_entries(&ctx.view(""));
        }
        ShellCommand::Apply { id } => {
            let entry = ctx.find(&id)?;
            let (id, path) = (entry.id.clone(), entry.path.clone());
            ctx.manager().spawn_apply(id, path)?;
        }
        ShellCommand::Random => {
            let entry = pick_random(ctx.catalog())?;
            let (id, path) = (entry.id.clone(), entry.path.clone());
            ctx.manager().spawn_apply(id, path)?;
        }
        ShellCommand::Restore => {
            let (id, path) = ctx.manager().restore_target()?;
            ctx.manager().spawn_apply(id, path)?;
        }
        ShellCommand::Fav { id } => {
            let favorite = ctx.toggle_favorite(&id)?;
            println!("{id}: favorite {}", output::format_bool(favorite));
        }
        ShellCommand::Broken { id } => {
            let broken = ctx.toggle_broken(&id)?;
            println!("{id}: broken {}", output::format_bool(broken));
        }
        ShellCommand::HideBroken => {
            let hidden = ctx.toggle_hide_broken();
            println!("Hide broken wallpapers: {}", output::format_bool(hidden));
        }
        ShellCommand::Volume { value: None } => println!("Volume: {}", ctx.config().state.volume),
        ShellCommand::Volume { value: Some(value) } => {
            println!("Volume: {}", ctx.set_volume(value)?);
        }
        ShellCommand::Command { id } => println!("{}", ctx.command_for(&id)?),
        ShellCommand::Info { id } => output::print_entry_details(ctx.find(&id)?),
        ShellCommand::Rescan => rescan(ctx),
        ShellCommand::Kill => {
            let count = ctx.manager().kill_renderer()?;
            println!("Stopped {count} renderer process(es).");
        }
        ShellCommand::Quit => return Ok(Flow::Quit),
    }

    Ok(Flow::Continue)
}

/// Rescans the catalog and starts background thumbnail generation.
///
/// Scan errors are shown instead of the catalog.
fn rescan(ctx: &mut AppContext) {
    match ctx.rescan() {
        Ok(count) => {
            println!("Found {count} wallpapers in {}.", ctx.content_dir().display());
            spawn_thumbnails(ctx);
        }
        Err(err) => eprintln!("{} {}", "error:".red(), Error::from(err)),
    }
}

fn spawn_thumbnails(ctx: &AppContext) {
    let thumbnails = ctx.thumbnails().clone();
    let entries = ctx.catalog().entries().to_vec();

    let spawned = thread::Builder::new().name("thumbnails".to_string()).spawn(move || {
        let summary = thumbnails.generate_all(&entries, THUMBNAIL_SIZE);
        if summary.generated > 0 || summary.failed > 0 {
            output::print_thumbnail_summary(&summary);
        }
    });

    if let Err(err) = spawned {
        tracing::warn!(error = %err, "failed to start thumbnail generation");
    }
}

fn spawn_status_printer(mut receiver: UnboundedReceiver<ApplyStatus>) -> Result<()> {
    thread::Builder::new().name("status".to_string()).spawn(move || {
        while let Some(status) = receiver.blocking_recv() {
            let line = status_line(&status);
            match &status {
                ApplyStatus::Failed { .. } => println!("{}", line.red()),
                ApplyStatus::Applied { .. } => println!("{}", line.green()),
                _ => println!("{}", line.dimmed()),
            }
        }
    })?;
    Ok(())
}

/// Text printed for a status update; a finished apply points back at the prompt.
fn status_line(status: &ApplyStatus) -> String {
    match status {
        ApplyStatus::Applied { .. } => format!("{status} {IDLE_STATUS}"),
        _ => status.to_string(),
    }
}
