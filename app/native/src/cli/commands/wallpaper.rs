//! Wallpaper CLI commands.
//!
//! Handlers for `restore`, `kill`, `apply`, `random`, `list`, `info` and
//! `thumbnails`. Each handler builds its own [`AppContext`] backed by the
//! real process table.

use std::path::Path;
use std::sync::Arc;

use clap::Args;

use crate::cli::output;
use crate::config::SortBy;
use crate::context::{AppContext, PostProcessingOverrides};
use crate::error::Result;
use crate::modules::process::SystemProcesses;

/// Post-processing overrides shared by `restore`, `apply` and `random`.
///
/// Overrides only affect the current run and are never saved.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct PostProcessingArgs {
    /// Enable post-processing for this run.
    #[arg(long, overrides_with = "no_post_processing")]
    pub post_processing: bool,

    /// Disable post-processing for this run.
    #[arg(long, overrides_with = "post_processing")]
    pub no_post_processing: bool,

    /// Seconds to wait before reading the screenshot (`2` or `2s`).
    #[arg(long, visible_alias = "delay", value_name = "SECONDS", value_parser = parse_delay)]
    pub artificial_delay: Option<u64>,

    /// Destination file for the screenshot. Repeat for several files.
    #[arg(long = "screenshot", value_name = "PATH")]
    pub screenshots: Vec<String>,

    /// Command to run after post-processing (supports placeholders).
    #[arg(long, visible_alias = "command", value_name = "COMMAND")]
    pub post_command: Option<String>,

    /// Hand the screenshot to swww.
    #[arg(long, overrides_with = "no_swww")]
    pub swww: bool,

    /// Do not hand the screenshot to swww.
    #[arg(long, overrides_with = "swww")]
    pub no_swww: bool,
}

impl PostProcessingArgs {
    /// Converts the flags into overrides; absent flags keep the configured value.
    #[must_use]
    pub fn overrides(&self) -> PostProcessingOverrides {
        PostProcessingOverrides {
            enabled: flag(self.post_processing, self.no_post_processing),
            artificial_delay: self.artificial_delay,
            screenshot_files: (!self.screenshots.is_empty()).then(|| self.screenshots.clone()),
            post_command: self.post_command.clone(),
            set_swww: flag(self.swww, self.no_swww),
        }
    }
}

/// Parses a delay in whole seconds, with or without an `s` suffix.
fn parse_delay(value: &str) -> std::result::Result<u64, String> {
    let trimmed = value.trim();
    let seconds = trimmed.strip_suffix('s').unwrap_or(trimmed);

    seconds
        .parse()
        .map_err(|_| format!("invalid delay '{value}' (expected seconds, e.g. 2 or 2s)"))
}

const fn flag(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

fn load_context(config: Option<&Path>) -> Result<AppContext> {
    AppContext::load(config, Arc::new(SystemProcesses::new()), None)
}

/// Re-applies the last applied wallpaper.
///
/// # Errors
///
/// Returns an error if nothing was applied before or the sequence fails.
pub fn restore(config: Option<&Path>, args: &PostProcessingArgs) -> Result<()> {
    let ctx = load_context(config)?;
    ctx.override_post_processing(&args.overrides());

    let report = ctx.manager().restore()?;
    output::print_apply_report(&report);
    Ok(())
}

/// Stops every running renderer instance.
///
/// # Errors
///
/// Returns an error if a renderer cannot be terminated.
pub fn kill(config: Option<&Path>) -> Result<()> {
    let ctx = load_context(config)?;

    match ctx.manager().kill_renderer()? {
        0 => println!("No renderer running."),
        count => println!("Stopped {count} renderer process(es)."),
    }
    Ok(())
}

/// Applies the wallpaper `id` and remembers it.
///
/// # Errors
///
/// Returns an error if the catalog cannot be scanned, the ID is unknown or
/// the sequence fails.
pub fn apply(config: Option<&Path>, id: &str, args: &PostProcessingArgs) -> Result<()> {
    let mut ctx = load_context(config)?;
    ctx.rescan()?;
    ctx.override_post_processing(&args.overrides());

    let entry = ctx.find(id)?.clone();
    let report = ctx.manager().apply(&entry.id, &entry.path)?;
    ctx.save()?;

    output::print_apply_report(&report);
    Ok(())
}

/// Applies a random non-broken wallpaper and remembers it.
///
/// # Errors
///
/// Returns an error if the catalog cannot be scanned, every entry is broken
/// or the sequence fails.
pub fn random(config: Option<&Path>, args: &PostProcessingArgs) -> Result<()> {
    let mut ctx = load_context(config)?;
    ctx.rescan()?;
    ctx.override_post_processing(&args.overrides());

    let report = ctx.manager().apply_random(ctx.catalog())?;
    ctx.save()?;

    output::print_apply_report(&report);
    Ok(())
}

/// Lists the catalog.
///
/// # Errors
///
/// Returns an error if the catalog cannot be scanned.
pub fn list(
    config: Option<&Path>,
    json: bool,
    search: Option<&str>,
    sort: Option<SortBy>,
) -> Result<()> {
    let mut ctx = load_context(config)?;
    ctx.rescan()?;
    if let Some(sort) = sort {
        ctx.set_sort(sort);
    }

    let entries = ctx.view(search.unwrap_or_default());

    if json {
        let summaries: Vec<output::EntrySummary> = entries.iter().map(Into::into).collect();
        output::print_json(&summaries)?;
    } else {
        output::print_entries(&entries);
    }
    Ok(())
}

/// Shows the details of one wallpaper.
///
/// # Errors
///
/// Returns an error if the catalog cannot be scanned or the ID is unknown.
pub fn info(config: Option<&Path>, id: &str, json: bool) -> Result<()> {
    let mut ctx = load_context(config)?;
    ctx.rescan()?;
    let entry = ctx.find(id)?;

    if json {
        output::print_json(&output::EntrySummary::from(entry))?;
    } else {
        output::print_entry_details(entry);
    }
    Ok(())
}

/// Generates every missing thumbnail.
///
/// # Errors
///
/// Returns an error if the catalog cannot be scanned.
pub fn thumbnails(config: Option<&Path>) -> Result<()> {
    let mut ctx = load_context(config)?;
    let count = ctx.rescan()?;
    println!("Generating thumbnails for {count} wallpapers...");

    let summary = ctx.generate_thumbnails();
    output::print_thumbnail_summary(&summary);
    Ok(())
}
