//! CLI output formatting utilities.
//!
//! This module provides utilities for formatting CLI output including:
//! - Tables for the wallpaper catalog
//! - JSON output with syntax highlighting on terminals
//! - Apply and thumbnail summaries

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use colored::Colorize;
use serde::Serialize;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use crate::modules::wallpaper::thumbnail::GenerationSummary;
use crate::modules::wallpaper::{ApplyReport, WallpaperEntry};

/// JSON view of a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub path: PathBuf,
    pub preview: Option<PathBuf>,
    pub thumbnail: Option<PathBuf>,
    /// Seconds since the Unix epoch.
    pub modified: Option<u64>,
    pub favorite: bool,
    pub broken: bool,
}

impl From<&WallpaperEntry> for EntrySummary {
    fn from(entry: &WallpaperEntry) -> Self {
        Self {
            id: entry.id.clone(),
            title: entry.manifest.title.clone(),
            description: entry.manifest.description.clone(),
            tags: entry.manifest.tags.clone(),
            path: entry.path.clone(),
            preview: entry.preview_path.clone(),
            thumbnail: entry.thumbnail_path.clone(),
            modified: entry
                .modified
                .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
                .map(|elapsed| elapsed.as_secs()),
            favorite: entry.is_favorite,
            broken: entry.is_broken,
        }
    }
}

/// Prints `value` as pretty JSON, highlighted when stdout is a terminal.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    if std::io::stdout().is_terminal() {
        print_highlighted_json(&serde_json::to_value(value)?);
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

/// Prints the catalog as a table.
pub fn print_entries(entries: &[WallpaperEntry]) {
    #[derive(Tabled)]
    struct EntryRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Tags")]
        tags: String,
        #[tabled(rename = "Favorite")]
        favorite: String,
        #[tabled(rename = "Broken")]
        broken: String,
    }

    if entries.is_empty() {
        println!("{}", "No wallpapers found.".dimmed());
        return;
    }

    let rows: Vec<EntryRow> = entries
        .iter()
        .map(|entry| EntryRow {
            id: entry.id.clone(),
            title: truncate(&entry.manifest.title, 40),
            tags: truncate(&entry.manifest.tags.join(", "), 30),
            favorite: format_flag(entry.is_favorite),
            broken: format_flag(entry.is_broken),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::first()).with(Alignment::right()))
        .with(Modify::new(Columns::new(3..5)).with(Alignment::center()))
        .to_string();

    println!("{}", format!("Wallpapers ({})", entries.len()).bold());
    println!("{table}");
}

/// Prints every detail of one entry.
pub fn print_entry_details(entry: &WallpaperEntry) {
    let label = |name: &str| format!("{name:>12}").cyan().bold();
    let optional = |path: Option<&PathBuf>| {
        path.map_or_else(|| "-".dimmed().to_string(), |path| path.display().to_string())
    };

    println!("{} {}", label("ID:"), entry.id);
    println!("{} {}", label("Title:"), entry.manifest.title.bold());
    println!("{} {}", label("Description:"), entry.manifest.description);
    println!("{} {}", label("Tags:"), entry.manifest.tags.join(", "));
    println!("{} {}", label("Path:"), entry.path.display());
    println!("{} {}", label("Preview:"), optional(entry.preview_path.as_ref()));
    println!("{} {}", label("Thumbnail:"), optional(entry.thumbnail_path.as_ref()));
    println!("{} {}", label("Favorite:"), format_bool(entry.is_favorite));
    println!("{} {}", label("Broken:"), format_bool(entry.is_broken));
}

/// Prints what an apply sequence did.
pub fn print_apply_report(report: &ApplyReport) {
    println!(
        "{} {} {}",
        "Applied".green().bold(),
        report.id.bold(),
        format!("(pid {})", report.renderer_pid).dimmed()
    );

    if report.killed > 0 {
        println!("  stopped {} running renderer(s)", report.killed);
    }

    let Some(post) = &report.post_processing else {
        return;
    };

    for path in &post.exported {
        println!("  {} {}", "exported".green(), path.display());
    }
    for path in &post.skipped {
        println!("  {} {} (unsupported format)", "skipped".yellow(), path.display());
    }
    if let Some(pid) = post.post_command_pid {
        println!("  {} pid {pid}", "post-command".green());
    }
    if let Some(handoff) = post.daemon_handoff {
        println!("  {} {handoff:?}", "swww".green());
    }
    for failure in &post.failures {
        println!("  {} {failure}", "failed".red());
    }
}

/// Prints a thumbnail generation summary.
pub fn print_thumbnail_summary(summary: &GenerationSummary) {
    let failed = summary.failed.to_string();
    let failed = if summary.failed > 0 { failed.red() } else { failed.normal() };

    println!(
        "Thumbnails: {} generated, {} cached, {failed} failed, {} without preview",
        summary.generated.to_string().green(),
        summary.cached,
        summary.skipped
    );
}

/// Prints JSON with syntax highlighting.
///
/// Colors:
/// - Keys: Cyan
/// - Strings: Green
/// - Numbers: Yellow
/// - Booleans/Null: Magenta
/// - Brackets/Braces: White (default)
pub fn print_highlighted_json(value: &serde_json::Value) {
    let json_str = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
    print_highlighted_json_str(&json_str);
}

/// Prints a JSON string with syntax highlighting.
fn print_highlighted_json_str(json: &str) {
    let mut in_string = false;
    let mut is_key = false;
    let mut escape_next = false;
    let mut current_token = String::new();
    let mut after_colon = false;
    let mut containers: Vec<char> = Vec::new();

    for ch in json.chars() {
        if escape_next {
            current_token.push(ch);
            escape_next = false;
            continue;
        }

        if ch == '\\' && in_string {
            current_token.push(ch);
            escape_next = true;
            continue;
        }

        match ch {
            '"' if in_string => {
                current_token.push(ch);
                if is_key {
                    print!("{}", current_token.cyan());
                } else {
                    print!("{}", current_token.green());
                }
                current_token.clear();
                in_string = false;
                is_key = false;
            }
            '"' => {
                flush_token(&mut current_token, after_colon);
                current_token.push(ch);
                in_string = true;
                // strings inside arrays are values
                is_key = !after_colon && containers.last() == Some(&'{');
                after_colon = false;
            }
            ':' if !in_string => {
                flush_token(&mut current_token, false);
                print!("{}", ":".white());
                after_colon = true;
            }
            ',' if !in_string => {
                flush_token(&mut current_token, after_colon);
                print!("{}", ",".white());
                after_colon = false;
            }
            '{' | '}' | '[' | ']' if !in_string => {
                flush_token(&mut current_token, after_colon);
                if matches!(ch, '{' | '[') {
                    containers.push(ch);
                } else {
                    containers.pop();
                }
                print!("{}", ch.to_string().white().bold());
                after_colon = false;
            }
            _ => current_token.push(ch),
        }
    }

    flush_token(&mut current_token, after_colon);
    println!();
}

/// Flushes the current token with appropriate coloring.
fn flush_token(token: &mut String, is_value: bool) {
    if token.is_empty() {
        return;
    }

    if token.trim().is_empty() || !is_value {
        print!("{token}");
    } else {
        let start = token.find(|c: char| !c.is_whitespace()).unwrap_or(0);
        let end = token.rfind(|c: char| !c.is_whitespace()).map_or(token.len(), |i| i + 1);

        let prefix = &token[..start];
        let value = &token[start..end];
        let suffix = &token[end..];

        if value == "true" || value == "false" || value == "null" {
            print!("{}{}{}", prefix, value.magenta(), suffix);
        } else if value.parse::<f64>().is_ok() {
            print!("{}{}{}", prefix, value.yellow(), suffix);
        } else {
            print!("{token}");
        }
    }

    token.clear();
}

/// Truncates a string to a maximum number of characters, adding ellipsis if needed.
///
/// This function correctly handles multi-byte UTF-8 characters by counting
/// characters rather than bytes.
#[must_use]
pub fn truncate(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();

    if char_count <= max_chars {
        s.to_string()
    } else if max_chars <= 1 {
        "…".to_string()
    } else {
        let truncate_at = s.char_indices().nth(max_chars - 1).map_or(s.len(), |(idx, _)| idx);
        format!("{}…", &s[..truncate_at])
    }
}

/// Formats a boolean as a colored string.
#[must_use]
pub fn format_bool(value: bool) -> String {
    if value {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

/// Formats a flag for table cells; unset flags stay blank.
fn format_flag(value: bool) -> String {
    if value { "✓".green().to_string() } else { String::new() }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;
    use crate::modules::wallpaper::Manifest;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate("hello world", 8), "hello w…");
    }

    #[test]
    fn test_truncate_min_length() {
        assert_eq!(truncate("hello", 1), "…");
    }

    #[test]
    fn test_truncate_multibyte_utf8() {
        let s = "Nébula — Night";
        assert_eq!(truncate(s, 8), "Nébula …");
        assert_eq!(truncate(s, 20), s);
    }

    #[test]
    fn test_format_bool() {
        assert!(format_bool(true).contains('✓'));
        assert!(format_bool(false).contains('✗'));
    }

    #[test]
    fn test_entry_summary_from_entry() {
        let entry = WallpaperEntry {
            id: "123".to_string(),
            path: PathBuf::from("/content/123"),
            preview_path: Some(PathBuf::from("/content/123/preview.gif")),
            thumbnail_path: None,
            manifest: Manifest {
                title: "Rain".to_string(),
                description: "Rainy city".to_string(),
                tags: vec!["city".to_string()],
                preview: "preview.gif".to_string(),
            },
            modified: Some(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)),
            is_favorite: true,
            is_broken: false,
        };

        let summary = EntrySummary::from(&entry);

        assert_eq!(summary.id, "123");
        assert_eq!(summary.title, "Rain");
        assert_eq!(summary.modified, Some(1_700_000_000));
        assert!(summary.favorite);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["thumbnail"], serde_json::Value::Null);
        assert_eq!(json["tags"][0], "city");
    }
}
