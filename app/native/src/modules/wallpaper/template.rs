//! Post-command placeholder substitution.
//!
//! Recognized tokens are `%screenshot%`, `%wallpaperPath%`, `%wallpaperId%`,
//! `%volume%` and `%pid%`. Anything else between percent signs is left as is.

use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Values substituted into a post-command template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVars {
    /// Path of the screenshot captured by the renderer.
    pub screenshot: String,
    /// Path of the applied wallpaper directory.
    pub wallpaper_path: String,
    /// ID (directory name) of the applied wallpaper.
    pub wallpaper_id: String,
    /// Volume as passed to the renderer.
    pub volume: String,
    /// PID of the renderer process.
    pub pid: String,
}

impl TemplateVars {
    fn lookup(&self, key: &str) -> Option<&str> {
        match key {
            "screenshot" => Some(&self.screenshot),
            "wallpaperPath" => Some(&self.wallpaper_path),
            "wallpaperId" => Some(&self.wallpaper_id),
            "volume" => Some(&self.volume),
            "pid" => Some(&self.pid),
            _ => None,
        }
    }
}

fn placeholder_regex() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new("%(screenshot|wallpaperPath|wallpaperId|volume|pid)%").ok())
        .as_ref()
}

/// Replaces recognized placeholders in `template` with values from `vars`.
///
/// Substitution is a single left-to-right pass; substituted values are not
/// scanned again.
#[must_use]
pub fn render(template: &str, vars: &TemplateVars) -> String {
    let Some(pattern) = placeholder_regex() else {
        return template.to_string();
    };

    pattern
        .replace_all(template, |caps: &Captures<'_>| {
            vars.lookup(&caps[1]).unwrap_or(&caps[0]).to_string()
        })
        .into_owned()
}
