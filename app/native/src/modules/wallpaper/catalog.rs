//! Wallpaper catalog scanning, sorting and filtering.
//!
//! Every immediate subdirectory of the content directory is one wallpaper;
//! its name is the wallpaper ID. Metadata comes from the `project.json`
//! manifest inside it, with defaults when the manifest is missing or broken.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{SavedState, SortBy};
use crate::constants::catalog::{MANIFEST_FILE, PLACEHOLDER_DESCRIPTION};

/// Structural scan errors; there is nothing to display when these occur.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The content directory could not be read.
    #[error("Failed to read wallpaper directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The content directory has no subdirectories.
    #[error("No wallpapers found in {0}")]
    Empty(PathBuf),
}

/// Per-wallpaper metadata from `project.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Preview image file name, relative to the wallpaper directory.
    pub preview: String,
}

impl Manifest {
    /// Record used when the manifest cannot be read.
    #[must_use]
    pub fn fallback(dir_name: &str) -> Self {
        Self {
            title: dir_name.to_string(),
            description: PLACEHOLDER_DESCRIPTION.to_string(),
            tags: Vec::new(),
            preview: String::new(),
        }
    }

    /// Reads the manifest in `dir`, falling back to defaults on any failure.
    #[must_use]
    pub fn read_or_default(dir: &Path, dir_name: &str) -> Self {
        let path = dir.join(MANIFEST_FILE);

        let parsed = fs::read(&path)
            .map_err(|err| err.to_string())
            .and_then(|bytes| {
                serde_json::from_slice::<Self>(&bytes).map_err(|err| err.to_string())
            });

        match parsed {
            Ok(manifest) => manifest,
            Err(reason) => {
                tracing::debug!(path = %path.display(), %reason, "using default manifest");
                Self::fallback(dir_name)
            }
        }
    }
}

/// One wallpaper in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallpaperEntry {
    /// Directory name; stable across scans.
    pub id: String,
    /// Wallpaper directory.
    pub path: PathBuf,
    /// Preview image inside the wallpaper directory, if the manifest names one.
    pub preview_path: Option<PathBuf>,
    /// Cached thumbnail, if one has been generated.
    pub thumbnail_path: Option<PathBuf>,
    pub manifest: Manifest,
    /// Directory modification time; `None` when it could not be read.
    pub modified: Option<SystemTime>,
    pub is_favorite: bool,
    pub is_broken: bool,
}

impl WallpaperEntry {
    /// Builds an entry for the wallpaper directory `path` named `id`.
    #[must_use]
    pub fn load(
        path: PathBuf,
        id: String,
        favorites: &BTreeSet<String>,
        broken: &BTreeSet<String>,
    ) -> Self {
        let manifest = Manifest::read_or_default(&path, &id);
        let preview_path =
            (!manifest.preview.trim().is_empty()).then(|| path.join(manifest.preview.trim()));
        let modified = fs::metadata(&path).and_then(|meta| meta.modified()).ok();

        Self {
            is_favorite: favorites.contains(&id),
            is_broken: broken.contains(&id),
            id,
            path,
            preview_path,
            thumbnail_path: None,
            manifest,
            modified,
        }
    }

    /// Case-insensitive match on title, description and tags.
    ///
    /// An empty query matches everything.
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();

        if query.is_empty() {
            return true;
        }

        self.manifest.title.to_lowercase().contains(&query)
            || self.manifest.description.to_lowercase().contains(&query)
            || self.manifest.tags.iter().any(|tag| tag.to_lowercase().contains(&query))
    }
}

/// Scans `content_dir` and returns one entry per subdirectory, ordered by name.
///
/// # Errors
///
/// Returns `CatalogError::ReadDir` if the directory cannot be listed and
/// `CatalogError::Empty` if it has no subdirectories.
pub fn scan(
    content_dir: &Path,
    favorites: &BTreeSet<String>,
    broken: &BTreeSet<String>,
) -> Result<Vec<WallpaperEntry>, CatalogError> {
    let read_dir = fs::read_dir(content_dir).map_err(|source| CatalogError::ReadDir {
        path: content_dir.to_path_buf(),
        source,
    })?;

    let mut dirs: Vec<(String, PathBuf)> = read_dir
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter_map(|path| {
            let id = path.file_name()?.to_string_lossy().into_owned();
            Some((id, path))
        })
        .collect();

    if dirs.is_empty() {
        return Err(CatalogError::Empty(content_dir.to_path_buf()));
    }

    dirs.sort_by(|a, b| a.0.cmp(&b.0));

    let entries: Vec<WallpaperEntry> = dirs
        .into_iter()
        .map(|(id, path)| WallpaperEntry::load(path, id, favorites, broken))
        .collect();

    tracing::debug!(dir = %content_dir.display(), count = entries.len(), "scanned wallpapers");
    Ok(entries)
}

/// Orders `entries` for display.
///
/// Three stable passes, in this order: the sort criterion, favorites first,
/// then broken entries last (or removed when `hide_broken` is set). A
/// favorite that is also broken therefore ends up with the broken ones.
pub fn sort_entries(entries: &mut Vec<WallpaperEntry>, criterion: SortBy, hide_broken: bool) {
    match criterion {
        SortBy::DateDesc => sort_keyed(entries, |entry| entry.modified, true),
        SortBy::DateAsc => sort_keyed(entries, |entry| entry.modified, false),
        SortBy::NameAsc => sort_keyed(entries, title_key, false),
        SortBy::NameDesc => sort_keyed(entries, title_key, true),
    }

    entries.sort_by_key(|entry| !entry.is_favorite);

    if hide_broken {
        entries.retain(|entry| !entry.is_broken);
    } else {
        entries.sort_by_key(|entry| entry.is_broken);
    }
}

fn title_key(entry: &WallpaperEntry) -> Option<String> {
    let title = entry.manifest.title.as_str();
    (!title.is_empty()).then(|| title.to_string())
}

/// Stable sort by `key` in which entries without a key keep their index.
///
/// Keyed entries are sorted among the positions they already occupy.
fn sort_keyed<K, F>(entries: &mut Vec<WallpaperEntry>, key: F, descending: bool)
where
    K: Ord,
    F: Fn(&WallpaperEntry) -> Option<K>,
{
    let keys: Vec<Option<K>> = entries.iter().map(&key).collect();
    let slots: Vec<usize> = (0..entries.len()).filter(|&i| keys[i].is_some()).collect();

    let mut order = slots.clone();
    order.sort_by(|&a, &b| {
        let ordering = keys[a].cmp(&keys[b]);
        if descending { ordering.reverse() } else { ordering }
    });

    let mut taken: Vec<Option<WallpaperEntry>> = entries.drain(..).map(Some).collect();
    let mut source_for: Vec<usize> = (0..taken.len()).collect();
    for (slot, source) in slots.into_iter().zip(order) {
        source_for[slot] = source;
    }

    entries.extend(source_for.into_iter().filter_map(|source| taken[source].take()));
}

/// The scanned wallpapers of one content directory.
///
/// Rebuilt wholesale by [`Catalog::scan`]; only favorite/broken flags are
/// updated in place between scans.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    content_dir: PathBuf,
    entries: Vec<WallpaperEntry>,
}

impl Catalog {
    /// Scans `content_dir` using the memberships in `state`.
    ///
    /// # Errors
    ///
    /// Returns the structural scan error, if any.
    pub fn scan(content_dir: &Path, state: &SavedState) -> Result<Self, CatalogError> {
        let entries = scan(content_dir, &state.favorites, &state.broken)?;
        Ok(Self { content_dir: content_dir.to_path_buf(), entries })
    }

    /// Creates a catalog from already loaded entries.
    #[must_use]
    pub const fn from_entries(content_dir: PathBuf, entries: Vec<WallpaperEntry>) -> Self {
        Self { content_dir, entries }
    }

    #[must_use]
    pub fn content_dir(&self) -> &Path { &self.content_dir }

    /// All entries in scan order.
    #[must_use]
    pub fn entries(&self) -> &[WallpaperEntry] { &self.entries }

    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Looks up an entry by ID.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&WallpaperEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Entries ordered for display and filtered by `query`.
    #[must_use]
    pub fn view(&self, criterion: SortBy, hide_broken: bool, query: &str) -> Vec<WallpaperEntry> {
        let mut entries: Vec<WallpaperEntry> =
            self.entries.iter().filter(|entry| entry.matches_query(query)).cloned().collect();
        sort_entries(&mut entries, criterion, hide_broken);
        entries
    }

    /// Entries not marked as broken, in scan order.
    #[must_use]
    pub fn non_broken(&self) -> Vec<&WallpaperEntry> {
        self.entries.iter().filter(|entry| !entry.is_broken).collect()
    }

    /// Updates the in-memory favorite flag; returns false if `id` is unknown.
    pub fn set_favorite(&mut self, id: &str, favorite: bool) -> bool {
        self.update(id, |entry| entry.is_favorite = favorite)
    }

    /// Updates the in-memory broken flag; returns false if `id` is unknown.
    pub fn set_broken(&mut self, id: &str, broken: bool) -> bool {
        self.update(id, |entry| entry.is_broken = broken)
    }

    /// Records the cached thumbnail path for `id`.
    pub fn set_thumbnail(&mut self, id: &str, thumbnail: PathBuf) -> bool {
        self.update(id, |entry| entry.thumbnail_path = Some(thumbnail))
    }

    fn update(&mut self, id: &str, apply: impl FnOnce(&mut WallpaperEntry)) -> bool {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                apply(entry);
                true
            }
            None => false,
        }
    }
}
