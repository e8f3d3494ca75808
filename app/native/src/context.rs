//! Application context.
//!
//! Everything the front ends share lives here and is passed around
//! explicitly: the loaded configuration, the apply manager with its
//! single-flight guard, the last scanned catalog and the thumbnail cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::cache::get_cache_dir;
use crate::config::{self, HelperConfig, PostProcessingConfig, SortBy};
use crate::constants::renderer::MAX_VOLUME;
use crate::constants::thumbnail::SIZE as THUMBNAIL_SIZE;
use crate::error::{Error, Result};
use crate::modules::process::ProcessControl;
use crate::modules::wallpaper::thumbnail::GenerationSummary;
use crate::modules::wallpaper::{
    ApplyOptions, ApplyStatus, Catalog, CatalogError, ThumbnailCache, WallpaperEntry,
    WallpaperManager,
};
use crate::platform::path::{ensure_dir, expand};

/// One-off replacements for post-processing settings.
///
/// Only the running process sees them; they are never written back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostProcessingOverrides {
    pub enabled: Option<bool>,
    pub artificial_delay: Option<u64>,
    pub screenshot_files: Option<Vec<String>>,
    pub post_command: Option<String>,
    pub set_swww: Option<bool>,
}

impl PostProcessingOverrides {
    /// Returns `settings` with every override applied.
    #[must_use]
    pub fn apply_to(&self, settings: &PostProcessingConfig) -> PostProcessingConfig {
        let mut merged = settings.clone();

        if let Some(enabled) = self.enabled {
            merged.enabled = enabled;
        }
        if let Some(delay) = self.artificial_delay {
            merged.artificial_delay = delay;
        }
        if let Some(files) = &self.screenshot_files {
            merged.screenshot_files.clone_from(files);
        }
        if let Some(command) = &self.post_command {
            merged.post_command.clone_from(command);
        }
        if let Some(set_swww) = self.set_swww {
            merged.set_swww = set_swww;
        }

        merged
    }
}

/// Shared state of a running helper.
pub struct AppContext {
    config: HelperConfig,
    config_path: PathBuf,
    cache_root: PathBuf,
    manager: Arc<WallpaperManager>,
    catalog: Catalog,
    thumbnails: ThumbnailCache,
}

impl AppContext {
    /// Loads the configuration (creating a default file on first run) and
    /// builds the context around it. The catalog starts empty; call
    /// [`rescan`](Self::rescan) to fill it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub fn load(
        custom_config: Option<&Path>,
        processes: Arc<dyn ProcessControl>,
        status: Option<UnboundedSender<ApplyStatus>>,
    ) -> Result<Self> {
        let (config, config_path) = config::load_or_create(custom_config)?;
        tracing::debug!(path = %config_path.display(), "configuration loaded");

        let cache_root = match ensure_dir(&get_cache_dir()) {
            Ok(root) => root,
            Err(err) => {
                let root = get_cache_dir();
                tracing::warn!(
                    error = %err,
                    path = %root.display(),
                    "failed to create cache directory"
                );
                root
            }
        };

        Ok(Self::new(config, config_path, cache_root, processes, status))
    }

    /// Builds a context from an already loaded configuration.
    pub fn new(
        config: HelperConfig,
        config_path: PathBuf,
        cache_root: PathBuf,
        processes: Arc<dyn ProcessControl>,
        status: Option<UnboundedSender<ApplyStatus>>,
    ) -> Self {
        let mut manager = WallpaperManager::new(processes, apply_options(&config, &cache_root))
            .with_last_applied(&config.state.last_set_id);
        if let Some(sender) = status {
            manager = manager.with_status_channel(sender);
        }

        Self {
            thumbnails: ThumbnailCache::new(cache_root.clone()),
            catalog: Catalog::default(),
            manager: Arc::new(manager),
            config,
            config_path,
            cache_root,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &HelperConfig { &self.config }

    #[must_use]
    pub fn config_path(&self) -> &Path { &self.config_path }

    #[must_use]
    pub fn cache_root(&self) -> &Path { &self.cache_root }

    #[must_use]
    pub const fn manager(&self) -> &Arc<WallpaperManager> { &self.manager }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog { &self.catalog }

    #[must_use]
    pub const fn thumbnails(&self) -> &ThumbnailCache { &self.thumbnails }

    /// Resolved content directory.
    #[must_use]
    pub fn content_dir(&self) -> PathBuf { expand(&self.config.engine.content_dir) }

    /// Rebuilds the catalog from the content directory.
    ///
    /// Thumbnails already in the cache are attached; none are generated.
    ///
    /// # Errors
    ///
    /// Returns the structural scan error. The previous catalog is kept then.
    pub fn rescan(&mut self) -> std::result::Result<usize, CatalogError> {
        let mut catalog = Catalog::scan(&self.content_dir(), &self.config.state)?;

        let cached: Vec<(String, PathBuf)> = catalog
            .entries()
            .iter()
            .filter_map(|entry| Some((entry.id.clone(), self.thumbnails.existing(&entry.id)?)))
            .collect();
        for (id, path) in cached {
            catalog.set_thumbnail(&id, path);
        }

        self.catalog = catalog;
        Ok(self.catalog.len())
    }

    /// Catalog entries filtered by `query` in the configured order.
    #[must_use]
    pub fn view(&self, query: &str) -> Vec<WallpaperEntry> {
        self.catalog.view(self.config.state.sort_by, self.config.state.hide_broken, query)
    }

    /// Looks up a catalog entry.
    ///
    /// # Errors
    ///
    /// Returns `Error::EntryNotFound` if no entry has this ID.
    pub fn find(&self, id: &str) -> Result<&WallpaperEntry> {
        self.catalog.find(id).ok_or_else(|| Error::EntryNotFound(id.to_string()))
    }

    /// Flips the favorite flag of `id`, returning the new value.
    ///
    /// # Errors
    ///
    /// Returns `Error::EntryNotFound` if no entry has this ID.
    pub fn toggle_favorite(&mut self, id: &str) -> Result<bool> {
        self.find(id)?;
        let favorite = self.config.state.toggle_favorite(id);
        self.catalog.set_favorite(id, favorite);
        Ok(favorite)
    }

    /// Flips the broken flag of `id`, returning the new value.
    ///
    /// # Errors
    ///
    /// Returns `Error::EntryNotFound` if no entry has this ID.
    pub fn toggle_broken(&mut self, id: &str) -> Result<bool> {
        self.find(id)?;
        let broken = self.config.state.toggle_broken(id);
        self.catalog.set_broken(id, broken);
        Ok(broken)
    }

    pub fn set_sort(&mut self, sort_by: SortBy) { self.config.state.sort_by = sort_by; }

    /// Flips hide-broken, returning the new value.
    pub fn toggle_hide_broken(&mut self) -> bool {
        self.config.state.hide_broken = !self.config.state.hide_broken;
        self.config.state.hide_broken
    }

    /// Sets the renderer volume, clamped into `0..=100`. Returns the stored value.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArguments` for NaN or infinite values.
    pub fn set_volume(&mut self, volume: f64) -> Result<f64> {
        if !volume.is_finite() {
            return Err(Error::InvalidArguments(format!("Invalid volume: {volume}")));
        }

        self.config.state.volume = volume.clamp(0.0, MAX_VOLUME);
        self.sync_options();
        Ok(self.config.state.volume)
    }

    /// Applies one-off post-processing overrides to the manager only.
    pub fn override_post_processing(&self, overrides: &PostProcessingOverrides) {
        let mut options = apply_options(&self.config, &self.cache_root);
        options.post_processing = overrides.apply_to(&self.config.post_processing);
        self.manager.set_options(options);
    }

    /// Renderer command for `id` without running it.
    ///
    /// # Errors
    ///
    /// Returns `Error::EntryNotFound` if no entry has this ID.
    pub fn command_for(&self, id: &str) -> Result<String> {
        let entry = self.find(id)?;
        Ok(self.manager.preview_command(&entry.path))
    }

    /// Generates missing thumbnails for the whole catalog and attaches them.
    pub fn generate_thumbnails(&mut self) -> GenerationSummary {
        let summary = self.thumbnails.generate_all(self.catalog.entries(), THUMBNAIL_SIZE);

        let ids: Vec<String> =
            self.catalog.entries().iter().map(|entry| entry.id.clone()).collect();
        for id in ids {
            if let Some(path) = self.thumbnails.existing(&id) {
                self.catalog.set_thumbnail(&id, path);
            }
        }

        summary
    }

    /// Writes the configuration back, including the last applied wallpaper.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&mut self) -> Result<()> {
        if let Some(id) = self.manager.last_applied() {
            self.config.state.last_set_id = id;
        }

        config::save_config(&self.config, &self.config_path)?;
        tracing::debug!(path = %self.config_path.display(), "configuration saved");
        Ok(())
    }

    fn sync_options(&self) {
        self.manager.set_options(apply_options(&self.config, &self.cache_root));
    }
}

fn apply_options(config: &HelperConfig, cache_root: &Path) -> ApplyOptions {
    ApplyOptions {
        engine: config.engine.clone(),
        post_processing: config.post_processing.clone(),
        cache_root: cache_root.to_path_buf(),
        volume: config.state.volume,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::modules::process::testing::RecordingProcesses;

    fn context(temp: &TempDir) -> AppContext {
        let content = temp.path().join("content");
        for id in ["100", "200"] {
            fs::create_dir_all(content.join(id)).unwrap();
        }
        fs::write(content.join("100").join("project.json"), r#"{"title":"Forest","tags":["nature"]}"#)
            .unwrap();

        let mut config = HelperConfig::default();
        config.engine.content_dir = content.to_string_lossy().into_owned();
        config.post_processing.enabled = false;
        config.state.last_set_id = "200".to_string();

        AppContext::new(
            config,
            temp.path().join("config.json"),
            temp.path().join("cache"),
            Arc::new(RecordingProcesses::new()),
            None,
        )
    }

    #[test]
    fn test_rescan_and_find() {
        let temp = tempfile::tempdir().unwrap();
        let mut ctx = context(&temp);

        assert_eq!(ctx.rescan().unwrap(), 2);
        assert_eq!(ctx.find("100").unwrap().manifest.title, "Forest");
        assert!(matches!(ctx.find("300"), Err(Error::EntryNotFound(_))));
    }

    #[test]
    fn test_rescan_keeps_previous_catalog_on_error() {
        let temp = tempfile::tempdir().unwrap();
        let mut ctx = context(&temp);
        ctx.rescan().unwrap();

        ctx.config.engine.content_dir = temp.path().join("missing").to_string_lossy().into_owned();

        assert!(ctx.rescan().is_err());
        assert_eq!(ctx.catalog().len(), 2);
    }

    #[test]
    fn test_toggles_update_state_and_catalog() {
        let temp = tempfile::tempdir().unwrap();
        let mut ctx = context(&temp);
        ctx.rescan().unwrap();

        assert!(ctx.toggle_favorite("100").unwrap());
        assert!(ctx.config().state.favorites.contains("100"));
        assert!(ctx.find("100").unwrap().is_favorite);

        assert!(ctx.toggle_broken("200").unwrap());
        assert!(ctx.toggle_hide_broken());
        assert_eq!(ctx.view("").len(), 1);

        assert!(!ctx.toggle_favorite("100").unwrap());
        assert!(!ctx.find("100").unwrap().is_favorite);
        assert!(ctx.toggle_favorite("missing").is_err());
    }

    #[test]
    fn test_volume_is_clamped_and_forwarded() {
        let temp = tempfile::tempdir().unwrap();
        let mut ctx = context(&temp);

        assert!((ctx.set_volume(150.0).unwrap() - 100.0).abs() < f64::EPSILON);
        assert!((ctx.manager().options().volume - 100.0).abs() < f64::EPSILON);
        assert!(ctx.set_volume(-3.0).unwrap().abs() < f64::EPSILON);
        assert!(ctx.set_volume(f64::NAN).is_err());
    }

    #[test]
    fn test_overrides_reach_manager_but_not_config() {
        let temp = tempfile::tempdir().unwrap();
        let ctx = context(&temp);
        let overrides = PostProcessingOverrides {
            enabled: Some(true),
            artificial_delay: Some(0),
            screenshot_files: Some(vec!["/tmp/out.jpg".to_string()]),
            post_command: Some("echo %wallpaperId%".to_string()),
            set_swww: Some(true),
        };

        ctx.override_post_processing(&overrides);

        let options = ctx.manager().options();
        assert!(options.post_processing.enabled);
        assert_eq!(options.post_processing.artificial_delay, 0);
        assert_eq!(options.post_processing.screenshot_files, vec!["/tmp/out.jpg"]);
        assert!(options.post_processing.set_swww);
        assert!(!ctx.config().post_processing.enabled);
        assert!(ctx.config().post_processing.post_command.is_empty());
    }

    #[test]
    fn test_empty_overrides_keep_settings() {
        let settings =
            PostProcessingConfig { enabled: true, artificial_delay: 3, ..Default::default() };
        assert_eq!(PostProcessingOverrides::default().apply_to(&settings), settings);
    }

    #[test]
    fn test_save_records_last_applied() {
        let temp = tempfile::tempdir().unwrap();
        let mut ctx = context(&temp);
        ctx.rescan().unwrap();
        let path = ctx.find("100").unwrap().path.clone();

        ctx.manager().apply("100", &path).unwrap();
        ctx.save().unwrap();

        let saved = config::load_config_from_path(&temp.path().join("config.json")).unwrap();
        assert_eq!(saved.state.last_set_id, "100");
    }

    #[test]
    fn test_command_for_entry() {
        let temp = tempfile::tempdir().unwrap();
        let mut ctx = context(&temp);
        ctx.rescan().unwrap();

        let line = ctx.command_for("100").unwrap();

        assert!(line.starts_with("linux-wallpaperengine --screen-root HDMI-A-1 --bg "));
        assert!(line.ends_with("--volume 100"));
    }
}
