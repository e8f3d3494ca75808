//! Thumbnail cache.
//!
//! Each wallpaper's preview is scaled down once into
//! `<cache>/<id>/thumbnail.png`. An existing file is always a hit; thumbnails
//! are never invalidated, only removed with the rest of the cache.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use rayon::prelude::*;
use tempfile::NamedTempFile;
use thiserror::Error;

use super::catalog::WallpaperEntry;
use crate::constants::thumbnail::FILE_NAME;
use crate::platform::path::ensure_dir;

/// Errors that can occur while producing a thumbnail.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    /// The source image could not be decoded.
    #[error("Failed to read image {path}: {reason}")]
    ImageRead { path: PathBuf, reason: String },
    /// The thumbnail could not be written.
    #[error("Failed to save thumbnail {path}: {reason}")]
    ImageSave { path: PathBuf, reason: String },
    /// The per-entry cache directory could not be created.
    #[error("Failed to create cache directory {path}: {source}")]
    CacheDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Whether a thumbnail was already cached or had to be generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailStatus {
    Hit,
    Generated,
}

/// Counts reported by [`ThumbnailCache::generate_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub generated: usize,
    pub cached: usize,
    pub failed: usize,
    /// Entries without a preview image.
    pub skipped: usize,
}

/// Thumbnails stored under a cache root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailCache {
    root: PathBuf,
}

impl ThumbnailCache {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    #[must_use]
    pub fn root(&self) -> &Path { &self.root }

    /// Returns where the thumbnail for `key` lives, whether or not it exists.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf { self.root.join(key).join(FILE_NAME) }

    /// Returns the cached thumbnail for `key` if it exists.
    #[must_use]
    pub fn existing(&self, key: &str) -> Option<PathBuf> {
        let path = self.path_for(key);
        path.is_file().then_some(path)
    }

    /// Returns the thumbnail for `key`, generating it from `source` if needed.
    ///
    /// The image is fitted into a `size`x`size` box keeping its aspect
    /// ratio. Images already within the box are stored at their own size.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be decoded or the thumbnail
    /// cannot be written. Nothing is left in the cache on failure.
    pub fn ensure(
        &self,
        source: &Path,
        key: &str,
        size: u32,
    ) -> Result<(PathBuf, ThumbnailStatus), ThumbnailError> {
        let target = self.path_for(key);

        if target.is_file() {
            return Ok((target, ThumbnailStatus::Hit));
        }

        let read_error =
            |reason: String| ThumbnailError::ImageRead { path: source.to_path_buf(), reason };

        let img = ImageReader::open(source)
            .and_then(ImageReader::with_guessed_format)
            .map_err(|err| read_error(err.to_string()))?
            .decode()
            .map_err(|err| read_error(err.to_string()))?;

        let thumbnail = fit(img, size);
        write_atomically(&thumbnail, &target)?;

        tracing::debug!(key, path = %target.display(), "generated thumbnail");
        Ok((target, ThumbnailStatus::Generated))
    }

    /// Generates thumbnails for every entry with a preview, in parallel.
    pub fn generate_all(&self, entries: &[WallpaperEntry], size: u32) -> GenerationSummary {
        let generated = AtomicUsize::new(0);
        let cached = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        let skipped = AtomicUsize::new(0);

        entries.par_iter().for_each(|entry| {
            let Some(preview) = &entry.preview_path else {
                skipped.fetch_add(1, Ordering::Relaxed);
                return;
            };

            let counter = match self.ensure(preview, &entry.id, size) {
                Ok((_, ThumbnailStatus::Hit)) => &cached,
                Ok((_, ThumbnailStatus::Generated)) => &generated,
                Err(err) => {
                    tracing::warn!(id = %entry.id, error = %err, "thumbnail generation failed");
                    &failed
                }
            };
            counter.fetch_add(1, Ordering::Relaxed);
        });

        GenerationSummary {
            generated: generated.into_inner(),
            cached: cached.into_inner(),
            failed: failed.into_inner(),
            skipped: skipped.into_inner(),
        }
    }
}

fn fit(img: DynamicImage, size: u32) -> DynamicImage {
    if img.width() <= size && img.height() <= size {
        return img;
    }
    img.resize(size, size, FilterType::Lanczos3)
}

fn write_atomically(img: &DynamicImage, target: &Path) -> Result<(), ThumbnailError> {
    let save_error =
        |reason: String| ThumbnailError::ImageSave { path: target.to_path_buf(), reason };

    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    ensure_dir(dir)
        .map_err(|source| ThumbnailError::CacheDirectory { path: dir.to_path_buf(), source })?;

    // Concurrent generators for the same key race on the rename; either file is valid.
    let temp = NamedTempFile::new_in(dir).map_err(|err| save_error(err.to_string()))?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        img.write_to(&mut writer, ImageFormat::Png).map_err(|err| save_error(err.to_string()))?;
        writer.flush().map_err(|err| save_error(err.to_string()))?;
    }

    temp.persist(target).map_err(|err| save_error(err.error.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::modules::wallpaper::catalog::Manifest;

    fn write_image(path: &Path, width: u32, height: u32) {
        RgbaImage::from_pixel(width, height, Rgba([200, 100, 50, 255]))
            .save_with_format(path, ImageFormat::Png)
            .unwrap();
    }

    fn entry(id: &str, preview: Option<PathBuf>) -> WallpaperEntry {
        WallpaperEntry {
            id: id.to_string(),
            path: PathBuf::from("/content").join(id),
            preview_path: preview,
            thumbnail_path: None,
            manifest: Manifest::fallback(id),
            modified: None,
            is_favorite: false,
            is_broken: false,
        }
    }

    #[test]
    fn test_path_for_uses_key_directory() {
        let cache = ThumbnailCache::new("/cache");
        assert_eq!(cache.path_for("123"), PathBuf::from("/cache/123/thumbnail.png"));
    }

    #[test]
    fn test_ensure_generates_then_hits() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("preview.png");
        write_image(&source, 512, 256);
        let cache = ThumbnailCache::new(temp.path().join("cache"));

        let (path, status) = cache.ensure(&source, "123", 128).unwrap();
        assert_eq!(status, ThumbnailStatus::Generated);
        assert_eq!(path, cache.path_for("123"));

        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (128, 64));

        // Removing the source proves the second call never decodes it.
        fs::remove_file(&source).unwrap();
        let (again, status) = cache.ensure(&source, "123", 128).unwrap();
        assert_eq!(status, ThumbnailStatus::Hit);
        assert_eq!(again, path);
    }

    #[test]
    fn test_small_images_are_not_upscaled() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("preview.png");
        write_image(&source, 40, 30);
        let cache = ThumbnailCache::new(temp.path().join("cache"));

        let (path, _) = cache.ensure(&source, "small", 128).unwrap();

        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
    }

    #[test]
    fn test_unreadable_source_leaves_no_file() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("preview.png");
        fs::write(&source, b"not an image").unwrap();
        let cache = ThumbnailCache::new(temp.path().join("cache"));

        let err = cache.ensure(&source, "bad", 128).unwrap_err();

        assert!(matches!(err, ThumbnailError::ImageRead { .. }));
        assert!(cache.existing("bad").is_none());
    }

    #[test]
    fn test_generate_all_counts() {
        let temp = tempfile::tempdir().unwrap();
        let good = temp.path().join("good.png");
        write_image(&good, 300, 300);
        let bad = temp.path().join("bad.png");
        fs::write(&bad, b"nope").unwrap();
        let cache = ThumbnailCache::new(temp.path().join("cache"));

        let entries = vec![
            entry("a", Some(good.clone())),
            entry("b", Some(bad)),
            entry("c", None),
        ];

        let first = cache.generate_all(&entries, 64);
        assert_eq!(first, GenerationSummary { generated: 1, cached: 0, failed: 1, skipped: 1 });

        let second = cache.generate_all(&entries, 64);
        assert_eq!(second, GenerationSummary { generated: 0, cached: 1, failed: 1, skipped: 1 });
    }
}
