//! Screenshot export.
//!
//! Copies or transcodes the renderer's PNG screenshot into the configured
//! destination files. Each destination is handled on its own; the caller
//! decides what to do with individual failures.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader};
use thiserror::Error;

use crate::constants::post_processing::JPEG_QUALITY;
use crate::platform::path::ensure_dir;

/// Errors that can occur while exporting a screenshot.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// The destination extension is not PNG, JPEG or BMP.
    #[error("Unsupported screenshot format: {0}")]
    UnsupportedFormat(PathBuf),
    /// Failed to read the source image.
    #[error("Failed to read image {path}: {reason}")]
    ImageRead { path: PathBuf, reason: String },
    /// Failed to write the destination image.
    #[error("Failed to save image {path}: {reason}")]
    ImageSave { path: PathBuf, reason: String },
    /// Failed to create the destination directory.
    #[error("Failed to create directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Output formats a screenshot can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Byte copy of the captured PNG.
    Png,
    /// JPEG re-encode.
    Jpeg,
    /// BMP re-encode.
    Bmp,
}

impl ExportFormat {
    /// Maps a file extension (without the dot, any case) to a format.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }
}

/// Resolves the final destination path and format.
///
/// The extension is whatever follows the last `.` of the file name, so
/// `.png` is a PNG destination and `out.` has an empty, unsupported
/// extension. A file name without any `.` gets `.png` appended. Returns
/// `None` for unsupported extensions and for paths without a file name.
#[must_use]
pub fn resolve_destination(path: &Path) -> Option<(PathBuf, ExportFormat)> {
    let name = path.file_name()?.to_string_lossy();

    match name.rfind('.') {
        None => Some((path.with_file_name(format!("{name}.png")), ExportFormat::Png)),
        Some(dot) => ExportFormat::from_extension(&name[dot + 1..])
            .map(|format| (path.to_path_buf(), format)),
    }
}

/// Returns true when both paths name the same existing file.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

/// Exports `source` (a PNG) to `destination`, returning the written path.
///
/// A destination that already is `source` (same device and inode) is left
/// untouched and reported as exported.
///
/// # Errors
///
/// Returns `ProcessingError::UnsupportedFormat` for unsupported extensions,
/// or the read, write or directory error that stopped the export.
pub fn export_screenshot(source: &Path, destination: &Path) -> Result<PathBuf, ProcessingError> {
    let (target, format) = resolve_destination(destination)
        .ok_or_else(|| ProcessingError::UnsupportedFormat(destination.to_path_buf()))?;

    if let Some(parent) = target.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_dir(parent).map_err(|source| ProcessingError::Directory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    if is_same_file(source, &target) {
        tracing::debug!(path = %target.display(), "destination is the screenshot itself");
        return Ok(target);
    }

    match format {
        ExportFormat::Png => {
            fs::copy(source, &target).map_err(|err| ProcessingError::ImageSave {
                path: target.clone(),
                reason: err.to_string(),
            })?;
        }
        ExportFormat::Jpeg | ExportFormat::Bmp => {
            let img = decode(source)?;
            encode(&img, &target, format)?;
        }
    }

    Ok(target)
}

/// Exports `source` to every destination independently.
///
/// Returns one result per destination, in order.
pub fn export_all(
    source: &Path,
    destinations: &[PathBuf],
) -> Vec<(PathBuf, Result<PathBuf, ProcessingError>)> {
    destinations
        .iter()
        .map(|destination| (destination.clone(), export_screenshot(source, destination)))
        .collect()
}

fn decode(source: &Path) -> Result<DynamicImage, ProcessingError> {
    let read_error =
        |reason: String| ProcessingError::ImageRead { path: source.to_path_buf(), reason };

    ImageReader::open(source)
        .map_err(|err| read_error(err.to_string()))?
        .with_guessed_format()
        .map_err(|err| read_error(err.to_string()))?
        .decode()
        .map_err(|err| read_error(err.to_string()))
}

fn encode(img: &DynamicImage, target: &Path, format: ExportFormat) -> Result<(), ProcessingError> {
    let save_error =
        |reason: String| ProcessingError::ImageSave { path: target.to_path_buf(), reason };

    let file = File::create(target).map_err(|err| save_error(err.to_string()))?;
    let mut writer = BufWriter::new(file);

    match format {
        ExportFormat::Jpeg => {
            // JPEG has no alpha channel
            let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
            img.to_rgb8().write_with_encoder(encoder).map_err(|err| save_error(err.to_string()))?;
        }
        ExportFormat::Bmp => {
            DynamicImage::ImageRgba8(img.to_rgba8())
                .write_to(&mut writer, ImageFormat::Bmp)
                .map_err(|err| save_error(err.to_string()))?;
        }
        ExportFormat::Png => {
            return Err(save_error("PNG exports are copied, not encoded".to_string()));
        }
    }

    writer.flush().map_err(|err| save_error(err.to_string()))
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;

    fn write_png(path: &Path) {
        let img = RgbaImage::from_pixel(8, 6, Rgba([10, 20, 30, 255]));
        img.save_with_format(path, ImageFormat::Png).unwrap();
    }

    #[test]
    fn test_resolve_destination_without_extension_defaults_to_png() {
        let (path, format) = resolve_destination(Path::new("out")).unwrap();
        assert_eq!(path, PathBuf::from("out.png"));
        assert_eq!(format, ExportFormat::Png);
    }

    #[test]
    fn test_resolve_destination_trailing_dot_is_unsupported() {
        assert!(resolve_destination(Path::new("out.")).is_none());
        assert!(resolve_destination(Path::new("/tmp/shots/wall.")).is_none());
    }

    #[test]
    fn test_resolve_destination_dot_file_uses_its_extension() {
        let (path, format) = resolve_destination(Path::new("/tmp/.png")).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/.png"));
        assert_eq!(format, ExportFormat::Png);
        assert!(resolve_destination(Path::new("/tmp/.hidden")).is_none());
    }

    #[test]
    fn test_resolve_destination_without_file_name_is_none() {
        assert!(resolve_destination(Path::new("/")).is_none());
    }

    #[test]
    fn test_resolve_destination_skips_gif() {
        assert!(resolve_destination(Path::new("out.gif")).is_none());
    }

    #[test]
    fn test_resolve_destination_is_case_insensitive() {
        let (_, format) = resolve_destination(Path::new("/tmp/OUT.JPG")).unwrap();
        assert_eq!(format, ExportFormat::Jpeg);
        let (_, format) = resolve_destination(Path::new("/tmp/out.jpeg")).unwrap();
        assert_eq!(format, ExportFormat::Jpeg);
        let (_, format) = resolve_destination(Path::new("/tmp/out.Bmp")).unwrap();
        assert_eq!(format, ExportFormat::Bmp);
    }

    #[test]
    fn test_export_png_is_byte_copy() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("screenshot.png");
        write_png(&source);
        let destination = temp.path().join("copies").join("wall.png");

        let written = export_screenshot(&source, &destination).unwrap();

        assert_eq!(written, destination);
        assert_eq!(fs::read(&source).unwrap(), fs::read(&destination).unwrap());
    }

    #[test]
    fn test_export_onto_source_keeps_screenshot() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("screenshot.png");
        write_png(&source);
        let before = fs::read(&source).unwrap();

        let written = export_screenshot(&source, &source).unwrap();
        let through_dot = temp.path().join(".").join("screenshot.png");
        export_screenshot(&source, &through_dot).unwrap();

        assert_eq!(written, source);
        assert_eq!(fs::read(&source).unwrap(), before);
    }

    #[test]
    fn test_export_all_onto_source_keeps_later_destinations_intact() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("screenshot.png");
        write_png(&source);
        let destinations = vec![source.clone(), temp.path().join("copy.png")];

        let results = export_all(&source, &destinations);

        assert!(results.iter().all(|(_, result)| result.is_ok()));
        assert_eq!(fs::read(&source).unwrap(), fs::read(temp.path().join("copy.png")).unwrap());
        assert!(!fs::read(&source).unwrap().is_empty());
    }

    #[test]
    fn test_export_without_extension_writes_png() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("screenshot.png");
        write_png(&source);

        let written = export_screenshot(&source, &temp.path().join("out")).unwrap();

        assert_eq!(written, temp.path().join("out.png"));
        assert!(written.exists());
    }

    #[test]
    fn test_export_jpeg_transcodes() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("screenshot.png");
        write_png(&source);

        let written = export_screenshot(&source, &temp.path().join("out.jpg")).unwrap();

        let format = ImageReader::open(&written).unwrap().with_guessed_format().unwrap().format();
        assert_eq!(format, Some(ImageFormat::Jpeg));
        let decoded = image::open(&written).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }

    #[test]
    fn test_export_bmp_transcodes() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("screenshot.png");
        write_png(&source);

        let written = export_screenshot(&source, &temp.path().join("out.bmp")).unwrap();

        let format = ImageReader::open(&written).unwrap().with_guessed_format().unwrap().format();
        assert_eq!(format, Some(ImageFormat::Bmp));
    }

    #[test]
    fn test_export_gif_is_unsupported_and_writes_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("screenshot.png");
        write_png(&source);
        let destination = temp.path().join("out.gif");

        let err = export_screenshot(&source, &destination).unwrap_err();

        assert!(matches!(err, ProcessingError::UnsupportedFormat(_)));
        assert!(!destination.exists());
    }

    #[test]
    fn test_export_missing_source_fails() {
        let temp = tempfile::tempdir().unwrap();
        let err =
            export_screenshot(&temp.path().join("missing.png"), &temp.path().join("out.jpg"))
                .unwrap_err();
        assert!(matches!(err, ProcessingError::ImageRead { .. }));
    }

    #[test]
    fn test_export_all_keeps_going_after_failures() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("screenshot.png");
        write_png(&source);
        let destinations = vec![
            temp.path().join("a.gif"),
            temp.path().join("b.png"),
            temp.path().join("c.jpeg"),
        ];

        let results = export_all(&source, &destinations);

        assert_eq!(results.len(), 3);
        assert!(results[0].1.is_err());
        assert!(results[1].1.is_ok());
        assert!(results[2].1.is_ok());
    }
}
