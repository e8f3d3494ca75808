//! Application-wide constants.

/// Directory name used under the XDG config and cache roots.
pub const APP_NAME: &str = "linux-wallpaperengine-helper";

/// Shell used to run renderer and post-command lines.
pub const SHELL: &str = "sh";

/// Renderer invocation defaults.
pub mod renderer {
    /// Default renderer executable.
    pub const BINARY: &str = "linux-wallpaperengine";

    /// Default output the renderer draws on.
    pub const DEFAULT_SCREEN: &str = "HDMI-A-1";

    /// File name of the screenshot captured by the renderer inside the cache root.
    pub const SCREENSHOT_FILE: &str = "screenshot.png";

    /// Volume applied when none has been saved yet.
    pub const DEFAULT_VOLUME: f64 = 100.0;

    /// Upper bound for the volume slider.
    pub const MAX_VOLUME: f64 = 100.0;
}

/// Secondary wallpaper daemon.
pub mod daemon {
    /// Daemon process name.
    pub const PROCESS: &str = "swww-daemon";

    /// Client used to hand images to the daemon.
    pub const CLIENT: &str = "swww";
}

/// Catalog scanning.
pub mod catalog {
    /// Per-entry manifest file.
    pub const MANIFEST_FILE: &str = "project.json";

    /// Description used when the manifest is missing or unreadable.
    pub const PLACEHOLDER_DESCRIPTION: &str = "No description available";

    /// Steam workshop content directory for Wallpaper Engine.
    pub const DEFAULT_CONTENT_DIR: &str = "~/.steam/steam/steamapps/workshop/content/431960";
}

/// Thumbnail cache.
pub mod thumbnail {
    /// File name of a cached thumbnail inside `<cache>/<id>/`.
    pub const FILE_NAME: &str = "thumbnail.png";

    /// Edge of the bounding box thumbnails are fitted into.
    pub const SIZE: u32 = 128;
}

/// Post-processing defaults.
pub mod post_processing {
    /// Seconds to wait before reading the captured screenshot.
    pub const DEFAULT_DELAY_SECS: u64 = 1;

    /// JPEG quality used when re-encoding screenshots.
    pub const JPEG_QUALITY: u8 = 90;
}
