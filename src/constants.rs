// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Entrance animation played whenever the previewed media changes
pub mod animation {
    use std::time::Duration;

    /// Opacity at the start of every run
    pub const OPACITY_FROM: f32 = 0.0;

    /// Opacity once the fade channel settles
    pub const OPACITY_TO: f32 = 1.0;

    /// Fade channel duration
    pub const OPACITY_DURATION: Duration = Duration::from_millis(220);

    /// Scale at the start of every run (small "pop")
    pub const SCALE_FROM: f32 = 0.96;

    /// Scale once the pop channel settles
    pub const SCALE_TO: f32 = 1.0;

    /// Pop channel duration
    pub const SCALE_DURATION: Duration = Duration::from_millis(260);
}

/// Capture and picker defaults
pub mod capture {
    /// JPEG quality requested from the camera (0.0 - 1.0)
    pub const DEFAULT_CAPTURE_QUALITY: f32 = 0.8;

    /// JPEG quality requested from the gallery picker (0.0 - 1.0)
    pub const DEFAULT_PICK_QUALITY: f32 = 0.8;

    /// Let the picker offer its crop/edit step
    pub const DEFAULT_ALLOW_EDITING: bool = true;

    /// Lowest quality accepted from configuration
    pub const MIN_QUALITY: f32 = 0.01;
}

/// File naming and directories
pub mod storage {
    /// Application directory name under config/cache dirs
    pub const APP_DIR_NAME: &str = "polaroid";

    /// Config file name
    pub const CONFIG_FILE_NAME: &str = "config.json";

    /// Default folder under ~/Pictures that acts as the media library
    pub const DEFAULT_LIBRARY_FOLDER: &str = "Polaroid";

    /// Capture cache sub-directory
    pub const CAPTURE_CACHE_DIR: &str = "captures";

    /// Filename prefix for frames taken by the camera
    pub const CAPTURE_PREFIX: &str = "IMG";

    /// Filename prefix for photos written to the media library
    pub const LIBRARY_PREFIX: &str = "photo";

    /// Gallery-picked images re-encoded at a lower quality
    pub const PICK_PREFIX: &str = "PICK";

    /// Log file written by the terminal host
    pub const LOG_FILE_NAME: &str = "polaroid.log";
}

/// Supported image files for the directory gallery
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Virtual camera output
pub mod virtual_camera {
    /// Frame width of the rendered test pattern
    pub const FRAME_WIDTH: u32 = 640;

    /// Frame height of the rendered test pattern
    pub const FRAME_HEIGHT: u32 = 480;
}

/// Terminal host timing
pub mod timing {
    use std::time::Duration;

    /// Redraw / input poll interval (~60 fps)
    pub const TICK: Duration = Duration::from_millis(16);
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

/// Convert a 0.0 - 1.0 quality factor into a JPEG quality (1 - 100)
pub fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jpeg_quality() {
        assert_eq!(jpeg_quality(0.8), 80);
        assert_eq!(jpeg_quality(1.0), 100);
        assert_eq!(jpeg_quality(0.0), 1);
        assert_eq!(jpeg_quality(3.0), 100);
    }

    #[test]
    fn test_image_extensions() {
        assert!(file_formats::is_image_extension("JPG"));
        assert!(file_formats::is_image_extension("png"));
        assert!(!file_formats::is_image_extension("mp4"));
    }
}
