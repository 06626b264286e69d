// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for captured, picked and saved photos

use crate::constants::{file_formats, jpeg_quality, storage};
use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::debug;

const FILE_URI_SCHEME: &str = "file://";

/// Directory acting as the media library (`~/Pictures/<folder>`)
pub fn library_directory(folder_name: &str) -> PathBuf {
    pictures_directory().join(folder_name)
}

/// The user's pictures directory, used as the default gallery source
pub fn pictures_directory() -> PathBuf {
    dirs::picture_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Pictures")))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Transient storage for frames taken by the camera
pub fn capture_cache_directory() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(storage::APP_DIR_NAME)
        .join(storage::CAPTURE_CACHE_DIR)
}

/// `PREFIX_YYYYmmdd_HHMMSS_xxxxxxxx.ext`
///
/// The random suffix keeps names unique for shots within the same second.
pub fn timestamped_file_name(prefix: &str, extension: &str) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}.{}", prefix, timestamp, &suffix[..8], extension)
}

/// `file://` URI for a local path
pub fn file_uri(path: &Path) -> String {
    format!("{}{}", FILE_URI_SCHEME, path.display())
}

/// Local path behind a `file://` URI. Bare absolute paths are accepted too.
pub fn path_from_uri(uri: &str) -> Option<PathBuf> {
    if let Some(path) = uri.strip_prefix(FILE_URI_SCHEME) {
        return (!path.is_empty()).then(|| PathBuf::from(path));
    }
    let path = Path::new(uri);
    path.is_absolute().then(|| path.to_path_buf())
}

/// Whether a path has a supported image extension
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(file_formats::is_image_extension)
}

/// Most recently modified image in `dir`
pub async fn latest_image(dir: PathBuf) -> Option<PathBuf> {
    let latest = tokio::task::spawn_blocking(move || {
        let entries = std::fs::read_dir(&dir).ok()?;
        entries
            .flatten()
            .filter(|entry| is_image_file(&entry.path()))
            .filter_map(|entry| {
                let modified = entry.metadata().ok()?.modified().ok()?;
                Some((modified, entry.path()))
            })
            .max_by_key(|(modified, _)| *modified)
            .map(|(_, path)| path)
    })
    .await
    .ok()?;

    debug!(path = ?latest, "Latest gallery image");
    latest
}

/// Encode an RGB image as JPEG with a 0.0 - 1.0 quality factor
pub fn encode_jpeg(image: &RgbImage, quality: f32) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, jpeg_quality(quality));
    encoder.encode(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(buffer)
}
