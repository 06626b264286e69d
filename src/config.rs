// SPDX-License-Identifier: GPL-3.0-only

use crate::app::CameraFacing;
use crate::constants::{capture, storage};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// User configuration, stored as JSON in `<config_dir>/polaroid/config.json`
///
/// Every field has a default, so a partial file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JPEG quality of camera captures (0.0 - 1.0)
    pub capture_quality: f32,
    /// Let the gallery picker offer an edit/crop step
    pub pick_allow_editing: bool,
    /// Quality of images returned by the gallery picker (0.0 - 1.0)
    pub pick_quality: f32,
    /// Facing used when the camera opens for the first time
    pub default_facing: CameraFacing,
    /// Image shown in the frame while nothing was captured or picked
    pub placeholder_path: Option<PathBuf>,
    /// Folder inside the pictures directory acting as the media library
    pub library_folder_name: String,
    /// Directory the gallery picks from (defaults to the pictures directory)
    pub gallery_dir: Option<PathBuf>,
    /// Where captured frames are written before being saved
    pub capture_cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capture_quality: capture::DEFAULT_CAPTURE_QUALITY,
            pick_allow_editing: capture::DEFAULT_ALLOW_EDITING,
            pick_quality: capture::DEFAULT_PICK_QUALITY,
            default_facing: CameraFacing::default(),
            placeholder_path: None,
            library_folder_name: storage::DEFAULT_LIBRARY_FOLDER.to_string(),
            gallery_dir: None,
            capture_cache_dir: None,
        }
    }
}

impl Config {
    /// Location of the user configuration file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(storage::APP_DIR_NAME).join(storage::CONFIG_FILE_NAME))
    }

    /// Load the user configuration, falling back to defaults when there is none
    pub fn load() -> AppResult<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("No configuration directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from `path`. A missing file yields the defaults,
    /// a malformed one is an error.
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Configuration loaded");
        Ok(config.sanitized())
    }

    /// Write the configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Clamp qualities into the range the encoders accept
    pub fn sanitized(mut self) -> Self {
        self.capture_quality = clamp_quality(self.capture_quality, capture::DEFAULT_CAPTURE_QUALITY);
        self.pick_quality = clamp_quality(self.pick_quality, capture::DEFAULT_PICK_QUALITY);
        if self.library_folder_name.trim().is_empty() {
            self.library_folder_name = storage::DEFAULT_LIBRARY_FOLDER.to_string();
        }
        self
    }

    /// Directory the gallery backend reads from
    pub fn gallery_directory(&self) -> PathBuf {
        self.gallery_dir
            .clone()
            .unwrap_or_else(crate::storage::pictures_directory)
    }

    /// Directory captured frames are written to
    pub fn capture_directory(&self) -> PathBuf {
        self.capture_cache_dir
            .clone()
            .unwrap_or_else(crate::storage::capture_cache_directory)
    }

    /// Directory acting as the media library
    pub fn library_directory(&self) -> PathBuf {
        crate::storage::library_directory(&self.library_folder_name)
    }
}

fn clamp_quality(quality: f32, fallback: f32) -> f32 {
    if quality.is_nan() {
        return fallback;
    }
    quality.clamp(capture::MIN_QUALITY, 1.0)
}
