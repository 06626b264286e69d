// SPDX-License-Identifier: MPL-2.0

//! Error types for the polaroid screen
//!
//! Every error is caught at the boundary of the operation that produced it
//! and turned into a [`Notice`](crate::app::Notice) for the user. Gallery
//! cancellation is not an error and has no variant here.

use crate::permissions::Capability;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// A capability was not granted
    Permission(PermissionError),
    /// Camera capture failed
    Capture(CaptureError),
    /// Gallery picker failed
    Pick(PickError),
    /// Writing to the media library failed or was not allowed
    Save(SaveError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
}

/// A capability the user (or the OS) refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionError {
    pub capability: Capability,
}

impl PermissionError {
    pub fn new(capability: Capability) -> Self {
        Self { capability }
    }
}

/// Camera capture errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Capture was requested without a live camera session
    NoSession,
    /// The camera session could not be opened or reconfigured
    SessionFailed(String),
    /// Hardware or OS failure while taking the picture
    Failed(String),
}

/// Gallery picker errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickError {
    /// The picker could not read or deliver the asset
    Failed(String),
}

/// Media library errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveError {
    /// Nothing is being previewed
    NothingToSave,
    /// The previewed media came from the gallery and is already in the library
    NotFromCamera,
    /// The library write failed
    WriteFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Permission(e) => write!(f, "{}", e),
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Pick(e) => write!(f, "Gallery error: {}", e),
            AppError::Save(e) => write!(f, "Save error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl fmt::Display for PermissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.capability {
            Capability::Camera => write!(f, "Camera access is required to take photos"),
            Capability::GalleryRead => {
                write!(f, "Access to the device gallery is required")
            }
            Capability::MediaWrite => {
                write!(f, "Access to the media library is required to save photos")
            }
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::NoSession => write!(f, "Camera is not open"),
            CaptureError::SessionFailed(msg) => write!(f, "Camera session failed: {}", msg),
            CaptureError::Failed(msg) => write!(f, "Could not take the photo: {}", msg),
        }
    }
}

impl fmt::Display for PickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PickError::Failed(msg) => write!(f, "Could not select the photo: {}", msg),
        }
    }
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::NothingToSave => write!(f, "There is no photo to save"),
            SaveError::NotFromCamera => write!(f, "Only photos taken with the camera can be saved"),
            SaveError::WriteFailed(msg) => write!(f, "Could not save the photo: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for PermissionError {}
impl std::error::Error for CaptureError {}
impl std::error::Error for PickError {}
impl std::error::Error for SaveError {}

impl From<PermissionError> for AppError {
    fn from(err: PermissionError) -> Self {
        AppError::Permission(err)
    }
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<PickError> for AppError {
    fn from(err: PickError) -> Self {
        AppError::Pick(err)
    }
}

impl From<SaveError> for AppError {
    fn from(err: SaveError) -> Self {
        AppError::Save(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
