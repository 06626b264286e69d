// SPDX-License-Identifier: MPL-2.0

//! Capability backends
//!
//! The screen talks to the device through three capabilities. Each is a trait
//! so hosts can plug in platform implementations:
//!
//! ```text
//! ┌─────────────────────┐
//! │   Screen runtime    │
//! └──────────┬──────────┘
//!            │
//!   ┌────────┼─────────────┐
//!   ▼        ▼             ▼
//! Camera   Gallery   MediaLibrary   ← capability traits
//!   │        │             │
//!   ▼        ▼             ▼
//! virtual  directory   directory    ← desktop implementations
//! ```
//!
//! Asynchronous operations return `'static` boxed futures so the runtime can
//! spawn them without borrowing the backend.

pub mod directory;
pub mod scripted;
pub mod virtual_camera;

use crate::app::{CameraFacing, PickOptions, PickOutcome};
use futures::future::BoxFuture;
use std::fmt;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Backend failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Operation needs an open camera session
    NoSession,
    /// Camera session is already held
    Busy,
    /// The URI does not point at device-local content
    InvalidUri(String),
    /// Image encoding/decoding failed
    Encoding(String),
    /// Filesystem or OS error
    Io(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::NoSession => write!(f, "No camera session is open"),
            BackendError::Busy => write!(f, "Camera is busy"),
            BackendError::InvalidUri(uri) => write!(f, "Unsupported media URI: {}", uri),
            BackendError::Encoding(msg) => write!(f, "Image encoding failed: {}", msg),
            BackendError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Io(err.to_string())
    }
}

impl From<image::ImageError> for BackendError {
    fn from(err: image::ImageError) -> Self {
        BackendError::Encoding(err.to_string())
    }
}

impl From<tokio::task::JoinError> for BackendError {
    fn from(err: tokio::task::JoinError) -> Self {
        BackendError::Io(format!("background task failed: {}", err))
    }
}

/// Live camera capability
pub trait CameraBackend: Send + Sync {
    /// Ask for camera access. `Ok(false)` means the user refused.
    fn request_permission(&self) -> BoxFuture<'static, BackendResult<bool>>;

    /// Acquire the exclusive live session
    fn open_session(&self, facing: CameraFacing) -> BackendResult<()>;

    /// Switch the facing of the open session
    fn set_facing(&self, facing: CameraFacing) -> BackendResult<()>;

    /// Release the live session. Closing a closed session is not an error.
    fn close_session(&self) -> BackendResult<()>;

    /// Take a picture with the open session and return its URI
    fn capture_frame(&self, quality: f32) -> BoxFuture<'static, BackendResult<String>>;
}

/// Gallery picker capability
pub trait GalleryBackend: Send + Sync {
    fn request_read_permission(&self) -> BoxFuture<'static, BackendResult<bool>>;

    /// Launch the picker. Cancellation is [`PickOutcome::Cancelled`], not an error.
    fn pick_image(&self, options: PickOptions) -> BoxFuture<'static, BackendResult<PickOutcome>>;
}

/// Persistent media library capability
pub trait MediaLibraryBackend: Send + Sync {
    fn request_write_permission(&self) -> BoxFuture<'static, BackendResult<bool>>;

    fn save_to_library(&self, uri: String) -> BoxFuture<'static, BackendResult<()>>;
}
