// SPDX-License-Identifier: GPL-3.0-only

//! Permission gateway
//!
//! Tracks one [`PermissionState`] per [`Capability`] and asks the capability
//! backends for grants. All three capabilities (camera, gallery read, media
//! library write) go through the same gateway.
//!
//! A failed check is recorded as [`PermissionState::Denied`]; a check can
//! never yield `Granted` by accident and never yields `Unknown`.

use crate::backends::{CameraBackend, GalleryBackend, MediaLibraryBackend};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Capabilities guarded by an OS permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Live camera session
    Camera,
    /// Reading the device gallery
    GalleryRead,
    /// Writing into the device media library
    MediaWrite,
}

impl Capability {
    pub const ALL: [Capability; 3] = [
        Capability::Camera,
        Capability::GalleryRead,
        Capability::MediaWrite,
    ];
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Camera => write!(f, "camera"),
            Capability::GalleryRead => write!(f, "gallery-read"),
            Capability::MediaWrite => write!(f, "media-write"),
        }
    }
}

/// Grant state of a single capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PermissionState {
    /// Not checked yet
    #[default]
    Unknown,
    Granted,
    Denied,
}

impl PermissionState {
    pub fn is_granted(self) -> bool {
        self == PermissionState::Granted
    }

    /// Fail-closed mapping of a backend answer
    pub fn from_check<E: fmt::Display>(capability: Capability, check: Result<bool, E>) -> Self {
        match check {
            Ok(true) => PermissionState::Granted,
            Ok(false) => PermissionState::Denied,
            Err(e) => {
                warn!(%capability, error = %e, "Permission check failed, treating as denied");
                PermissionState::Denied
            }
        }
    }
}

/// Recorded grant state of every capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Permissions {
    camera: PermissionState,
    gallery_read: PermissionState,
    media_write: PermissionState,
}

impl Permissions {
    pub fn get(&self, capability: Capability) -> PermissionState {
        match capability {
            Capability::Camera => self.camera,
            Capability::GalleryRead => self.gallery_read,
            Capability::MediaWrite => self.media_write,
        }
    }

    pub fn is_granted(&self, capability: Capability) -> bool {
        self.get(capability).is_granted()
    }

    /// Record an OS answer. `Unknown` is never recorded over a decided state.
    pub fn record(&mut self, capability: Capability, state: PermissionState) {
        if state == PermissionState::Unknown {
            return;
        }
        let slot = match capability {
            Capability::Camera => &mut self.camera,
            Capability::GalleryRead => &mut self.gallery_read,
            Capability::MediaWrite => &mut self.media_write,
        };
        *slot = state;
    }
}

/// Asks the capability backends for grants
#[derive(Clone)]
pub struct PermissionGateway {
    camera: Arc<dyn CameraBackend>,
    gallery: Arc<dyn GalleryBackend>,
    library: Arc<dyn MediaLibraryBackend>,
}

impl PermissionGateway {
    pub fn new(
        camera: Arc<dyn CameraBackend>,
        gallery: Arc<dyn GalleryBackend>,
        library: Arc<dyn MediaLibraryBackend>,
    ) -> Self {
        Self {
            camera,
            gallery,
            library,
        }
    }

    /// Request a capability from the OS.
    ///
    /// The OS decides whether to prompt; an already decided capability is
    /// expected to short-circuit on the platform side.
    pub fn request(&self, capability: Capability) -> BoxFuture<'static, PermissionState> {
        let check = match capability {
            Capability::Camera => self.camera.request_permission(),
            Capability::GalleryRead => self.gallery.request_read_permission(),
            Capability::MediaWrite => self.library.request_write_permission(),
        };
        async move {
            let state = PermissionState::from_check(capability, check.await);
            info!(%capability, ?state, "Permission resolved");
            state
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_error_is_denied() {
        let state = PermissionState::from_check(Capability::Camera, Err::<bool, _>("boom"));
        assert_eq!(state, PermissionState::Denied);
    }

    #[test]
    fn test_record_keeps_capabilities_independent() {
        let mut permissions = Permissions::default();
        permissions.record(Capability::GalleryRead, PermissionState::Granted);
        permissions.record(Capability::MediaWrite, PermissionState::Denied);

        assert_eq!(permissions.get(Capability::Camera), PermissionState::Unknown);
        assert!(permissions.is_granted(Capability::GalleryRead));
        assert_eq!(permissions.get(Capability::MediaWrite), PermissionState::Denied);
    }

    #[test]
    fn test_unknown_never_overwrites_decision() {
        let mut permissions = Permissions::default();
        permissions.record(Capability::Camera, PermissionState::Granted);
        permissions.record(Capability::Camera, PermissionState::Unknown);
        assert!(permissions.is_granted(Capability::Camera));
    }
}
