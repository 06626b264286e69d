// SPDX-License-Identifier: GPL-3.0-only

//! Application state management

use crate::config::Config;
use crate::errors::{AppError, CaptureError, PermissionError, PickError, SaveError};
use crate::permissions::{Capability, PermissionState, Permissions};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which screen is visible. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewMode {
    /// Waiting for the startup permission checks
    #[default]
    Onboarding,
    /// Gallery access was refused at startup
    Denied,
    /// Live camera session is open
    CameraActive,
    /// Decorative frame showing the current media or the placeholder
    Preview,
}

/// Where a piece of media came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaSource {
    Camera,
    Gallery,
}

/// Acquisition number, unique per successful capture or pick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MediaId(pub u64);

/// The photo currently shown in the frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedMedia {
    pub id: MediaId,
    /// Opaque handle to device-local content
    pub uri: String,
    pub source: MediaSource,
}

impl CapturedMedia {
    /// Only camera shots can be written back to the library
    pub fn is_save_eligible(&self) -> bool {
        self.source == MediaSource::Camera
    }
}

/// Identity of what the frame displays, observed by the entrance animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayKey {
    Placeholder,
    Media(MediaId),
}

/// Camera facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CameraFacing {
    #[default]
    Back,
    Front,
}

impl CameraFacing {
    pub fn toggled(self) -> Self {
        match self {
            CameraFacing::Back => CameraFacing::Front,
            CameraFacing::Front => CameraFacing::Back,
        }
    }
}

impl fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraFacing::Back => write!(f, "back"),
            CameraFacing::Front => write!(f, "front"),
        }
    }
}

/// Persistence guard
///
/// Simple two-state design: either a save is in flight or not.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SavingState {
    #[default]
    Idle,
    Saving {
        /// Matches the completion of this save
        ticket: u64,
        /// Media snapshot taken when the save started
        uri: String,
    },
}

impl SavingState {
    pub fn is_saving(&self) -> bool {
        matches!(self, SavingState::Saving { .. })
    }

    pub fn ticket(&self) -> Option<u64> {
        match self {
            SavingState::Idle => None,
            SavingState::Saving { ticket, .. } => Some(*ticket),
        }
    }
}

/// Generation token, bumped on every mode transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Epoch(pub u64);

/// Gallery picker options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickOptions {
    pub allow_editing: bool,
    pub quality: f32,
}

/// Settings the state machine passes to the backends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureSettings {
    pub capture_quality: f32,
    pub pick: PickOptions,
    pub default_facing: CameraFacing,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for CaptureSettings {
    fn from(config: &Config) -> Self {
        Self {
            capture_quality: config.capture_quality,
            pick: PickOptions {
                allow_editing: config.pick_allow_editing,
                quality: config.pick_quality,
            },
            default_facing: config.default_facing,
        }
    }
}

/// Result of a gallery pick that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    Picked(String),
    /// The user closed the picker without choosing anything
    Cancelled,
}

/// User-visible notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    PhotoSaved,
    Failed(AppError),
}

impl Notice {
    /// Short heading shown above the message
    pub fn title(&self) -> &'static str {
        match self {
            Notice::PhotoSaved => "Saved",
            Notice::Failed(AppError::Permission(e)) if e.capability == Capability::MediaWrite => {
                "Permission required"
            }
            Notice::Failed(AppError::Permission(_)) => "Permission denied",
            Notice::Failed(_) => "Error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Failed(_))
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::PhotoSaved => write!(f, "The photo was saved to your gallery"),
            Notice::Failed(e) => write!(f, "{}", e),
        }
    }
}

impl From<AppError> for Notice {
    fn from(err: AppError) -> Self {
        Notice::Failed(err)
    }
}

impl From<PermissionError> for Notice {
    fn from(err: PermissionError) -> Self {
        Notice::Failed(err.into())
    }
}

impl From<CaptureError> for Notice {
    fn from(err: CaptureError) -> Self {
        Notice::Failed(err.into())
    }
}

impl From<PickError> for Notice {
    fn from(err: PickError) -> Self {
        Notice::Failed(err.into())
    }
}

impl From<SaveError> for Notice {
    fn from(err: SaveError) -> Self {
        Notice::Failed(err.into())
    }
}

/// Messages applied to the state machine: user actions and OS results
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // ===== Permissions =====
    /// Screen mounted: run the startup permission checks
    Start,
    /// Ask again after a startup denial
    RetryPermissions,
    PermissionResolved {
        capability: Capability,
        state: PermissionState,
    },

    // ===== Camera =====
    OpenCamera,
    CloseCamera,
    ToggleFacing,
    Capture,
    /// The camera session could not be opened or reconfigured
    SessionFailed(CaptureError),
    CaptureCompleted {
        epoch: Epoch,
        result: Result<String, CaptureError>,
    },

    // ===== Gallery =====
    PickFromGallery,
    PickCompleted {
        epoch: Epoch,
        result: Result<PickOutcome, PickError>,
    },
    Clear,

    // ===== Library =====
    SavePhoto,
    SaveCompleted {
        ticket: u64,
        result: Result<(), SaveError>,
    },
}

/// Work the runtime performs on behalf of the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    RequestPermission(Capability),
    /// Acquire the exclusive camera session
    OpenSession(CameraFacing),
    /// Switch the facing of the live session
    ReconfigureSession(CameraFacing),
    /// Release the camera session
    CloseSession,
    CaptureFrame {
        epoch: Epoch,
        quality: f32,
    },
    PickImage {
        epoch: Epoch,
        options: PickOptions,
    },
    SaveToLibrary {
        ticket: u64,
        uri: String,
    },
    Notify(Notice),
}

/// Whole state of the screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub(crate) mode: ViewMode,
    pub(crate) media: Option<CapturedMedia>,
    pub(crate) permissions: Permissions,
    pub(crate) facing: CameraFacing,
    pub(crate) saving: SavingState,
    pub(crate) epoch: Epoch,
    pub(crate) settings: CaptureSettings,
    /// A capture request is waiting for the camera
    pub(crate) capture_in_flight: bool,
    /// The gallery picker is open
    pub(crate) pick_in_flight: bool,
    /// Opening the camera is blocked on the camera permission prompt
    pub(crate) awaiting_camera_permission: bool,
    pub(crate) next_media_id: u64,
    pub(crate) next_save_ticket: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(CaptureSettings::default())
    }
}

impl AppState {
    pub fn new(settings: CaptureSettings) -> Self {
        Self {
            mode: ViewMode::Onboarding,
            media: None,
            permissions: Permissions::default(),
            facing: settings.default_facing,
            saving: SavingState::Idle,
            epoch: Epoch::default(),
            settings,
            capture_in_flight: false,
            pick_in_flight: false,
            awaiting_camera_permission: false,
            next_media_id: 1,
            next_save_ticket: 1,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn media(&self) -> Option<&CapturedMedia> {
        self.media.as_ref()
    }

    pub fn permissions(&self) -> &Permissions {
        &self.permissions
    }

    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    pub fn saving(&self) -> &SavingState {
        &self.saving
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    pub fn is_capturing(&self) -> bool {
        self.capture_in_flight
    }

    pub fn is_picking(&self) -> bool {
        self.pick_in_flight
    }

    pub fn is_awaiting_camera_permission(&self) -> bool {
        self.awaiting_camera_permission
    }

    /// Identity of what the frame currently shows
    pub fn display_key(&self) -> DisplayKey {
        match &self.media {
            Some(media) => DisplayKey::Media(media.id),
            None => DisplayKey::Placeholder,
        }
    }

    /// Save is enabled: camera media present and no save in flight
    pub fn can_save(&self) -> bool {
        self.media.as_ref().is_some_and(CapturedMedia::is_save_eligible) && !self.saving.is_saving()
    }

    /// Camera can be entered from the current mode right now
    pub fn can_open_camera(&self) -> bool {
        match self.mode {
            ViewMode::Preview => true,
            ViewMode::Denied => self.permissions.is_granted(Capability::Camera),
            ViewMode::Onboarding | ViewMode::CameraActive => false,
        }
    }

    /// Gallery picker can be launched right now
    pub fn can_pick(&self) -> bool {
        self.mode == ViewMode::Preview
            && self.permissions.is_granted(Capability::GalleryRead)
            && !self.pick_in_flight
    }

    /// Move to `mode`, bumping the epoch so in-flight results become stale
    pub(crate) fn transition(&mut self, mode: ViewMode) {
        if self.mode == mode {
            return;
        }
        self.epoch = Epoch(self.epoch.0 + 1);
        self.capture_in_flight = false;
        self.pick_in_flight = false;
        self.awaiting_camera_permission = false;
        tracing::info!(from = ?self.mode, to = ?mode, epoch = self.epoch.0, "View mode changed");
        self.mode = mode;
    }

    /// Replace the current media (last write wins)
    pub(crate) fn set_media(&mut self, uri: String, source: MediaSource) -> &CapturedMedia {
        let id = MediaId(self.next_media_id);
        self.next_media_id += 1;
        self.media.insert(CapturedMedia { id, uri, source })
    }

    /// Serialize the state (for diagnostics and persistence by hosts)
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
