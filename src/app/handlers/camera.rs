// SPDX-License-Identifier: GPL-3.0-only

//! Camera handlers
//!
//! Opening and closing the live session, flipping the facing, and photo
//! capture.

use crate::app::state::{AppState, Effect, Epoch, MediaSource, Notice, ViewMode};
use crate::errors::{CaptureError, PermissionError};
use crate::permissions::Capability;
use tracing::{debug, error, info, warn};

impl AppState {
    pub(crate) fn handle_open_camera(&mut self) -> Vec<Effect> {
        match self.mode {
            ViewMode::Preview => {
                if self.permissions.is_granted(Capability::Camera) {
                    return self.enter_camera();
                }
                if self.awaiting_camera_permission {
                    debug!("Camera permission prompt already pending");
                    return Vec::new();
                }
                info!("Camera permission not granted yet, requesting");
                self.awaiting_camera_permission = true;
                vec![Effect::RequestPermission(Capability::Camera)]
            }
            ViewMode::Denied => {
                if self.permissions.is_granted(Capability::Camera) {
                    self.enter_camera()
                } else {
                    vec![Effect::Notify(Notice::from(PermissionError::new(
                        Capability::Camera,
                    )))]
                }
            }
            ViewMode::Onboarding | ViewMode::CameraActive => {
                debug!(mode = ?self.mode, "Open camera ignored");
                Vec::new()
            }
        }
    }

    /// Enter CameraActive and acquire the session
    pub(crate) fn enter_camera(&mut self) -> Vec<Effect> {
        info!(facing = %self.facing, "Opening camera");
        self.transition(ViewMode::CameraActive);
        vec![Effect::OpenSession(self.facing)]
    }

    /// Leave CameraActive for Preview and release the session
    fn leave_camera(&mut self) -> Vec<Effect> {
        self.transition(ViewMode::Preview);
        vec![Effect::CloseSession]
    }

    pub(crate) fn handle_close_camera(&mut self) -> Vec<Effect> {
        if self.mode != ViewMode::CameraActive {
            return Vec::new();
        }
        if self.capture_in_flight {
            info!("Closing camera with a capture in flight, its result will be discarded");
        }
        self.leave_camera()
    }

    pub(crate) fn handle_toggle_facing(&mut self) -> Vec<Effect> {
        if self.mode != ViewMode::CameraActive {
            debug!(mode = ?self.mode, "Toggle facing ignored outside camera");
            return Vec::new();
        }
        self.facing = self.facing.toggled();
        info!(facing = %self.facing, "Camera facing toggled");
        vec![Effect::ReconfigureSession(self.facing)]
    }

    pub(crate) fn handle_capture(&mut self) -> Vec<Effect> {
        if self.mode != ViewMode::CameraActive {
            debug!(mode = ?self.mode, "Capture ignored outside camera");
            return Vec::new();
        }
        if self.capture_in_flight {
            debug!("Capture already in flight");
            return Vec::new();
        }

        info!("Capturing photo...");
        self.capture_in_flight = true;
        vec![Effect::CaptureFrame {
            epoch: self.epoch,
            quality: self.settings.capture_quality,
        }]
    }

    pub(crate) fn handle_session_failed(&mut self, error: CaptureError) -> Vec<Effect> {
        error!(error = %error, "Camera session failed");
        if self.mode != ViewMode::CameraActive {
            return vec![Effect::Notify(Notice::from(error))];
        }
        let mut effects = self.leave_camera();
        effects.push(Effect::Notify(Notice::from(error)));
        effects
    }

    pub(crate) fn handle_capture_completed(
        &mut self,
        epoch: Epoch,
        result: Result<String, CaptureError>,
    ) -> Vec<Effect> {
        if epoch != self.epoch || self.mode != ViewMode::CameraActive {
            warn!(
                stale_epoch = epoch.0,
                current_epoch = self.epoch.0,
                "Discarding stale capture result"
            );
            return Vec::new();
        }
        self.capture_in_flight = false;

        match result {
            Ok(uri) => {
                let media = self.set_media(uri, MediaSource::Camera);
                info!(uri = %media.uri, id = media.id.0, "Photo captured");
                self.leave_camera()
            }
            Err(e) => {
                error!(error = %e, "Failed to capture photo");
                vec![Effect::Notify(Notice::from(e))]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::app::state::{AppState, CameraFacing, Effect, Message, ViewMode};
    use crate::errors::CaptureError;
    use crate::permissions::{Capability, PermissionState};

    fn preview_state() -> AppState {
        let mut state = AppState::default();
        for capability in [Capability::GalleryRead, Capability::Camera] {
            state.update(Message::PermissionResolved {
                capability,
                state: PermissionState::Granted,
            });
        }
        state
    }

    #[test]
    fn test_open_camera_acquires_session() {
        let mut state = preview_state();
        let effects = state.update(Message::OpenCamera);
        assert_eq!(state.mode(), ViewMode::CameraActive);
        assert_eq!(effects, vec![Effect::OpenSession(CameraFacing::Back)]);
    }

    #[test]
    fn test_open_camera_without_permission_requests_it_once() {
        let mut state = AppState::default();
        state.update(Message::PermissionResolved {
            capability: Capability::GalleryRead,
            state: PermissionState::Granted,
        });

        let effects = state.update(Message::OpenCamera);
        assert_eq!(effects, vec![Effect::RequestPermission(Capability::Camera)]);
        assert!(state.update(Message::OpenCamera).is_empty());

        let effects = state.update(Message::PermissionResolved {
            capability: Capability::Camera,
            state: PermissionState::Granted,
        });
        assert_eq!(state.mode(), ViewMode::CameraActive);
        assert_eq!(effects, vec![Effect::OpenSession(CameraFacing::Back)]);
    }

    #[test]
    fn test_toggle_facing_only_while_camera_active() {
        let mut state = preview_state();
        assert!(state.update(Message::ToggleFacing).is_empty());
        assert_eq!(state.facing(), CameraFacing::Back);

        state.update(Message::OpenCamera);
        let effects = state.update(Message::ToggleFacing);
        assert_eq!(state.facing(), CameraFacing::Front);
        assert_eq!(effects, vec![Effect::ReconfigureSession(CameraFacing::Front)]);
    }

    #[test]
    fn test_capture_failure_stays_in_camera() {
        let mut state = preview_state();
        state.update(Message::OpenCamera);
        let epoch = state.epoch();
        state.update(Message::Capture);

        let effects = state.update(Message::CaptureCompleted {
            epoch,
            result: Err(CaptureError::Failed("sensor timeout".into())),
        });
        assert_eq!(state.mode(), ViewMode::CameraActive);
        assert!(!state.is_capturing());
        assert!(matches!(effects.as_slice(), [Effect::Notify(_)]));
    }

    #[test]
    fn test_double_capture_is_ignored() {
        let mut state = preview_state();
        state.update(Message::OpenCamera);
        assert_eq!(state.update(Message::Capture).len(), 1);
        assert!(state.update(Message::Capture).is_empty());
    }

    #[test]
    fn test_close_without_capture_keeps_media() {
        let mut state = preview_state();
        state.update(Message::OpenCamera);
        let effects = state.update(Message::CloseCamera);
        assert_eq!(effects, vec![Effect::CloseSession]);
        assert_eq!(state.mode(), ViewMode::Preview);
        assert_eq!(state.media(), None);
    }

    #[test]
    fn test_session_failure_returns_to_preview() {
        let mut state = preview_state();
        state.update(Message::OpenCamera);
        let effects = state.update(Message::SessionFailed(CaptureError::SessionFailed(
            "busy".into(),
        )));
        assert_eq!(state.mode(), ViewMode::Preview);
        assert_eq!(effects[0], Effect::CloseSession);
    }
}
