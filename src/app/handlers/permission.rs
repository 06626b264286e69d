// SPDX-License-Identifier: GPL-3.0-only

//! Permission handlers
//!
//! Startup checks, retry after denial, and routing of permission results to
//! the flow that asked for them.

use crate::app::state::{AppState, Effect, Notice, SavingState, ViewMode};
use crate::errors::PermissionError;
use crate::permissions::{Capability, PermissionState};
use tracing::{debug, info, warn};

impl AppState {
    pub(crate) fn handle_start(&mut self) -> Vec<Effect> {
        if self.mode != ViewMode::Onboarding {
            debug!(mode = ?self.mode, "Start ignored outside onboarding");
            return Vec::new();
        }
        info!("Requesting startup permissions");
        self.startup_requests()
    }

    pub(crate) fn handle_retry_permissions(&mut self) -> Vec<Effect> {
        if self.mode != ViewMode::Denied {
            return Vec::new();
        }
        info!("Retrying startup permissions");
        self.transition(ViewMode::Onboarding);
        self.startup_requests()
    }

    /// Gallery read decides the onboarding outcome. Camera is asked alongside
    /// so the camera button works without a second prompt later.
    fn startup_requests(&self) -> Vec<Effect> {
        let mut effects = vec![Effect::RequestPermission(Capability::GalleryRead)];
        if !self.permissions.is_granted(Capability::Camera) {
            effects.push(Effect::RequestPermission(Capability::Camera));
        }
        effects
    }

    pub(crate) fn handle_permission_resolved(
        &mut self,
        capability: Capability,
        state: PermissionState,
    ) -> Vec<Effect> {
        self.permissions.record(capability, state);

        match capability {
            Capability::GalleryRead => self.on_gallery_permission(state),
            Capability::Camera => self.on_camera_permission(state),
            Capability::MediaWrite => self.on_media_write_permission(state),
        }
    }

    fn on_gallery_permission(&mut self, state: PermissionState) -> Vec<Effect> {
        if self.mode != ViewMode::Onboarding {
            return Vec::new();
        }
        match state {
            PermissionState::Granted => {
                self.transition(ViewMode::Preview);
                Vec::new()
            }
            PermissionState::Denied => {
                warn!("Gallery permission denied at startup");
                self.transition(ViewMode::Denied);
                vec![Effect::Notify(Notice::from(PermissionError::new(
                    Capability::GalleryRead,
                )))]
            }
            PermissionState::Unknown => Vec::new(),
        }
    }

    fn on_camera_permission(&mut self, state: PermissionState) -> Vec<Effect> {
        if !self.awaiting_camera_permission {
            return Vec::new();
        }
        self.awaiting_camera_permission = false;

        match state {
            PermissionState::Granted if self.mode == ViewMode::Preview => self.enter_camera(),
            PermissionState::Granted => Vec::new(),
            _ => vec![Effect::Notify(Notice::from(PermissionError::new(
                Capability::Camera,
            )))],
        }
    }

    fn on_media_write_permission(&mut self, state: PermissionState) -> Vec<Effect> {
        let SavingState::Saving { ticket, uri } = &self.saving else {
            debug!("Media write permission resolved with no save in flight");
            return Vec::new();
        };

        if state.is_granted() {
            return vec![Effect::SaveToLibrary {
                ticket: *ticket,
                uri: uri.clone(),
            }];
        }

        warn!("Media write permission denied, save aborted");
        self.saving = SavingState::Idle;
        vec![Effect::Notify(Notice::from(PermissionError::new(
            Capability::MediaWrite,
        )))]
    }
}

#[cfg(test)]
mod tests {
    use crate::app::state::{AppState, Effect, Message, ViewMode};
    use crate::permissions::{Capability, PermissionState};

    fn resolved(capability: Capability, state: PermissionState) -> Message {
        Message::PermissionResolved { capability, state }
    }

    #[test]
    fn test_start_requests_gallery_and_camera() {
        let mut state = AppState::default();
        let effects = state.update(Message::Start);
        assert_eq!(
            effects,
            vec![
                Effect::RequestPermission(Capability::GalleryRead),
                Effect::RequestPermission(Capability::Camera),
            ]
        );
    }

    #[test]
    fn test_media_write_is_not_requested_at_startup() {
        let mut state = AppState::default();
        let effects = state.update(Message::Start);
        assert!(!effects.contains(&Effect::RequestPermission(Capability::MediaWrite)));
    }

    #[test]
    fn test_gallery_granted_enters_preview() {
        let mut state = AppState::default();
        state.update(Message::Start);
        state.update(resolved(Capability::GalleryRead, PermissionState::Granted));
        assert_eq!(state.mode(), ViewMode::Preview);
    }

    #[test]
    fn test_retry_returns_to_onboarding() {
        let mut state = AppState::default();
        state.update(Message::Start);
        state.update(resolved(Capability::GalleryRead, PermissionState::Denied));
        assert_eq!(state.mode(), ViewMode::Denied);

        let effects = state.update(Message::RetryPermissions);
        assert_eq!(state.mode(), ViewMode::Onboarding);
        assert!(effects.contains(&Effect::RequestPermission(Capability::GalleryRead)));
    }

    #[test]
    fn test_late_camera_result_does_not_open_camera() {
        let mut state = AppState::default();
        state.update(resolved(Capability::GalleryRead, PermissionState::Granted));
        let effects = state.update(resolved(Capability::Camera, PermissionState::Granted));
        assert!(effects.is_empty());
        assert_eq!(state.mode(), ViewMode::Preview);
    }
}
