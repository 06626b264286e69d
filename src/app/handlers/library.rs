// SPDX-License-Identifier: GPL-3.0-only

//! Media library handlers
//!
//! Saving runs as: `SavePhoto` -> media-write permission -> library write ->
//! `SaveCompleted`. [`SavingState`] admits one save at a time and every exit
//! path returns it to `Idle`.

use crate::app::state::{AppState, Effect, MediaSource, Notice, SavingState};
use crate::errors::SaveError;
use crate::permissions::Capability;
use tracing::{debug, error, info, warn};

impl AppState {
    pub(crate) fn handle_save_photo(&mut self) -> Vec<Effect> {
        if self.saving.is_saving() {
            debug!("Save already in progress, ignoring");
            return Vec::new();
        }

        let uri = match &self.media {
            None => {
                warn!("Save requested with nothing to save");
                return vec![Effect::Notify(Notice::from(SaveError::NothingToSave))];
            }
            Some(media) if media.source != MediaSource::Camera => {
                warn!(id = media.id.0, "Save requested for gallery media");
                return vec![Effect::Notify(Notice::from(SaveError::NotFromCamera))];
            }
            Some(media) => media.uri.clone(),
        };

        let ticket = self.next_save_ticket;
        self.next_save_ticket += 1;
        info!(ticket, uri = %uri, "Saving photo");
        self.saving = SavingState::Saving { ticket, uri };

        // Asked lazily: only a save ever needs write access
        vec![Effect::RequestPermission(Capability::MediaWrite)]
    }

    pub(crate) fn handle_save_completed(
        &mut self,
        ticket: u64,
        result: Result<(), SaveError>,
    ) -> Vec<Effect> {
        if self.saving.ticket() != Some(ticket) {
            warn!(ticket, "Discarding result of an unknown save");
            return Vec::new();
        }
        self.saving = SavingState::Idle;

        match result {
            Ok(()) => {
                info!(ticket, "Photo saved to library");
                vec![Effect::Notify(Notice::PhotoSaved)]
            }
            Err(e) => {
                error!(ticket, error = %e, "Failed to save photo");
                vec![Effect::Notify(Notice::from(e))]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::app::state::{AppState, Effect, MediaSource, Message, Notice, SavingState};
    use crate::errors::SaveError;
    use crate::permissions::{Capability, PermissionState};

    fn with_media(source: MediaSource) -> AppState {
        let mut state = AppState::default();
        state.update(Message::PermissionResolved {
            capability: Capability::GalleryRead,
            state: PermissionState::Granted,
        });
        state.set_media("file:///tmp/a.jpg".into(), source);
        state
    }

    #[test]
    fn test_save_requests_write_permission_lazily() {
        let mut state = with_media(MediaSource::Camera);
        let effects = state.update(Message::SavePhoto);
        assert_eq!(effects, vec![Effect::RequestPermission(Capability::MediaWrite)]);
        assert!(state.saving().is_saving());
    }

    #[test]
    fn test_granted_write_saves_snapshot_uri() {
        let mut state = with_media(MediaSource::Camera);
        state.update(Message::SavePhoto);
        // Clearing mid-save does not change what is written
        state.update(Message::Clear);

        let effects = state.update(Message::PermissionResolved {
            capability: Capability::MediaWrite,
            state: PermissionState::Granted,
        });
        assert_eq!(
            effects,
            vec![Effect::SaveToLibrary {
                ticket: 1,
                uri: "file:///tmp/a.jpg".into()
            }]
        );
    }

    #[test]
    fn test_denied_write_resets_to_idle() {
        let mut state = with_media(MediaSource::Camera);
        state.update(Message::SavePhoto);
        let effects = state.update(Message::PermissionResolved {
            capability: Capability::MediaWrite,
            state: PermissionState::Denied,
        });
        assert_eq!(state.saving(), &SavingState::Idle);
        assert!(matches!(effects.as_slice(), [Effect::Notify(n)] if n.is_error()));
    }

    #[test]
    fn test_gallery_media_is_rejected() {
        let mut state = with_media(MediaSource::Gallery);
        let effects = state.update(Message::SavePhoto);
        assert_eq!(
            effects,
            vec![Effect::Notify(Notice::from(SaveError::NotFromCamera))]
        );
        assert_eq!(state.saving(), &SavingState::Idle);
    }

    #[test]
    fn test_reentrant_save_is_ignored() {
        let mut state = with_media(MediaSource::Camera);
        state.update(Message::SavePhoto);
        assert!(state.update(Message::SavePhoto).is_empty());
        assert_eq!(state.saving().ticket(), Some(1));
    }

    #[test]
    fn test_unknown_ticket_is_discarded() {
        let mut state = with_media(MediaSource::Camera);
        state.update(Message::SavePhoto);
        let effects = state.update(Message::SaveCompleted {
            ticket: 99,
            result: Ok(()),
        });
        assert!(effects.is_empty());
        assert!(state.saving().is_saving());
    }
}
