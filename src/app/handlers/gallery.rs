// SPDX-License-Identifier: GPL-3.0-only

//! Gallery handlers

use crate::app::state::{AppState, Effect, Epoch, MediaSource, Notice, PickOutcome, ViewMode};
use crate::errors::{PermissionError, PickError};
use crate::permissions::Capability;
use tracing::{debug, error, info, warn};

impl AppState {
    pub(crate) fn handle_pick_from_gallery(&mut self) -> Vec<Effect> {
        if !matches!(self.mode, ViewMode::Preview | ViewMode::Denied) {
            debug!(mode = ?self.mode, "Gallery pick ignored");
            return Vec::new();
        }
        // Short-circuit before the picker is ever launched
        if !self.permissions.is_granted(Capability::GalleryRead) {
            warn!("Gallery pick without read permission");
            return vec![Effect::Notify(Notice::from(PermissionError::new(
                Capability::GalleryRead,
            )))];
        }
        if self.pick_in_flight {
            debug!("Gallery picker already open");
            return Vec::new();
        }

        info!("Opening gallery picker");
        self.pick_in_flight = true;
        vec![Effect::PickImage {
            epoch: self.epoch,
            options: self.settings.pick,
        }]
    }

    pub(crate) fn handle_pick_completed(
        &mut self,
        epoch: Epoch,
        result: Result<PickOutcome, PickError>,
    ) -> Vec<Effect> {
        if epoch != self.epoch || !self.pick_in_flight {
            warn!(
                stale_epoch = epoch.0,
                current_epoch = self.epoch.0,
                "Discarding stale gallery result"
            );
            return Vec::new();
        }
        self.pick_in_flight = false;

        match result {
            Ok(PickOutcome::Picked(uri)) => {
                let media = self.set_media(uri, MediaSource::Gallery);
                info!(uri = %media.uri, id = media.id.0, "Photo picked from gallery");
                Vec::new()
            }
            Ok(PickOutcome::Cancelled) => {
                debug!("Gallery pick cancelled");
                Vec::new()
            }
            Err(e) => {
                error!(error = %e, "Gallery pick failed");
                vec![Effect::Notify(Notice::from(e))]
            }
        }
    }

    /// Drop the current media; the frame falls back to the placeholder
    pub(crate) fn handle_clear(&mut self) -> Vec<Effect> {
        if self.mode != ViewMode::Preview {
            debug!(mode = ?self.mode, "Clear ignored outside preview");
            return Vec::new();
        }
        if let Some(media) = self.media.take() {
            info!(id = media.id.0, "Media cleared");
        }
        Vec::new()
    }
}
