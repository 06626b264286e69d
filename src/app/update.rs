// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! The main `update()` function acts as a dispatcher, while specific handlers
//! are implemented in the `handlers` submodules organized by functional domain.

use crate::app::state::{AppState, Effect, Message};
use tracing::debug;

impl AppState {
    /// Apply one message and return the effects the runtime has to perform.
    ///
    /// Deterministic: the same state and message always produce the same new
    /// state and effects.
    pub fn update(&mut self, message: Message) -> Vec<Effect> {
        debug!(mode = ?self.mode, ?message, "Update");

        match message {
            // ===== Permissions =====
            Message::Start => self.handle_start(),
            Message::RetryPermissions => self.handle_retry_permissions(),
            Message::PermissionResolved { capability, state } => {
                self.handle_permission_resolved(capability, state)
            }

            // ===== Camera =====
            Message::OpenCamera => self.handle_open_camera(),
            Message::CloseCamera => self.handle_close_camera(),
            Message::ToggleFacing => self.handle_toggle_facing(),
            Message::Capture => self.handle_capture(),
            Message::SessionFailed(error) => self.handle_session_failed(error),
            Message::CaptureCompleted { epoch, result } => {
                self.handle_capture_completed(epoch, result)
            }

            // ===== Gallery =====
            Message::PickFromGallery => self.handle_pick_from_gallery(),
            Message::PickCompleted { epoch, result } => self.handle_pick_completed(epoch, result),
            Message::Clear => self.handle_clear(),

            // ===== Library =====
            Message::SavePhoto => self.handle_save_photo(),
            Message::SaveCompleted { ticket, result } => self.handle_save_completed(ticket, result),
        }
    }
}
