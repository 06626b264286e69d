// SPDX-License-Identifier: GPL-3.0-only

//! Capture/preview state machine
//!
//! [`AppState`] is the whole state of the screen. [`AppState::update`] applies
//! one [`Message`] and returns the [`Effect`]s the runtime has to perform;
//! it never does I/O itself.
//!
//! # Modes
//!
//! ```text
//!   Onboarding ──gallery denied──▶ Denied ──retry──▶ Onboarding
//!        │                           │
//!  gallery granted             open camera
//!        ▼                     (camera granted)
//!     Preview ◀──capture / close──┐  │
//!        │                        │  ▼
//!        └──────open camera────▶ CameraActive
//! ```
//!
//! # Handler Modules
//!
//! - `handlers::permission`: onboarding and permission results
//! - `handlers::camera`: camera session, facing, capture
//! - `handlers::gallery`: gallery pick and clear
//! - `handlers::library`: saving to the media library

mod handlers;
pub mod state;
mod update;

pub use state::{
    AppState, CameraFacing, CaptureSettings, CapturedMedia, DisplayKey, Effect, Epoch, MediaId,
    MediaSource, Message, Notice, PickOptions, PickOutcome, SavingState, ViewMode,
};
