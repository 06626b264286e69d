// SPDX-License-Identifier: MPL-2.0

//! Polaroid - a camera and gallery screen that shows one photo in a polaroid frame
//!
//! The user grants permissions, takes a photo or picks one from the gallery,
//! sees it animate into the frame, and can save camera photos to the media
//! library.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Capture/preview state machine (pure, no I/O)
//! - [`permissions`]: Permission gateway for camera, gallery and library
//! - [`animation`]: Entrance animation of the polaroid frame
//! - [`backends`]: Camera, gallery and media library capabilities
//! - [`runtime`]: Executes state machine effects against the backends
//! - [`config`]: User configuration handling
//! - [`storage`]: File naming, URIs and JPEG encoding
//! - [`terminal`]: Interactive terminal host
//!
//! # Example
//!
//! The screen spawns backend work, so it has to live inside a tokio runtime:
//!
//! ```no_run
//! #[tokio::main]
//! async fn main() -> polaroid::AppResult<()> {
//!     let config = polaroid::Config::load()?;
//!     let mut screen = polaroid::runtime::Screen::desktop(&config);
//!     screen.start();
//!     screen.settle().await;
//!     println!("{:?}", screen.state().mode());
//!     Ok(())
//! }
//! ```

pub mod animation;
pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod permissions;
pub mod runtime;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{AppState, Effect, Message, ViewMode};
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use runtime::Screen;
