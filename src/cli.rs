// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Taking a photo without the interactive screen
//! - Inspecting the configuration

use polaroid::app::{CameraFacing, CaptureSettings, Message, Notice, ViewMode};
use polaroid::config::Config;
use polaroid::runtime::{Backends, LogNotifier, Notifier, Screen};
use std::sync::{Arc, Mutex};

/// Prints notices to stderr in addition to logging them
#[derive(Default)]
struct PrintNotifier {
    last: Mutex<Option<Notice>>,
}

impl PrintNotifier {
    fn last(&self) -> Option<Notice> {
        self.last.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Notifier for PrintNotifier {
    fn notify(&self, notice: &Notice) {
        LogNotifier.notify(notice);
        eprintln!("{}: {}", notice.title(), notice);
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = Some(notice.clone());
    }
}

/// Open the camera, take one photo and optionally save it to the library
pub fn snap(config: Config, front: bool, save: bool) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let notifier = Arc::new(PrintNotifier::default());
        let mut screen = Screen::new(
            CaptureSettings::from(&config),
            Backends::desktop(&config),
            notifier.clone(),
        );
        screen.start();
        screen.settle().await;

        screen.dispatch(Message::OpenCamera);
        screen.settle().await;
        if screen.state().mode() != ViewMode::CameraActive {
            return Err("Camera could not be opened".into());
        }

        if front != (screen.state().facing() == CameraFacing::Front) {
            screen.dispatch(Message::ToggleFacing);
        }

        screen.dispatch(Message::Capture);
        screen.settle().await;

        let Some(media) = screen.state().media() else {
            return Err("No photo was captured".into());
        };
        println!("Captured: {}", media.uri);

        if save {
            screen.dispatch(Message::SavePhoto);
            screen.settle().await;
            if notifier.last() != Some(Notice::PhotoSaved) {
                return Err("Photo was not saved".into());
            }
            println!("Saved to {}", config.library_directory().display());
        }

        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

/// Print the configuration file location and the effective settings
pub fn show_config(config: &Config, write_default: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = Config::config_path().ok_or("No configuration directory on this system")?;

    if write_default {
        if path.exists() {
            println!("Keeping existing {}", path.display());
        } else {
            Config::default().save_to(&path)?;
            println!("Wrote {}", path.display());
        }
    }

    println!("Config file: {}", path.display());
    println!("Gallery: {}", config.gallery_directory().display());
    println!("Library: {}", config.library_directory().display());
    println!("Captures: {}", config.capture_directory().display());
    println!();
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
