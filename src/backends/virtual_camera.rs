// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend
//!
//! Stands in for a hardware camera on desktops: each capture renders a test
//! pattern (a sunset gradient, mirrored for the front camera, with the sun
//! moving with the wall clock) and stores it as a JPEG in the capture cache.

use super::{BackendError, BackendResult, CameraBackend};
use crate::app::CameraFacing;
use crate::constants::{storage, virtual_camera};
use crate::storage::{encode_jpeg, file_uri, timestamped_file_name};
use futures::FutureExt;
use futures::future::BoxFuture;
use image::{Rgb, RgbImage};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Camera backed by a rendered test pattern
pub struct VirtualCamera {
    output_dir: PathBuf,
    frame_size: (u32, u32),
    /// Facing of the open session, `None` when closed
    session: Mutex<Option<CameraFacing>>,
}

impl VirtualCamera {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            frame_size: (virtual_camera::FRAME_WIDTH, virtual_camera::FRAME_HEIGHT),
            session: Mutex::new(None),
        }
    }

    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_size = (width.max(1), height.max(1));
        self
    }

    /// Whether a session is currently open
    pub fn is_open(&self) -> bool {
        self.lock_session().is_some()
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<CameraFacing>> {
        // The guarded value is a plain enum, a poisoned lock still holds a valid one
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CameraBackend for VirtualCamera {
    fn request_permission(&self) -> BoxFuture<'static, BackendResult<bool>> {
        let dir = self.output_dir.clone();
        async move {
            // The only thing a virtual camera needs is somewhere to write frames
            tokio::fs::create_dir_all(&dir).await?;
            Ok::<_, BackendError>(true)
        }
        .boxed()
    }

    fn open_session(&self, facing: CameraFacing) -> BackendResult<()> {
        let mut session = self.lock_session();
        if session.is_some() {
            return Err(BackendError::Busy);
        }
        info!(%facing, "Virtual camera session opened");
        *session = Some(facing);
        Ok(())
    }

    fn set_facing(&self, facing: CameraFacing) -> BackendResult<()> {
        let mut session = self.lock_session();
        let current = session.as_mut().ok_or(BackendError::NoSession)?;
        *current = facing;
        debug!(%facing, "Virtual camera facing changed");
        Ok(())
    }

    fn close_session(&self) -> BackendResult<()> {
        if self.lock_session().take().is_some() {
            info!("Virtual camera session closed");
        }
        Ok(())
    }

    fn capture_frame(&self, quality: f32) -> BoxFuture<'static, BackendResult<String>> {
        let facing = *self.lock_session();
        let dir = self.output_dir.clone();
        let (width, height) = self.frame_size;

        async move {
            let facing = facing.ok_or(BackendError::NoSession)?;
            let phase = chrono::Local::now().timestamp_subsec_millis() as f32 / 1000.0;

            let data = tokio::task::spawn_blocking(move || {
                let frame = render_test_pattern(width, height, facing, phase);
                encode_jpeg(&frame, quality)
            })
            .await??;

            tokio::fs::create_dir_all(&dir).await?;
            let path = dir.join(timestamped_file_name(storage::CAPTURE_PREFIX, "jpg"));
            tokio::fs::write(&path, &data).await?;

            info!(path = %path.display(), bytes = data.len(), "Virtual camera frame captured");
            Ok::<_, BackendError>(file_uri(&path))
        }
        .boxed()
    }
}

/// Sunset gradient with a sun whose horizontal position follows `phase` (0..1)
pub fn render_test_pattern(width: u32, height: u32, facing: CameraFacing, phase: f32) -> RgbImage {
    let sun_x = width as f32 * (0.2 + 0.6 * phase.clamp(0.0, 1.0));
    let sun_y = height as f32 * 0.45;
    let sun_radius = height as f32 * 0.12;
    let horizon = height as f32 * 0.6;

    RgbImage::from_fn(width, height, |x, y| {
        // Front camera is mirrored, like a selfie preview
        let x = match facing {
            CameraFacing::Back => x,
            CameraFacing::Front => width - 1 - x,
        };
        let (fx, fy) = (x as f32, y as f32);

        let dx = fx - sun_x;
        let dy = fy - sun_y;
        if fy < horizon && dx * dx + dy * dy <= sun_radius * sun_radius {
            return Rgb([255, 214, 102]);
        }

        if fy >= horizon {
            let t = (fy - horizon) / (height as f32 - horizon).max(1.0);
            return Rgb([lerp(123, 47, t), lerp(84, 133, t), lerp(47, 90, t)]);
        }

        let t = fy / horizon;
        Rgb([lerp(244, 229, t), lerp(153, 80, t), lerp(26, 80, t)])
    })
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t.clamp(0.0, 1.0)).round() as u8
}
