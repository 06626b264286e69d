// SPDX-License-Identifier: GPL-3.0-only

//! Screen runtime
//!
//! Owns the [`AppState`], executes the [`Effect`]s it asks for and feeds the
//! results back as [`Message`]s:
//!
//! ```text
//! host input ──► dispatch ──► AppState::update ──► effects
//!                   ▲                                  │
//!                   │        spawned backend work ◄────┤
//!                   │                 │                │ sync effects
//!                   └── completions ◄─┘                │ (session, notify)
//!                                                      ▼
//!                                              CameraSession / Notifier
//! ```
//!
//! Backend futures run on the ambient tokio runtime. `dispatch` must be
//! called from within one.

use crate::animation::{AnimationController, AnimationFrame, EntranceAnimation};
use crate::app::{
    AppState, CameraFacing, CaptureSettings, Effect, Message, Notice, ViewMode,
};
use crate::backends::directory::{DirectoryGallery, DirectoryLibrary};
use crate::backends::virtual_camera::VirtualCamera;
use crate::backends::{BackendResult, CameraBackend, GalleryBackend, MediaLibraryBackend};
use crate::config::Config;
use crate::errors::{CaptureError, PickError, SaveError};
use crate::permissions::{PermissionGateway, PermissionState};
use futures::FutureExt;
use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

const BACKEND_PANICKED: &str = "backend stopped unexpectedly";

/// Message carried by a caught panic, if it is a string
fn panic_reason(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(reason) = panic.downcast_ref::<&str>() {
        reason
    } else if let Some(reason) = panic.downcast_ref::<String>() {
        reason
    } else {
        "unknown"
    }
}

/// Surface for user-visible notices (alerts on a phone, a status line here)
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Notifier that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        if notice.is_error() {
            warn!(title = notice.title(), "{}", notice);
        } else {
            info!(title = notice.title(), "{}", notice);
        }
    }
}

/// The three capability backends a screen talks to
#[derive(Clone)]
pub struct Backends {
    pub camera: Arc<dyn CameraBackend>,
    pub gallery: Arc<dyn GalleryBackend>,
    pub library: Arc<dyn MediaLibraryBackend>,
}

impl Backends {
    pub fn new(
        camera: Arc<dyn CameraBackend>,
        gallery: Arc<dyn GalleryBackend>,
        library: Arc<dyn MediaLibraryBackend>,
    ) -> Self {
        Self {
            camera,
            gallery,
            library,
        }
    }

    /// Virtual camera plus directory gallery and library
    pub fn desktop(config: &Config) -> Self {
        let capture_dir = config.capture_directory();
        Self::new(
            Arc::new(VirtualCamera::new(capture_dir.clone())),
            Arc::new(DirectoryGallery::new(config.gallery_directory(), capture_dir)),
            Arc::new(DirectoryLibrary::new(config.library_directory())),
        )
    }

    fn gateway(&self) -> PermissionGateway {
        PermissionGateway::new(
            Arc::clone(&self.camera),
            Arc::clone(&self.gallery),
            Arc::clone(&self.library),
        )
    }
}

/// Open camera session, released when dropped
pub struct CameraSession {
    backend: Arc<dyn CameraBackend>,
    facing: CameraFacing,
}

impl CameraSession {
    pub fn open(backend: Arc<dyn CameraBackend>, facing: CameraFacing) -> BackendResult<Self> {
        backend.open_session(facing)?;
        info!(%facing, "Camera session acquired");
        Ok(Self { backend, facing })
    }

    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    pub fn set_facing(&mut self, facing: CameraFacing) -> BackendResult<()> {
        self.backend.set_facing(facing)?;
        self.facing = facing;
        Ok(())
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        match self.backend.close_session() {
            Ok(()) => info!("Camera session released"),
            Err(e) => warn!(error = %e, "Failed to release camera session"),
        }
    }
}

/// A mounted screen: state machine, animation and backends wired together
pub struct Screen {
    state: AppState,
    animation: AnimationController,
    gateway: PermissionGateway,
    backends: Backends,
    notifier: Arc<dyn Notifier>,
    session: Option<CameraSession>,
    completions_tx: mpsc::UnboundedSender<Message>,
    completions_rx: mpsc::UnboundedReceiver<Message>,
    /// Spawned backend calls whose result has not been dispatched yet
    pending: usize,
    started: Instant,
}

impl Screen {
    pub fn new(settings: CaptureSettings, backends: Backends, notifier: Arc<dyn Notifier>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            state: AppState::new(settings),
            animation: AnimationController::new(EntranceAnimation::default()),
            gateway: backends.gateway(),
            backends,
            notifier,
            session: None,
            completions_tx,
            completions_rx,
            pending: 0,
            started: Instant::now(),
        }
    }

    /// Screen on the desktop backends, notices go to the log
    pub fn desktop(config: &Config) -> Self {
        Self::new(
            CaptureSettings::from(config),
            Backends::desktop(config),
            Arc::new(LogNotifier),
        )
    }

    /// Mount: run the startup permission checks
    pub fn start(&mut self) {
        self.dispatch(Message::Start);
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn animation(&self) -> &AnimationController {
        &self.animation
    }

    /// Time since the screen was created
    pub fn now(&self) -> Duration {
        self.started.elapsed()
    }

    /// Current opacity/scale of the polaroid frame
    pub fn frame(&self) -> AnimationFrame {
        self.animation.sample(self.now())
    }

    /// Whether the camera session is held right now
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Backend calls still running
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Apply a message and everything it triggers synchronously
    pub fn dispatch(&mut self, message: Message) {
        let mut queue = VecDeque::from([message]);
        while let Some(message) = queue.pop_front() {
            debug!(?message, "Dispatching");
            let effects = self.state.update(message);
            self.observe_display();
            for effect in effects {
                if let Some(follow_up) = self.perform(effect) {
                    queue.push_back(follow_up);
                }
            }
        }
    }

    /// Dispatch every backend result that already arrived. Returns how many.
    pub fn poll_completions(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.completions_rx.try_recv() {
            self.pending = self.pending.saturating_sub(1);
            self.dispatch(message);
            handled += 1;
        }
        handled
    }

    /// Wait for the next backend result and dispatch it.
    /// Returns `false` when nothing is running.
    pub async fn next_completion(&mut self) -> bool {
        if self.pending == 0 {
            return false;
        }
        match self.completions_rx.recv().await {
            Some(message) => {
                self.pending -= 1;
                self.dispatch(message);
                true
            }
            None => false,
        }
    }

    /// Run until no backend call is outstanding
    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    /// The frame animates whenever the preview starts showing something new
    fn observe_display(&mut self) {
        if self.state.mode() != ViewMode::Preview {
            return;
        }
        let now = self.now();
        self.animation.observe(self.state.display_key(), now);
    }

    /// Run backend work on the runtime. If it panics, `on_panic` is
    /// delivered instead so the pending count and in-flight flags drain.
    fn spawn<F>(&mut self, task: F, on_panic: Message)
    where
        F: Future<Output = Message> + Send + 'static,
    {
        let tx = self.completions_tx.clone();
        self.pending += 1;
        tokio::spawn(async move {
            let message = match AssertUnwindSafe(task).catch_unwind().await {
                Ok(message) => message,
                Err(panic) => {
                    error!(
                        reason = panic_reason(panic.as_ref()),
                        "Backend task panicked"
                    );
                    on_panic
                }
            };
            // The screen may be gone by the time the backend answers
            let _ = tx.send(message);
        });
    }

    /// Execute one effect. Failures detected synchronously come back as a
    /// follow-up message.
    fn perform(&mut self, effect: Effect) -> Option<Message> {
        match effect {
            Effect::RequestPermission(capability) => {
                let request = self.gateway.request(capability);
                self.spawn(
                    async move {
                        Message::PermissionResolved {
                            capability,
                            state: request.await,
                        }
                    },
                    Message::PermissionResolved {
                        capability,
                        state: PermissionState::Denied,
                    },
                );
                None
            }

            Effect::OpenSession(facing) => {
                // Never hold two sessions
                self.session = None;
                match CameraSession::open(Arc::clone(&self.backends.camera), facing) {
                    Ok(session) => {
                        self.session = Some(session);
                        None
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to open camera session");
                        Some(Message::SessionFailed(CaptureError::SessionFailed(
                            e.to_string(),
                        )))
                    }
                }
            }

            Effect::ReconfigureSession(facing) => {
                let Some(session) = self.session.as_mut() else {
                    return Some(Message::SessionFailed(CaptureError::NoSession));
                };
                match session.set_facing(facing) {
                    Ok(()) => None,
                    Err(e) => {
                        error!(error = %e, %facing, "Failed to switch camera");
                        Some(Message::SessionFailed(CaptureError::SessionFailed(
                            e.to_string(),
                        )))
                    }
                }
            }

            Effect::CloseSession => {
                self.session = None;
                None
            }

            Effect::CaptureFrame { epoch, quality } => {
                if self.session.is_none() {
                    return Some(Message::CaptureCompleted {
                        epoch,
                        result: Err(CaptureError::NoSession),
                    });
                }
                let capture = self.backends.camera.capture_frame(quality);
                self.spawn(
                    async move {
                        Message::CaptureCompleted {
                            epoch,
                            result: capture
                                .await
                                .map_err(|e| CaptureError::Failed(e.to_string())),
                        }
                    },
                    Message::CaptureCompleted {
                        epoch,
                        result: Err(CaptureError::Failed(BACKEND_PANICKED.into())),
                    },
                );
                None
            }

            Effect::PickImage { epoch, options } => {
                let pick = self.backends.gallery.pick_image(options);
                self.spawn(
                    async move {
                        Message::PickCompleted {
                            epoch,
                            result: pick.await.map_err(|e| PickError::Failed(e.to_string())),
                        }
                    },
                    Message::PickCompleted {
                        epoch,
                        result: Err(PickError::Failed(BACKEND_PANICKED.into())),
                    },
                );
                None
            }

            Effect::SaveToLibrary { ticket, uri } => {
                let save = self.backends.library.save_to_library(uri);
                self.spawn(
                    async move {
                        Message::SaveCompleted {
                            ticket,
                            result: save.await.map_err(|e| SaveError::WriteFailed(e.to_string())),
                        }
                    },
                    Message::SaveCompleted {
                        ticket,
                        result: Err(SaveError::WriteFailed(BACKEND_PANICKED.into())),
                    },
                );
                None
            }

            Effect::Notify(notice) => {
                self.notifier.notify(&notice);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::scripted::{
        RecordingNotifier, ScriptedCamera, ScriptedGallery, ScriptedLibrary,
    };

    #[test]
    fn test_session_guard_closes_on_drop() {
        let camera = Arc::new(ScriptedCamera::new());
        let session = CameraSession::open(camera.clone(), CameraFacing::Front).unwrap();
        assert_eq!(camera.facing(), Some(CameraFacing::Front));
        drop(session);
        assert!(!camera.is_open());
        assert_eq!(camera.closes(), 1);
    }

    #[tokio::test]
    async fn test_dropping_screen_releases_camera() {
        let camera = Arc::new(ScriptedCamera::new());
        let backends = Backends::new(
            camera.clone(),
            Arc::new(ScriptedGallery::new()),
            Arc::new(ScriptedLibrary::new()),
        );
        let mut screen = Screen::new(
            CaptureSettings::default(),
            backends,
            Arc::new(RecordingNotifier::new()),
        );
        screen.start();
        screen.settle().await;
        screen.dispatch(Message::OpenCamera);
        assert!(camera.is_open());

        drop(screen);
        assert!(!camera.is_open());
    }
}
