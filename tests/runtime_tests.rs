// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the screen runtime with scripted backends

use futures::FutureExt;
use futures::future::BoxFuture;
use polaroid::app::{
    CameraFacing, CaptureSettings, DisplayKey, MediaSource, Message, Notice, PickOptions,
    PickOutcome, SavingState, ViewMode,
};
use polaroid::backends::{BackendError, BackendResult, GalleryBackend};
use polaroid::backends::scripted::{
    RecordingNotifier, ScriptedCamera, ScriptedGallery, ScriptedLibrary,
};
use polaroid::errors::{AppError, CaptureError, PermissionError, PickError, SaveError};
use polaroid::permissions::{Capability, PermissionState};
use polaroid::runtime::{Backends, Screen};
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    screen: Screen,
    camera: Arc<ScriptedCamera>,
    gallery: Arc<ScriptedGallery>,
    library: Arc<ScriptedLibrary>,
    notifier: Arc<RecordingNotifier>,
}

impl Harness {
    fn new(camera: ScriptedCamera, gallery: ScriptedGallery, library: ScriptedLibrary) -> Self {
        let camera = Arc::new(camera);
        let gallery = Arc::new(gallery);
        let library = Arc::new(library);
        let notifier = Arc::new(RecordingNotifier::new());
        let screen = Screen::new(
            CaptureSettings::default(),
            Backends::new(camera.clone(), gallery.clone(), library.clone()),
            notifier.clone(),
        );
        Self {
            screen,
            camera,
            gallery,
            library,
            notifier,
        }
    }

    /// Mounted with every permission granted
    async fn started() -> Self {
        let mut harness = Self::new(
            ScriptedCamera::new(),
            ScriptedGallery::new(),
            ScriptedLibrary::new(),
        );
        harness.screen.start();
        harness.screen.settle().await;
        assert_eq!(harness.screen.state().mode(), ViewMode::Preview);
        harness
    }

    async fn send(&mut self, message: Message) {
        self.screen.dispatch(message);
        self.screen.settle().await;
    }

    async fn capture(&mut self, uri: &str) {
        self.camera.push_capture(Ok(uri.to_string()));
        self.send(Message::OpenCamera).await;
        self.send(Message::Capture).await;
    }
}

#[tokio::test]
async fn test_startup_grants_lead_to_preview() {
    let harness = Harness::started().await;
    let permissions = harness.screen.state().permissions();
    assert_eq!(permissions.get(Capability::GalleryRead), PermissionState::Granted);
    assert_eq!(permissions.get(Capability::Camera), PermissionState::Granted);
    assert_eq!(permissions.get(Capability::MediaWrite), PermissionState::Unknown);
    assert_eq!(harness.library.permission_requests(), 0);

    // The placeholder animates in once
    assert_eq!(harness.screen.animation().runs(), 1);
    assert_eq!(
        harness.screen.animation().observed(),
        Some(DisplayKey::Placeholder)
    );
}

#[tokio::test]
async fn test_denied_startup() {
    let mut harness = Harness::new(
        ScriptedCamera::new().with_permission(Ok(false)),
        ScriptedGallery::new().with_permission(Ok(false)),
        ScriptedLibrary::new(),
    );
    harness.screen.start();
    harness.screen.settle().await;
    assert_eq!(harness.screen.state().mode(), ViewMode::Denied);
    assert_eq!(
        harness.notifier.notices(),
        vec![Notice::from(PermissionError::new(Capability::GalleryRead))]
    );

    harness.send(Message::OpenCamera).await;
    harness.send(Message::PickFromGallery).await;
    assert_eq!(harness.screen.state().mode(), ViewMode::Denied);
    assert_eq!(harness.camera.opens(), 0);
    assert!(harness.gallery.pick_calls().is_empty());
}

#[tokio::test]
async fn test_failed_permission_check_is_a_denial() {
    let mut harness = Harness::new(
        ScriptedCamera::new(),
        ScriptedGallery::new().with_permission(Err(BackendError::Io("dbus down".into()))),
        ScriptedLibrary::new(),
    );
    harness.screen.start();
    harness.screen.settle().await;
    assert_eq!(harness.screen.state().mode(), ViewMode::Denied);
    assert_eq!(
        harness.screen.state().permissions().get(Capability::GalleryRead),
        PermissionState::Denied
    );
}

#[tokio::test]
async fn test_capture_shows_photo_and_restarts_animation() {
    let mut harness = Harness::started().await;
    harness.capture("file:///tmp/a.jpg").await;

    let state = harness.screen.state();
    let media = state.media().expect("captured media");
    assert_eq!(media.uri, "file:///tmp/a.jpg");
    assert_eq!(media.source, MediaSource::Camera);
    assert_eq!(state.mode(), ViewMode::Preview);

    assert_eq!(harness.screen.animation().runs(), 2);
    assert_eq!(
        harness.screen.animation().observed(),
        Some(DisplayKey::Media(media.id))
    );
    assert!(!harness.screen.has_session());
    assert!(!harness.camera.is_open());
    assert_eq!(harness.camera.capture_calls(), vec![0.8]);
}

#[tokio::test]
async fn test_camera_session_released_on_every_exit() {
    let mut harness = Harness::started().await;

    // Capture success
    harness.capture("file:///tmp/a.jpg").await;
    assert!(!harness.camera.is_open());

    // User cancel
    harness.send(Message::OpenCamera).await;
    assert!(harness.camera.is_open());
    harness.send(Message::CloseCamera).await;
    assert!(!harness.camera.is_open());

    // Capture error keeps the session, then the user leaves
    harness
        .camera
        .push_capture(Err(BackendError::Io("sensor error".into())));
    harness.send(Message::OpenCamera).await;
    harness.send(Message::Capture).await;
    assert_eq!(harness.screen.state().mode(), ViewMode::CameraActive);
    assert!(harness.camera.is_open());
    harness.send(Message::CloseCamera).await;
    assert!(!harness.camera.is_open());

    assert_eq!(harness.camera.opens(), harness.camera.closes());
}

#[tokio::test]
async fn test_session_open_failure_returns_to_preview() {
    let mut harness = Harness::started().await;
    harness.camera.fail_next_open(BackendError::Busy);
    harness.send(Message::OpenCamera).await;

    assert_eq!(harness.screen.state().mode(), ViewMode::Preview);
    assert!(!harness.screen.has_session());
    assert!(matches!(
        harness.notifier.last(),
        Some(Notice::Failed(AppError::Capture(CaptureError::SessionFailed(_))))
    ));
}

#[tokio::test]
async fn test_stale_capture_is_discarded() {
    let mut harness = Harness::started().await;
    harness
        .camera
        .push_capture(Ok("file:///tmp/late.jpg".to_string()));
    harness.send(Message::OpenCamera).await;

    // Close before the capture result is delivered
    harness.screen.dispatch(Message::Capture);
    harness.screen.dispatch(Message::CloseCamera);
    harness.screen.settle().await;

    assert!(harness.screen.state().media().is_none());
    assert_eq!(harness.screen.state().mode(), ViewMode::Preview);
    assert_eq!(harness.screen.animation().runs(), 1);
    assert!(!harness.camera.is_open());
}

#[tokio::test]
async fn test_toggle_facing_switches_live_session() {
    let mut harness = Harness::started().await;
    harness.send(Message::OpenCamera).await;
    assert_eq!(harness.camera.facing(), Some(CameraFacing::Back));

    harness.send(Message::ToggleFacing).await;
    assert_eq!(harness.camera.facing(), Some(CameraFacing::Front));
    assert_eq!(harness.screen.state().facing(), CameraFacing::Front);
}

#[tokio::test]
async fn test_pick_cancelled_changes_nothing() {
    let mut harness = Harness::started().await;
    harness.capture("file:///tmp/a.jpg").await;
    let before = harness.screen.state().clone();
    let runs = harness.screen.animation().runs();

    harness.gallery.push_pick(Ok(PickOutcome::Cancelled));
    harness.send(Message::PickFromGallery).await;

    assert_eq!(harness.screen.state().media(), before.media());
    assert_eq!(harness.screen.state().mode(), before.mode());
    assert_eq!(harness.screen.animation().runs(), runs);
    assert!(!harness.screen.state().is_picking());
}

#[tokio::test]
async fn test_picked_image_replaces_media() {
    let mut harness = Harness::started().await;
    harness.capture("file:///tmp/a.jpg").await;
    harness
        .gallery
        .push_pick(Ok(PickOutcome::Picked("file:///tmp/beach.jpg".into())));
    harness.send(Message::PickFromGallery).await;

    let media = harness.screen.state().media().unwrap();
    assert_eq!(media.uri, "file:///tmp/beach.jpg");
    assert_eq!(media.source, MediaSource::Gallery);
    assert_eq!(harness.screen.animation().runs(), 3);

    let options = harness.gallery.pick_calls();
    assert_eq!(options.len(), 1);
    assert!(options[0].allow_editing);
    assert_eq!(options[0].quality, 0.8);
}

#[tokio::test]
async fn test_save_writes_camera_photo() {
    let mut harness = Harness::started().await;
    harness.capture("file:///tmp/a.jpg").await;
    harness.send(Message::SavePhoto).await;

    assert_eq!(harness.library.saved(), vec!["file:///tmp/a.jpg".to_string()]);
    assert_eq!(harness.library.permission_requests(), 1);
    assert_eq!(harness.screen.state().saving(), &SavingState::Idle);
    assert_eq!(harness.notifier.last(), Some(Notice::PhotoSaved));
}

#[tokio::test]
async fn test_save_while_saving_has_no_extra_effect() {
    let mut harness = Harness::started().await;
    harness.capture("file:///tmp/a.jpg").await;

    harness.screen.dispatch(Message::SavePhoto);
    harness.screen.dispatch(Message::SavePhoto);
    harness.screen.dispatch(Message::SavePhoto);
    harness.screen.settle().await;

    assert_eq!(harness.library.permission_requests(), 1);
    assert_eq!(harness.library.save_calls(), 1);
    assert_eq!(harness.notifier.notices(), vec![Notice::PhotoSaved]);
}

#[tokio::test]
async fn test_save_failure_is_notified() {
    let mut harness = Harness::started().await;
    harness.capture("file:///tmp/a.jpg").await;
    harness
        .library
        .push_result(Err(BackendError::Io("disk full".into())));
    harness.send(Message::SavePhoto).await;

    assert_eq!(harness.screen.state().saving(), &SavingState::Idle);
    assert_eq!(
        harness.screen.state().media().unwrap().uri,
        "file:///tmp/a.jpg"
    );
    assert!(matches!(
        harness.notifier.last(),
        Some(Notice::Failed(AppError::Save(SaveError::WriteFailed(_))))
    ));
    assert!(harness.library.saved().is_empty());
}

#[tokio::test]
async fn test_gallery_media_is_never_written() {
    let mut harness = Harness::started().await;
    harness
        .gallery
        .push_pick(Ok(PickOutcome::Picked("file:///tmp/beach.jpg".into())));
    harness.send(Message::PickFromGallery).await;
    harness.send(Message::SavePhoto).await;

    assert_eq!(harness.library.save_calls(), 0);
    assert_eq!(harness.library.permission_requests(), 0);
    assert_eq!(
        harness.notifier.last(),
        Some(Notice::from(SaveError::NotFromCamera))
    );
}

#[tokio::test]
async fn test_write_permission_denied_skips_library() {
    let mut harness = Harness::new(
        ScriptedCamera::new(),
        ScriptedGallery::new(),
        ScriptedLibrary::new().with_permission(Ok(false)),
    );
    harness.screen.start();
    harness.screen.settle().await;
    harness.capture("file:///tmp/a.jpg").await;
    harness.send(Message::SavePhoto).await;

    assert_eq!(harness.library.save_calls(), 0);
    assert_eq!(harness.screen.state().saving(), &SavingState::Idle);
    assert_eq!(
        harness.notifier.last(),
        Some(Notice::from(PermissionError::new(Capability::MediaWrite)))
    );
}

#[tokio::test]
async fn test_camera_permission_asked_again_when_opening_camera() {
    // Refused at startup and again when the camera is opened from the preview
    let camera = ScriptedCamera::new().with_permission(Ok(false));
    let mut harness = Harness::new(camera, ScriptedGallery::new(), ScriptedLibrary::new());
    harness.screen.start();
    harness.screen.settle().await;
    assert_eq!(harness.screen.state().mode(), ViewMode::Preview);

    harness.send(Message::OpenCamera).await;
    assert_eq!(harness.screen.state().mode(), ViewMode::Preview);
    assert_eq!(harness.camera.opens(), 0);
    assert_eq!(
        harness.notifier.last(),
        Some(Notice::from(PermissionError::new(Capability::Camera)))
    );
}

/// Picker whose answer never arrives because it panics mid-flight
struct CrashingGallery;

impl GalleryBackend for CrashingGallery {
    fn request_read_permission(&self) -> BoxFuture<'static, BackendResult<bool>> {
        futures::future::ready(Ok(true)).boxed()
    }

    fn pick_image(&self, _options: PickOptions) -> BoxFuture<'static, BackendResult<PickOutcome>> {
        async {
            if true {
                panic!("picker crashed");
            }
            Ok::<_, BackendError>(PickOutcome::Cancelled)
        }
        .boxed()
    }
}

#[tokio::test]
async fn test_panicking_picker_reports_failure() {
    let notifier = Arc::new(RecordingNotifier::new());
    let mut screen = Screen::new(
        CaptureSettings::default(),
        Backends::new(
            Arc::new(ScriptedCamera::new()),
            Arc::new(CrashingGallery),
            Arc::new(ScriptedLibrary::new()),
        ),
        notifier.clone(),
    );
    screen.start();
    screen.settle().await;
    assert_eq!(screen.state().mode(), ViewMode::Preview);

    screen.dispatch(Message::PickFromGallery);
    assert!(screen.state().is_picking());
    tokio::time::timeout(Duration::from_secs(2), screen.settle())
        .await
        .expect("settle returns after a backend panic");

    assert_eq!(screen.pending(), 0);
    assert!(!screen.state().is_picking());
    assert!(screen.state().can_pick());
    assert_eq!(screen.state().media(), None);
    assert!(matches!(
        notifier.last(),
        Some(Notice::Failed(AppError::Pick(PickError::Failed(_))))
    ));
}
