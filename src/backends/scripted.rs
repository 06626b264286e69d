// SPDX-License-Identifier: MPL-2.0

//! Scripted in-memory backends
//!
//! Deterministic capability implementations whose answers are queued up
//! front. Used by the test suites and handy for driving a [`Screen`] without
//! any device.
//!
//! [`Screen`]: crate::runtime::Screen

use super::{BackendError, BackendResult, CameraBackend, GalleryBackend, MediaLibraryBackend};
use crate::app::{CameraFacing, Notice, PickOptions, PickOutcome};
use crate::runtime::Notifier;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Default)]
struct CameraScript {
    permission: Option<BackendResult<bool>>,
    captures: VecDeque<BackendResult<String>>,
    open_failure: Option<BackendError>,
    session: Option<CameraFacing>,
    opens: usize,
    closes: usize,
    capture_calls: Vec<f32>,
}

/// Camera answering from a queue of capture results
#[derive(Default)]
pub struct ScriptedCamera {
    script: Mutex<CameraScript>,
}

impl ScriptedCamera {
    /// Camera that grants permission
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_permission(self, answer: BackendResult<bool>) -> Self {
        lock(&self.script).permission = Some(answer);
        self
    }

    /// Queue the result of the next capture
    pub fn push_capture(&self, result: BackendResult<String>) {
        lock(&self.script).captures.push_back(result);
    }

    /// Make the next `open_session` fail
    pub fn fail_next_open(&self, error: BackendError) {
        lock(&self.script).open_failure = Some(error);
    }

    pub fn is_open(&self) -> bool {
        lock(&self.script).session.is_some()
    }

    pub fn facing(&self) -> Option<CameraFacing> {
        lock(&self.script).session
    }

    /// Number of sessions opened so far
    pub fn opens(&self) -> usize {
        lock(&self.script).opens
    }

    /// Number of sessions released so far
    pub fn closes(&self) -> usize {
        lock(&self.script).closes
    }

    /// Quality of every capture request, in order
    pub fn capture_calls(&self) -> Vec<f32> {
        lock(&self.script).capture_calls.clone()
    }
}

impl CameraBackend for ScriptedCamera {
    fn request_permission(&self) -> BoxFuture<'static, BackendResult<bool>> {
        let answer = lock(&self.script).permission.clone().unwrap_or(Ok(true));
        futures::future::ready(answer).boxed()
    }

    fn open_session(&self, facing: CameraFacing) -> BackendResult<()> {
        let mut script = lock(&self.script);
        if let Some(error) = script.open_failure.take() {
            return Err(error);
        }
        if script.session.is_some() {
            return Err(BackendError::Busy);
        }
        script.session = Some(facing);
        script.opens += 1;
        Ok(())
    }

    fn set_facing(&self, facing: CameraFacing) -> BackendResult<()> {
        let mut script = lock(&self.script);
        let session = script.session.as_mut().ok_or(BackendError::NoSession)?;
        *session = facing;
        Ok(())
    }

    fn close_session(&self) -> BackendResult<()> {
        let mut script = lock(&self.script);
        if script.session.take().is_some() {
            script.closes += 1;
        }
        Ok(())
    }

    fn capture_frame(&self, quality: f32) -> BoxFuture<'static, BackendResult<String>> {
        let mut script = lock(&self.script);
        script.capture_calls.push(quality);
        let result = if script.session.is_none() {
            Err(BackendError::NoSession)
        } else {
            script
                .captures
                .pop_front()
                .unwrap_or_else(|| Err(BackendError::Io("no scripted capture".into())))
        };
        futures::future::ready(result).boxed()
    }
}

#[derive(Default)]
struct GalleryScript {
    permission: Option<BackendResult<bool>>,
    picks: VecDeque<BackendResult<PickOutcome>>,
    pick_calls: Vec<PickOptions>,
}

/// Gallery answering from a queue of picker outcomes
#[derive(Default)]
pub struct ScriptedGallery {
    script: Mutex<GalleryScript>,
}

impl ScriptedGallery {
    /// Gallery that grants permission and cancels every pick
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_permission(self, answer: BackendResult<bool>) -> Self {
        lock(&self.script).permission = Some(answer);
        self
    }

    /// Queue the outcome of the next pick
    pub fn push_pick(&self, result: BackendResult<PickOutcome>) {
        lock(&self.script).picks.push_back(result);
    }

    /// Options of every launched picker, in order
    pub fn pick_calls(&self) -> Vec<PickOptions> {
        lock(&self.script).pick_calls.clone()
    }
}

impl GalleryBackend for ScriptedGallery {
    fn request_read_permission(&self) -> BoxFuture<'static, BackendResult<bool>> {
        let answer = lock(&self.script).permission.clone().unwrap_or(Ok(true));
        futures::future::ready(answer).boxed()
    }

    fn pick_image(&self, options: PickOptions) -> BoxFuture<'static, BackendResult<PickOutcome>> {
        let mut script = lock(&self.script);
        script.pick_calls.push(options);
        let result = script.picks.pop_front().unwrap_or(Ok(PickOutcome::Cancelled));
        futures::future::ready(result).boxed()
    }
}

#[derive(Default)]
struct LibraryScript {
    permission: Option<BackendResult<bool>>,
    results: VecDeque<BackendResult<()>>,
    permission_requests: usize,
    saved: Vec<String>,
    save_calls: usize,
}

/// Media library recording every write
#[derive(Default)]
pub struct ScriptedLibrary {
    script: Mutex<LibraryScript>,
}

impl ScriptedLibrary {
    /// Library that grants permission and accepts every write
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_permission(self, answer: BackendResult<bool>) -> Self {
        lock(&self.script).permission = Some(answer);
        self
    }

    /// Queue the result of the next write
    pub fn push_result(&self, result: BackendResult<()>) {
        lock(&self.script).results.push_back(result);
    }

    /// URIs successfully written, in order
    pub fn saved(&self) -> Vec<String> {
        lock(&self.script).saved.clone()
    }

    /// Write attempts, successful or not
    pub fn save_calls(&self) -> usize {
        lock(&self.script).save_calls
    }

    pub fn permission_requests(&self) -> usize {
        lock(&self.script).permission_requests
    }
}

impl MediaLibraryBackend for ScriptedLibrary {
    fn request_write_permission(&self) -> BoxFuture<'static, BackendResult<bool>> {
        let mut script = lock(&self.script);
        script.permission_requests += 1;
        let answer = script.permission.clone().unwrap_or(Ok(true));
        futures::future::ready(answer).boxed()
    }

    fn save_to_library(&self, uri: String) -> BoxFuture<'static, BackendResult<()>> {
        let mut script = lock(&self.script);
        script.save_calls += 1;
        let result = script.results.pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            script.saved.push(uri);
        }
        futures::future::ready(result).boxed()
    }
}

/// Notifier keeping every notice for later inspection
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.notices).clone()
    }

    pub fn last(&self) -> Option<Notice> {
        lock(&self.notices).last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &Notice) {
        lock(&self.notices).push(notice.clone());
    }
}
