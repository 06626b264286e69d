// SPDX-License-Identifier: GPL-3.0-only

//! Entrance animation for the previewed photo
//!
//! Two channels run in parallel whenever the displayed media changes:
//! opacity 0 -> 1 over 220 ms and scale 0.96 -> 1 over 260 ms, both eased
//! out. The controller does not own a timer; callers pass the elapsed time of
//! their own clock to [`AnimationController::observe`] and
//! [`AnimationController::sample`].

use crate::app::DisplayKey;
use crate::constants::animation::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Quadratic ease-out: fast start, slow settle
pub fn ease_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// A single timed interpolation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub from: f32,
    pub to: f32,
    pub duration: Duration,
}

impl Channel {
    pub const fn new(from: f32, to: f32, duration: Duration) -> Self {
        Self { from, to, duration }
    }

    /// Value after `elapsed` time into the run
    pub fn value_at(&self, elapsed: Duration) -> f32 {
        if self.duration.is_zero() || elapsed >= self.duration {
            return self.to;
        }
        let t = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        self.from + (self.to - self.from) * ease_out_quad(t)
    }
}

/// Visible state of the frame at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationFrame {
    pub opacity: f32,
    pub scale: f32,
}

/// The fixed opacity + scale entrance run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntranceAnimation {
    pub opacity: Channel,
    pub scale: Channel,
}

impl Default for EntranceAnimation {
    fn default() -> Self {
        Self {
            opacity: Channel::new(OPACITY_FROM, OPACITY_TO, OPACITY_DURATION),
            scale: Channel::new(SCALE_FROM, SCALE_TO, SCALE_DURATION),
        }
    }
}

impl EntranceAnimation {
    /// Reset values every run starts from
    pub fn start_frame(&self) -> AnimationFrame {
        AnimationFrame {
            opacity: self.opacity.from,
            scale: self.scale.from,
        }
    }

    pub fn frame_at(&self, elapsed: Duration) -> AnimationFrame {
        AnimationFrame {
            opacity: self.opacity.value_at(elapsed),
            scale: self.scale.value_at(elapsed),
        }
    }

    /// Time until both channels are settled
    pub fn total_duration(&self) -> Duration {
        self.opacity.duration.max(self.scale.duration)
    }
}

/// Replays the entrance animation whenever the observed media identity changes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationController {
    animation: EntranceAnimation,
    /// Identity the current run was started for
    observed: Option<DisplayKey>,
    /// Clock reading at the start of the current run
    started_at: Option<Duration>,
    runs: u64,
}

impl AnimationController {
    pub fn new(animation: EntranceAnimation) -> Self {
        Self {
            animation,
            ..Default::default()
        }
    }

    /// Feed the currently displayed identity. Restarts the run if it changed.
    ///
    /// Returns true when a new run was started.
    pub fn observe(&mut self, key: DisplayKey, now: Duration) -> bool {
        if self.observed == Some(key) {
            return false;
        }
        self.observed = Some(key);
        self.restart(now);
        true
    }

    /// Start a new run from the reset values, abandoning any run in flight
    pub fn restart(&mut self, now: Duration) {
        self.started_at = Some(now);
        self.runs += 1;
        debug!(run = self.runs, key = ?self.observed, "Entrance animation started");
    }

    /// Frame at `now`. Before the first run the reset values are returned.
    pub fn sample(&self, now: Duration) -> AnimationFrame {
        match self.started_at {
            Some(start) => self.animation.frame_at(now.saturating_sub(start)),
            None => self.animation.start_frame(),
        }
    }

    /// Both channels reached their targets
    pub fn is_settled(&self, now: Duration) -> bool {
        self.started_at
            .is_some_and(|start| now.saturating_sub(start) >= self.animation.total_duration())
    }

    /// Number of runs started so far
    pub fn runs(&self) -> u64 {
        self.runs
    }

    pub fn observed(&self) -> Option<DisplayKey> {
        self.observed
    }

    pub fn animation(&self) -> &EntranceAnimation {
        &self.animation
    }
}
