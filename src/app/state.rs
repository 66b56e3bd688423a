// SPDX-License-Identifier: GPL-3.0-only

//! Shared user toggles
//!
//! Every streaming consumer reads these once per frame and every control
//! request flips them. All fields sit behind a single mutex so a snapshot is
//! always a consistent view and the one-shot capture flag can be tested and
//! cleared atomically.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Point-in-time copy of the toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleSnapshot {
    /// Live frames are produced; otherwise a paused placeholder is shown
    pub stream_on: bool,
    /// Frames are converted to greyscale
    pub grey_on: bool,
    /// Frames are color-inverted
    pub negative_on: bool,
    /// Frames are cropped to the most confident face
    pub face_only_on: bool,
}

impl Default for ToggleSnapshot {
    fn default() -> Self {
        Self {
            stream_on: true,
            grey_on: false,
            negative_on: false,
            face_only_on: false,
        }
    }
}

/// Toggles plus the pending capture flag, guarded together
#[derive(Debug, Default)]
struct Inner {
    toggles: ToggleSnapshot,
    capture_requested: bool,
}

/// Thread-safe toggle state shared by all consumers and control requests
#[derive(Debug, Default)]
pub struct ToggleState {
    inner: Mutex<Inner>,
}

impl ToggleState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Consistent copy of every toggle
    ///
    /// The pending capture flag is not part of it; it is only observable
    /// through [`consume_capture_request`](Self::consume_capture_request).
    pub fn snapshot(&self) -> ToggleSnapshot {
        self.lock().toggles
    }

    /// Flip `stream_on` and return the new value
    pub fn toggle_stream(&self) -> bool {
        let mut guard = self.lock();
        let t = &mut guard.toggles;
        t.stream_on = !t.stream_on;
        debug!(stream_on = t.stream_on, "Stream toggled");
        t.stream_on
    }

    /// Flip `grey_on` and return the new value
    pub fn toggle_grey(&self) -> bool {
        let mut guard = self.lock();
        let t = &mut guard.toggles;
        t.grey_on = !t.grey_on;
        t.grey_on
    }

    /// Flip `negative_on` and return the new value
    pub fn toggle_negative(&self) -> bool {
        let mut guard = self.lock();
        let t = &mut guard.toggles;
        t.negative_on = !t.negative_on;
        t.negative_on
    }

    /// Flip `face_only_on` and return the new value
    pub fn toggle_face_only(&self) -> bool {
        let mut guard = self.lock();
        let t = &mut guard.toggles;
        t.face_only_on = !t.face_only_on;
        t.face_only_on
    }

    /// Ask the next processed frame to be saved as a still
    ///
    /// Repeated requests before a consumer picks one up collapse into one.
    pub fn request_capture(&self) {
        self.lock().capture_requested = true;
    }

    /// Take the pending capture request, if any
    ///
    /// Returns `true` for exactly one caller per request, no matter how many
    /// consumers race for it.
    pub fn consume_capture_request(&self) -> bool {
        std::mem::take(&mut self.lock().capture_requested)
    }

    /// Turn the stream on if it is off; returns whether it changed
    pub fn ensure_stream_on(&self) -> bool {
        let mut guard = self.lock();
        let t = &mut guard.toggles;
        let changed = !t.stream_on;
        t.stream_on = true;
        changed
    }
}
