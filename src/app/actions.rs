// SPDX-License-Identifier: MPL-2.0

//! Control actions
//!
//! Every state change a user can trigger goes through [`AppContext::apply`].
//! Actions parse from their canonical kebab-case names as well as the short
//! HTML form keys (`stop`, `click`, `grey`, `neg`, `face`, `rec`).

use super::AppContext;
use super::state::ToggleSnapshot;
use crate::backends::camera::BackendId;
use crate::errors::{AppError, AppResult};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// A user-triggered state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    /// Pause or resume the stream (releases the device when pausing)
    ToggleStream,
    /// Save the next processed frame as a still
    RequestStillCapture,
    ToggleGrey,
    ToggleNegative,
    ToggleFaceOnly,
    /// Start a recording, or stop the active one
    ToggleRecording,
}

impl ControlAction {
    pub const ALL: [ControlAction; 6] = [
        ControlAction::ToggleStream,
        ControlAction::RequestStillCapture,
        ControlAction::ToggleGrey,
        ControlAction::ToggleNegative,
        ControlAction::ToggleFaceOnly,
        ControlAction::ToggleRecording,
    ];

    /// Canonical name
    pub fn name(&self) -> &'static str {
        match self {
            ControlAction::ToggleStream => "toggle-stream",
            ControlAction::RequestStillCapture => "request-still-capture",
            ControlAction::ToggleGrey => "toggle-grey",
            ControlAction::ToggleNegative => "toggle-negative",
            ControlAction::ToggleFaceOnly => "toggle-face-only",
            ControlAction::ToggleRecording => "toggle-recording",
        }
    }

    /// Short form key
    pub fn form_key(&self) -> &'static str {
        match self {
            ControlAction::ToggleStream => "stop",
            ControlAction::RequestStillCapture => "click",
            ControlAction::ToggleGrey => "grey",
            ControlAction::ToggleNegative => "neg",
            ControlAction::ToggleFaceOnly => "face",
            ControlAction::ToggleRecording => "rec",
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ControlAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s) || a.form_key().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::UnknownAction(s.to_string()))
    }
}

/// What an action did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// New value of `stream_on`
    Stream(bool),
    CaptureRequested,
    /// New value of `grey_on`
    Grey(bool),
    /// New value of `negative_on`
    Negative(bool),
    /// New value of `face_only_on`
    FaceOnly(bool),
    /// A recording began writing to this file
    RecordingStarted(PathBuf),
    /// The recording writing to this file was stopped
    RecordingStopped(PathBuf),
}

/// Status snapshot for index pages and the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    #[serde(flatten)]
    pub toggles: ToggleSnapshot,
    pub recording_on: bool,
    pub recording_path: Option<PathBuf>,
    pub device_index: Option<u32>,
    pub device_backend: Option<BackendId>,
}

impl AppContext {
    /// Apply one control action
    ///
    /// Only recording start failures are reported as errors; every other
    /// action always succeeds.
    pub fn apply(&self, action: ControlAction) -> AppResult<ActionOutcome> {
        info!(action = %action, "Applying control action");

        let outcome = match action {
            ControlAction::ToggleStream => {
                let on = self.toggles.toggle_stream();
                if on {
                    self.device.open();
                } else {
                    self.recorder.stop();
                    self.device.release();
                }
                ActionOutcome::Stream(on)
            }
            ControlAction::RequestStillCapture => {
                self.toggles.request_capture();
                ActionOutcome::CaptureRequested
            }
            ControlAction::ToggleGrey => ActionOutcome::Grey(self.toggles.toggle_grey()),
            ControlAction::ToggleNegative => {
                ActionOutcome::Negative(self.toggles.toggle_negative())
            }
            ControlAction::ToggleFaceOnly => {
                ActionOutcome::FaceOnly(self.toggles.toggle_face_only())
            }
            ControlAction::ToggleRecording => self.toggle_recording()?,
        };

        Ok(outcome)
    }

    fn toggle_recording(&self) -> AppResult<ActionOutcome> {
        // Recording needs live frames, so it always turns the stream on
        if self.toggles.ensure_stream_on() {
            self.device.open();
        }

        if let Some(path) = self.recorder.stop() {
            return Ok(ActionOutcome::RecordingStopped(path));
        }

        self.device.open();
        match self.recorder.start(self.config.frame_size()) {
            Ok(path) => Ok(ActionOutcome::RecordingStarted(path)),
            Err(e) => {
                warn!(error = %e, "Could not start recording");
                Err(e.into())
            }
        }
    }

    /// Current toggles, recording state and device
    pub fn status(&self) -> StatusView {
        StatusView {
            toggles: self.toggles.snapshot(),
            recording_on: self.recorder.is_recording(),
            recording_path: self.recorder.output_path(),
            device_index: self.device.active_index(),
            device_backend: self.device.active_backend(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_and_form_keys() {
        for action in ControlAction::ALL {
            assert_eq!(action.name().parse::<ControlAction>().unwrap(), action);
            assert_eq!(action.form_key().parse::<ControlAction>().unwrap(), action);
        }
        assert_eq!(
            " NEG ".parse::<ControlAction>().unwrap(),
            ControlAction::ToggleNegative
        );
    }

    #[test]
    fn test_unknown_action() {
        assert!(matches!(
            "zoom".parse::<ControlAction>(),
            Err(AppError::UnknownAction(name)) if name == "zoom"
        ));
    }
}
