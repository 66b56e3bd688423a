// SPDX-License-Identifier: GPL-3.0-only

//! Device probing
//!
//! Walks every index up to a bound, tries each backend, and reports what
//! opened and whether it delivered a frame. Used by the `list` command to
//! find a working `CAMERA_INDEX`.

use super::CaptureBackend;
use super::types::BackendId;
use std::sync::Arc;
use tracing::debug;

/// Outcome of probing one index with one backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Opened and read a frame of `(width, height, channels)`
    Ok {
        backend: BackendId,
        shape: (u32, u32, u8),
    },
    /// Opened but could not read a frame
    ReadError { backend: BackendId, message: String },
}

/// Everything learned about one index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub index: u32,
    /// Outcomes of the backends that opened the device; empty when none did
    pub outcomes: Vec<ProbeOutcome>,
}

impl ProbeReport {
    /// Whether any backend delivered a frame
    pub fn is_usable(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o, ProbeOutcome::Ok { .. }))
    }

    /// Human-readable lines, one per outcome, or a single `NO:` line
    pub fn lines(&self) -> Vec<String> {
        if self.outcomes.is_empty() {
            return vec![format!("NO: index={}", self.index)];
        }

        self.outcomes
            .iter()
            .map(|outcome| match outcome {
                ProbeOutcome::Ok { backend, shape } => format!(
                    "OK: index={} backend={} frame_shape=({}, {}, {})",
                    self.index, backend, shape.1, shape.0, shape.2
                ),
                ProbeOutcome::ReadError { backend, message } => format!(
                    "ERR: index={} backend={} opened but read failed: {}",
                    self.index, backend, message
                ),
            })
            .collect()
    }
}

/// Probe indices `0..=max_index` with every backend
///
/// Each opened handle is released before moving on, so probing never leaves
/// a device held.
pub fn probe_devices(
    backends: &[Arc<dyn CaptureBackend>],
    max_index: u32,
    width: u32,
    height: u32,
) -> Vec<ProbeReport> {
    (0..=max_index)
        .map(|index| {
            let mut outcomes = Vec::new();
            for backend in backends {
                let mut handle = match backend.open(index, width, height) {
                    Ok(handle) => handle,
                    Err(e) => {
                        debug!(index, backend = %backend.id(), error = %e, "Probe open failed");
                        continue;
                    }
                };

                let outcome = match handle.read() {
                    Ok(frame) => ProbeOutcome::Ok {
                        backend: backend.id(),
                        shape: (frame.width(), frame.height(), frame.channels()),
                    },
                    Err(e) => ProbeOutcome::ReadError {
                        backend: backend.id(),
                        message: e.to_string(),
                    },
                };
                handle.release();
                outcomes.push(outcome);
            }
            ProbeReport { index, outcomes }
        })
        .collect()
}

/// Hints printed when no index produced a frame
pub fn troubleshooting_hints() -> &'static [&'static str] {
    &[
        "No working camera found. Check that:",
        "  - the camera is connected and not used by another application",
        "  - camera access is allowed for desktop applications in your OS privacy settings",
        "  - on Linux, your user can read /dev/video* (usually the 'video' group)",
        "  - the GStreamer good/bad plugins for your platform are installed",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{BackendError, BackendResult, CaptureHandle, Frame};

    struct OnlyIndex(u32, bool);

    struct StubHandle(bool);

    impl CaptureHandle for StubHandle {
        fn read(&mut self) -> BackendResult<Frame> {
            if self.0 {
                Ok(Frame::solid(4, 2, [0, 0, 0]))
            } else {
                Err(BackendError::ReadFailed("stub".into()))
            }
        }

        fn release(&mut self) {}
    }

    impl CaptureBackend for OnlyIndex {
        fn id(&self) -> BackendId {
            BackendId::Any
        }

        fn open(&self, index: u32, _: u32, _: u32) -> BackendResult<Box<dyn CaptureHandle>> {
            if index == self.0 {
                Ok(Box::new(StubHandle(self.1)))
            } else {
                Err(BackendError::OpenFailed("stub".into()))
            }
        }
    }

    #[test]
    fn test_probe_reports_each_index() {
        let backends: Vec<Arc<dyn CaptureBackend>> = vec![Arc::new(OnlyIndex(1, true))];
        let reports = probe_devices(&backends, 2, 4, 2);

        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].lines(), vec!["NO: index=0".to_string()]);
        assert!(reports[1].is_usable());
        assert_eq!(
            reports[1].lines(),
            vec!["OK: index=1 backend=ANY frame_shape=(2, 4, 3)".to_string()]
        );
        assert!(!reports[2].is_usable());
    }

    #[test]
    fn test_probe_read_failure_is_reported() {
        let backends: Vec<Arc<dyn CaptureBackend>> = vec![Arc::new(OnlyIndex(0, false))];
        let reports = probe_devices(&backends, 0, 4, 2);

        assert!(!reports[0].is_usable());
        assert!(reports[0].lines()[0].starts_with("ERR: index=0 backend=ANY"));
    }
}
