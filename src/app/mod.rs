// SPDX-License-Identifier: MPL-2.0

//! Application context and control surface
//!
//! [`AppContext`] bundles everything the streaming loops and control
//! requests share: the toggles, the capture device, the recorder, the face
//! detector and the configuration. It is built once and handed around as an
//! `Arc`, so every consumer sees the same device and recorder.
//!
//! # Architecture
//!
//! - `state`: Thread-safe user toggles
//! - `actions`: Control actions and the status view
//!
//! # Main Types
//!
//! - `AppContext`: Shared application state
//! - `ControlAction`: Every user-triggered state change
//! - `StatusView`: Serialisable snapshot for status pages

mod actions;
mod state;

pub use actions::{ActionOutcome, ControlAction, StatusView};
pub use state::{ToggleSnapshot, ToggleState};

use crate::backends::camera::DeviceManager;
use crate::config::Config;
use crate::media::face::{DisabledFaceDetector, FaceDetector};
use crate::pipelines::stream::{StreamSettings, StreamingPipeline};
use crate::pipelines::video::RecordingSession;
use std::sync::Arc;
use tracing::info;

/// Shared application state
pub struct AppContext {
    pub config: Config,
    pub toggles: Arc<ToggleState>,
    pub device: Arc<DeviceManager>,
    pub recorder: Arc<RecordingSession>,
    pub face_detector: Arc<dyn FaceDetector>,
}

impl AppContext {
    /// Build the context with the platform capture backends and the AVI recorder
    pub fn new(config: Config) -> Self {
        let device = DeviceManager::new(config.device_config(), config.probe_settings());
        let recorder = RecordingSession::new(config.recording_settings());
        Self::with_parts(config, device, recorder, Arc::new(DisabledFaceDetector))
    }

    /// Build the context from explicit components
    pub fn with_parts(
        config: Config,
        device: DeviceManager,
        recorder: RecordingSession,
        face_detector: Arc<dyn FaceDetector>,
    ) -> Self {
        info!(
            index = config.camera_index,
            width = config.width,
            height = config.height,
            "Application context created"
        );

        Self {
            config,
            toggles: Arc::new(ToggleState::new()),
            device: Arc::new(device),
            recorder: Arc::new(recorder),
            face_detector,
        }
    }

    /// A streaming pipeline for one consumer, using the configured settings
    pub fn streaming_pipeline(&self) -> StreamingPipeline {
        StreamingPipeline::new(self, StreamSettings::from_config(&self.config))
    }

    /// Stop recording and release the device
    pub fn shutdown(&self) {
        self.recorder.stop();
        self.device.release();
        info!("Application context shut down");
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("toggles", &self.toggles.snapshot())
            .field("device", &self.device)
            .field("recorder", &self.recorder)
            .finish()
    }
}
