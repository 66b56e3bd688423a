// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer capture backend
//!
//! Builds a pipeline that pulls raw frames from a platform camera source and
//! scales them to the requested size:
//!
//! ```text
//! <source> ! videoconvert ! videoscale ! video/x-raw,format=RGB ! appsink
//! ```
//!
//! The source element depends on the backend id: `ksvideosrc` for
//! DirectShow, `mfvideosrc` for Media Foundation, `avfvideosrc` for
//! AVFoundation, and `v4l2src` / `autovideosrc` for the generic backend.

use super::format_converters::pack_rgb_rows;
use super::types::{BackendError, BackendId, BackendResult, Frame};
use super::{CaptureBackend, CaptureHandle};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use tracing::{debug, error, info};

/// How long to wait for the pipeline to reach Playing
const START_TIMEOUT_SECS: u64 = 5;

/// How long a single read waits for a sample
const PULL_TIMEOUT_SECS: u64 = 2;

/// GStreamer-based capture backend
#[derive(Debug, Clone, Copy)]
pub struct GstBackend {
    id: BackendId,
}

impl GstBackend {
    pub fn new(id: BackendId) -> Self {
        Self { id }
    }

    /// Source element description for `index`, or `None` if this backend
    /// cannot address that index
    fn source_description(&self, index: u32) -> Option<String> {
        match self.id {
            BackendId::DirectShow => Some(format!("ksvideosrc device-index={}", index)),
            BackendId::MediaFoundation => Some(format!("mfvideosrc device-index={}", index)),
            BackendId::AvFoundation => Some(format!("avfvideosrc device-index={}", index)),
            BackendId::Any if cfg!(target_os = "linux") => {
                Some(format!("v4l2src device=/dev/video{}", index))
            }
            // autovideosrc has no device selector, so it only stands in for index 0
            BackendId::Any => (index == 0).then(|| "autovideosrc".to_string()),
            BackendId::V4l2 => None,
        }
    }
}

/// Full pipeline description for a source at the requested size
pub fn pipeline_description(source: &str, width: u32, height: u32) -> String {
    format!(
        "{} ! videoconvert ! videoscale ! video/x-raw,format=RGB,width={},height={} ! \
         appsink name=sink max-buffers=1 drop=true sync=false",
        source, width, height
    )
}

impl CaptureBackend for GstBackend {
    fn id(&self) -> BackendId {
        self.id
    }

    fn open(&self, index: u32, width: u32, height: u32) -> BackendResult<Box<dyn CaptureHandle>> {
        let source = self.source_description(index).ok_or_else(|| {
            BackendError::OpenFailed(format!("{} cannot open index {}", self.id, index))
        })?;

        gstreamer::init()
            .map_err(|e| BackendError::OpenFailed(format!("GStreamer init failed: {}", e)))?;

        let pipeline_str = pipeline_description(&source, width, height);
        debug!(pipeline = %pipeline_str, "Creating capture pipeline");

        let pipeline = gstreamer::parse::launch(&pipeline_str)
            .map_err(|e| BackendError::OpenFailed(format!("Failed to create pipeline: {}", e)))?
            .downcast::<gstreamer::Pipeline>()
            .map_err(|_| BackendError::Other("Failed to downcast to Pipeline".into()))?;

        let appsink = match pipeline
            .by_name("sink")
            .ok_or_else(|| BackendError::Other("No appsink in pipeline".into()))
            .and_then(|sink| {
                sink.downcast::<AppSink>()
                    .map_err(|_| BackendError::Other("Failed to downcast to AppSink".into()))
            }) {
            Ok(sink) => sink,
            Err(e) => {
                let _ = pipeline.set_state(gstreamer::State::Null);
                return Err(e);
            }
        };

        if let Err(e) = pipeline.set_state(gstreamer::State::Playing) {
            let _ = pipeline.set_state(gstreamer::State::Null);
            return Err(BackendError::OpenFailed(format!(
                "Failed to start pipeline: {}",
                e
            )));
        }

        let (result, _state, _pending) = pipeline.state(gstreamer::ClockTime::from_seconds(
            START_TIMEOUT_SECS,
        ));
        if result.is_err() {
            let _ = pipeline.set_state(gstreamer::State::Null);
            return Err(BackendError::OpenFailed(
                "Pipeline failed to reach Playing state".into(),
            ));
        }

        info!(backend = %self.id, index, width, height, "GStreamer capture opened");

        Ok(Box::new(GstHandle {
            pipeline: Some(pipeline),
            appsink,
        }))
    }
}

/// Running capture pipeline
struct GstHandle {
    pipeline: Option<gstreamer::Pipeline>,
    appsink: AppSink,
}

impl CaptureHandle for GstHandle {
    fn read(&mut self) -> BackendResult<Frame> {
        if self.pipeline.is_none() {
            return Err(BackendError::Disconnected);
        }

        let sample = self
            .appsink
            .try_pull_sample(gstreamer::ClockTime::from_seconds(PULL_TIMEOUT_SECS))
            .ok_or_else(|| BackendError::ReadFailed("No sample within timeout".into()))?;

        extract_frame_from_sample(&sample)
    }

    fn release(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            if let Err(e) = pipeline.set_state(gstreamer::State::Null) {
                error!(?e, "Failed to set capture pipeline to Null");
            } else {
                info!("GStreamer capture released");
            }
        }
    }
}

impl Drop for GstHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Copy an RGB sample out of GStreamer into a frame
fn extract_frame_from_sample(sample: &gstreamer::Sample) -> BackendResult<Frame> {
    let caps = sample
        .caps()
        .ok_or_else(|| BackendError::ReadFailed("No caps on sample".into()))?;
    let info = gstreamer_video::VideoInfo::from_caps(caps)
        .map_err(|_| BackendError::ReadFailed("Unparseable video caps".into()))?;

    let buffer = sample
        .buffer()
        .ok_or_else(|| BackendError::ReadFailed("No buffer in sample".into()))?;
    let map = buffer
        .map_readable()
        .map_err(|_| BackendError::ReadFailed("Failed to map buffer".into()))?;

    let stride = info.stride().first().copied().unwrap_or(0).max(0) as usize;
    let data = pack_rgb_rows(map.as_slice(), info.width(), info.height(), stride)
        .ok_or_else(|| BackendError::ReadFailed("Sample shorter than caps".into()))?;

    Frame::from_rgb(info.width(), info.height(), data)
        .ok_or_else(|| BackendError::ReadFailed("Sample size mismatch".into()))
}
