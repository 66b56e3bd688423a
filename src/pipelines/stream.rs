// SPDX-License-Identifier: MPL-2.0

//! Per-consumer streaming loop
//!
//! Each connected consumer gets its own [`StreamingPipeline`] running on its
//! own thread. All pipelines share one device, one set of toggles and one
//! recorder through the [`AppContext`].
//!
//! One iteration:
//!
//! ```text
//! snapshot toggles ──▶ paused? ──yes──▶ "STREAM PAUSED" placeholder
//!        │
//!        ▼
//! read device ──fail──▶ "CAMERA NOT AVAILABLE" placeholder
//!        │
//!        ▼
//! resize → [face crop + letterbox] → [grey] → [negative]
//!        │
//!        ├──▶ pending capture? ──▶ PNG still
//!        ├──▶ recording? ──▶ recorder slot
//!        ▼
//! [RECORDING... overlay] → mirror → JPEG → multipart part
//! ```

use crate::app::AppContext;
use crate::app::ToggleState;
use crate::backends::camera::frame_loop::{LoopAction, LoopController};
use crate::backends::camera::{DeviceManager, Frame};
use crate::config::Config;
use crate::errors::StillError;
use crate::constants::{self, placeholder as labels, stream, timing};
use crate::media::face::{FaceDetector, crop_to_face};
use crate::media::filters::{letterbox, mirror, negative, resize, to_grey};
use crate::media::mjpeg::frame_to_part;
use crate::media::text::{RED, overlay_text, placeholder};
use crate::pipelines::photo::save_still;
use crate::pipelines::video::RecordingSession;
use futures::Stream;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Streaming parameters
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSettings {
    /// Output `(width, height)`
    pub target_size: (u32, u32),
    /// Directory stills are written to
    pub shots_dir: PathBuf,
    /// Delay after a placeholder
    pub placeholder_interval: Duration,
    /// Delay after a live frame
    pub frame_interval: Duration,
    pub jpeg_quality: u8,
    /// Minimum confidence for face cropping
    pub face_min_confidence: f32,
}

impl StreamSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            target_size: config.frame_size(),
            shots_dir: config.shots_dir.clone(),
            placeholder_interval: timing::PLACEHOLDER_INTERVAL,
            frame_interval: timing::FRAME_INTERVAL,
            jpeg_quality: stream::JPEG_QUALITY,
            face_min_confidence: constants::FACE_MIN_CONFIDENCE,
        }
    }
}

/// Why a frame looks the way it does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Processed camera frame
    Live,
    /// Stream is switched off
    Paused,
    /// The device could not deliver a frame
    Unavailable,
}

/// The result of one loop iteration
#[derive(Debug, Clone)]
pub struct EmittedFrame {
    pub kind: FrameKind,
    /// Frame as shown to the consumer (mirrored, with overlays)
    pub frame: Frame,
    /// Outcome of the still capture this iteration performed, if any
    pub still: Option<Result<PathBuf, StillError>>,
}

/// Streaming loop for one consumer
pub struct StreamingPipeline {
    toggles: Arc<ToggleState>,
    device: Arc<DeviceManager>,
    recorder: Arc<RecordingSession>,
    face_detector: Arc<dyn FaceDetector>,
    settings: StreamSettings,
}

impl StreamingPipeline {
    pub fn new(ctx: &AppContext, settings: StreamSettings) -> Self {
        Self {
            toggles: Arc::clone(&ctx.toggles),
            device: Arc::clone(&ctx.device),
            recorder: Arc::clone(&ctx.recorder),
            face_detector: Arc::clone(&ctx.face_detector),
            settings,
        }
    }

    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    /// Run one iteration and return the display frame
    ///
    /// Never fails: device and transform problems turn into placeholders or
    /// fallbacks. A still capture outcome is logged and reported in
    /// [`EmittedFrame::still`].
    pub fn next_frame(&self) -> EmittedFrame {
        let (width, height) = self.settings.target_size;
        let snapshot = self.toggles.snapshot();

        if !snapshot.stream_on {
            return EmittedFrame {
                kind: FrameKind::Paused,
                frame: placeholder(width, height, labels::STREAM_PAUSED),
                still: None,
            };
        }

        let raw = match self.device.read() {
            Ok(frame) => frame,
            Err(e) => {
                debug!(error = %e, "No frame from device");
                return EmittedFrame {
                    kind: FrameKind::Unavailable,
                    frame: placeholder(width, height, labels::CAMERA_UNAVAILABLE),
                    still: None,
                };
            }
        };

        let mut frame = resize(&raw, width, height).unwrap_or_else(|e| {
            warn!(error = %e, "Resize failed");
            placeholder(width, height, labels::RESIZE_FAILED)
        });

        if snapshot.face_only_on {
            frame = self.face_view(&frame);
        }
        if snapshot.grey_on {
            frame = to_grey(&frame);
        }
        if snapshot.negative_on {
            frame = negative(&frame);
        }

        let still = self.toggles.consume_capture_request().then(|| {
            let result = save_still(&frame, &self.settings.shots_dir);
            if let Err(e) = &result {
                warn!(error = %e, "Still capture failed");
            }
            result
        });

        let recording = self.recorder.is_recording();
        if recording {
            self.recorder.update_frame(frame.clone());
        }

        let display = if recording {
            overlay_text(&frame, labels::RECORDING, RED)
        } else {
            frame
        };

        EmittedFrame {
            kind: FrameKind::Live,
            frame: mirror(&display),
            still,
        }
    }

    /// Face crop letterboxed to the target size, or the whole frame letterboxed
    fn face_view(&self, frame: &Frame) -> Frame {
        let (width, height) = self.settings.target_size;
        crop_to_face(
            self.face_detector.as_ref(),
            frame,
            self.settings.face_min_confidence,
        )
        .and_then(|face| letterbox(&face, width, height))
        .or_else(|e| {
            debug!(error = %e, "Face crop unavailable, letterboxing full frame");
            letterbox(frame, width, height)
        })
        .unwrap_or_else(|_| frame.clone())
    }

    /// Run one iteration and encode it as a multipart part
    ///
    /// The part is empty when JPEG encoding failed.
    pub fn next_part(&self) -> (FrameKind, Vec<u8>) {
        let emitted = self.next_frame();
        (
            emitted.kind,
            frame_to_part(&emitted.frame, self.settings.jpeg_quality),
        )
    }

    /// Delay before the next iteration
    pub fn delay_after(&self, kind: FrameKind) -> Duration {
        match kind {
            FrameKind::Live => self.settings.frame_interval,
            FrameKind::Paused | FrameKind::Unavailable => self.settings.placeholder_interval,
        }
    }

    /// Drive the loop on the current thread until `sink` breaks
    pub fn run<F>(&self, mut sink: F)
    where
        F: FnMut(Vec<u8>) -> ControlFlow<()>,
    {
        loop {
            let (kind, part) = self.next_part();
            if !part.is_empty() && sink(part).is_break() {
                break;
            }
            std::thread::sleep(self.delay_after(kind));
        }
    }

    /// Run the loop on its own thread, delivering parts over a channel
    ///
    /// The thread ends when the returned consumer is dropped.
    pub fn spawn_consumer(self) -> std::io::Result<MjpegConsumer> {
        let (tx, rx) = mpsc::channel::<Vec<u8>>(stream::CHANNEL_CAPACITY);

        let controller = LoopController::start("stream-consumer", move || {
            let (kind, part) = self.next_part();
            if !part.is_empty() && tx.blocking_send(part).is_err() {
                debug!("Consumer disconnected");
                return LoopAction::Stop;
            }
            std::thread::sleep(self.delay_after(kind));
            LoopAction::Continue
        })?;

        info!("Stream consumer started");
        Ok(MjpegConsumer {
            parts: rx,
            _controller: controller,
        })
    }
}

/// Receiving end of a consumer thread
///
/// Dropping it disconnects the channel first, which ends the loop, and then
/// joins the thread.
pub struct MjpegConsumer {
    // Declared first so the channel closes before the thread is joined
    parts: mpsc::Receiver<Vec<u8>>,
    _controller: LoopController,
}

impl MjpegConsumer {
    /// `Content-Type` of a response body made of these parts
    pub fn content_type() -> &'static str {
        stream::CONTENT_TYPE
    }

    /// Wait for the next part from async code
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.parts.recv().await
    }

    /// Wait for the next part from a plain thread
    ///
    /// Must not be called from inside an async runtime.
    pub fn blocking_recv(&mut self) -> Option<Vec<u8>> {
        self.parts.blocking_recv()
    }

    /// Adapt into a `Stream` of body chunks for async HTTP layers
    pub fn into_stream(self) -> impl Stream<Item = Vec<u8>> {
        let mut consumer = self;
        async_stream::stream! {
            while let Some(part) = consumer.recv().await {
                yield part;
            }
        }
    }
}
