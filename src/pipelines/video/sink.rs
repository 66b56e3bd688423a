// SPDX-License-Identifier: MPL-2.0

//! Video file sinks for the recorder
//!
//! The recorder only needs "open a file at this size and rate, append frames,
//! finalise". [`SinkFactory`] and [`EncodeSink`] capture exactly that, so the
//! recorder can be driven by the GStreamer writer in production and by
//! in-memory stubs in tests.
//!
//! The default writer produces Motion-JPEG in an AVI container:
//!
//! ```text
//! appsrc (RGB) → videoconvert → jpegenc → avimux → filesink
//! ```

use crate::backends::camera::Frame;
use crate::errors::{RecordingError, RecordingResult};
use crate::media::filters::resize;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app::AppSrc;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// How long finalisation waits for the muxer to flush
const EOS_TIMEOUT_MS: u64 = 1000;

/// An open video file accepting frames
pub trait EncodeSink: Send {
    /// Append one frame
    fn write(&mut self, frame: &Frame) -> RecordingResult<()>;

    /// Flush and close the file; further writes are errors
    fn finish(&mut self);
}

/// Opens [`EncodeSink`]s
pub trait SinkFactory: Send + Sync {
    /// Open a sink writing to `path`
    ///
    /// # Arguments
    /// * `path` - Output file, parent directory already exists
    /// * `fps` - Nominal frame rate written to the container
    /// * `frame_size` - `(width, height)` of every frame in the file
    fn open(
        &self,
        path: &Path,
        fps: f64,
        frame_size: (u32, u32),
    ) -> RecordingResult<Box<dyn EncodeSink>>;
}

/// Factory for the GStreamer Motion-JPEG/AVI writer
#[derive(Debug, Default, Clone, Copy)]
pub struct AviSinkFactory;

impl SinkFactory for AviSinkFactory {
    fn open(
        &self,
        path: &Path,
        fps: f64,
        frame_size: (u32, u32),
    ) -> RecordingResult<Box<dyn EncodeSink>> {
        let sink = AviSink::new(path, fps, frame_size).map_err(|reason| {
            RecordingError::SinkOpenFailed {
                path: path.to_path_buf(),
                reason,
            }
        })?;
        Ok(Box::new(sink))
    }
}

/// Nominal rate as a GStreamer fraction with millihertz precision
fn fps_fraction(fps: f64) -> gst::Fraction {
    if fps.is_finite() && fps > 0.0 {
        gst::Fraction::new((fps * 1000.0).round() as i32, 1000)
    } else {
        gst::Fraction::new(crate::constants::recording::DEFAULT_FPS as i32, 1)
    }
}

/// GStreamer AVI writer
struct AviSink {
    pipeline: Option<gst::Pipeline>,
    appsrc: AppSrc,
    width: u32,
    height: u32,
    frame_duration: gst::ClockTime,
    frames_pushed: u64,
}

impl AviSink {
    fn new(path: &Path, fps: f64, (width, height): (u32, u32)) -> Result<Self, String> {
        if width == 0 || height == 0 {
            return Err(format!("invalid frame size {}x{}", width, height));
        }
        let location = path
            .to_str()
            .ok_or_else(|| format!("non UTF-8 path {}", path.display()))?;

        gst::init().map_err(|e| format!("GStreamer init failed: {}", e))?;

        let pipeline = gst::Pipeline::new();
        let make = |factory: &str| {
            gst::ElementFactory::make(factory)
                .build()
                .map_err(|e| format!("Failed to create {}: {}", factory, e))
        };

        let appsrc = make("appsrc")?
            .downcast::<AppSrc>()
            .map_err(|_| "Failed to downcast to AppSrc".to_string())?;
        let convert = make("videoconvert")?;
        let encoder = make("jpegenc")?;
        let muxer = make("avimux")?;
        let filesink = make("filesink")?;
        filesink.set_property("location", location);

        let rate = fps_fraction(fps);
        let caps = gst::Caps::builder("video/x-raw")
            .field("format", "RGB")
            .field("width", width as i32)
            .field("height", height as i32)
            .field("framerate", rate)
            .build();
        appsrc.set_caps(Some(&caps));
        appsrc.set_format(gst::Format::Time);
        appsrc.set_is_live(false);
        appsrc.set_do_timestamp(false);

        pipeline
            .add_many([appsrc.upcast_ref(), &convert, &encoder, &muxer, &filesink])
            .map_err(|e| format!("Failed to add elements: {}", e))?;
        gst::Element::link_many([appsrc.upcast_ref(), &convert, &encoder, &muxer, &filesink])
            .map_err(|e| format!("Failed to link elements: {}", e))?;

        if let Err(e) = pipeline.set_state(gst::State::Playing) {
            let _ = pipeline.set_state(gst::State::Null);
            return Err(format!("Failed to start pipeline: {}", e));
        }

        let frame_duration = gst::ClockTime::from_nseconds(
            (1_000_000_000u64 * rate.denom() as u64) / rate.numer().max(1) as u64,
        );

        info!(path = %path.display(), width, height, fps, "AVI writer opened");

        Ok(Self {
            pipeline: Some(pipeline),
            appsrc,
            width,
            height,
            frame_duration,
            frames_pushed: 0,
        })
    }
}

impl EncodeSink for AviSink {
    fn write(&mut self, frame: &Frame) -> RecordingResult<()> {
        if self.pipeline.is_none() {
            return Err(RecordingError::EncodeFailed("writer already finished".into()));
        }

        let resized;
        let frame = if frame.size() == (self.width, self.height) {
            frame
        } else {
            resized = resize(frame, self.width, self.height)
                .map_err(|e| RecordingError::EncodeFailed(e.to_string()))?;
            &resized
        };

        let data = frame.as_bytes();
        let mut buffer = gst::Buffer::with_size(data.len())
            .map_err(|e| RecordingError::EncodeFailed(format!("Failed to create buffer: {}", e)))?;
        {
            let buffer_ref = buffer.get_mut().ok_or_else(|| {
                RecordingError::EncodeFailed("Failed to get mutable buffer reference".into())
            })?;
            buffer_ref.set_pts(gst::ClockTime::from_nseconds(
                self.frame_duration.nseconds() * self.frames_pushed,
            ));
            buffer_ref.set_duration(self.frame_duration);
            let mut map = buffer_ref
                .map_writable()
                .map_err(|e| RecordingError::EncodeFailed(format!("Failed to map buffer: {}", e)))?;
            map.copy_from_slice(data);
        }

        self.appsrc
            .push_buffer(buffer)
            .map_err(|e| RecordingError::EncodeFailed(format!("Failed to push frame: {:?}", e)))?;
        self.frames_pushed += 1;
        Ok(())
    }

    fn finish(&mut self) {
        let Some(pipeline) = self.pipeline.take() else {
            return;
        };

        if let Err(e) = self.appsrc.end_of_stream() {
            warn!(?e, "Failed to send EOS to recorder");
        } else if let Some(bus) = pipeline.bus() {
            // Wait for the muxer to write its index before tearing down
            match bus.timed_pop_filtered(
                gst::ClockTime::from_mseconds(EOS_TIMEOUT_MS),
                &[gst::MessageType::Eos, gst::MessageType::Error],
            ) {
                Some(msg) => {
                    if let gst::MessageView::Error(err) = msg.view() {
                        error!(error = %err.error(), "Recorder pipeline error during finalise");
                    }
                }
                None => warn!("Timed out waiting for recorder EOS"),
            }
        }

        if let Err(e) = pipeline.set_state(gst::State::Null) {
            error!(?e, "Failed to set recorder pipeline to Null");
        }
        debug!(frames = self.frames_pushed, "AVI writer finished");
    }
}

impl Drop for AviSink {
    fn drop(&mut self) {
        self.finish();
    }
}
