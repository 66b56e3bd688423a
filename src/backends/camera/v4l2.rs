// SPDX-License-Identifier: GPL-3.0-only

//! Native V4L2 capture backend
//!
//! Opens `/dev/videoN` directly, negotiates MJPEG or YUYV at the requested
//! size and streams through memory-mapped buffers.

use super::format_converters::{mjpeg_to_frame, yuyv_to_rgb};
use super::types::{BackendError, BackendId, BackendResult, Frame};
use super::{CaptureBackend, CaptureHandle};
use tracing::{debug, info, warn};
use v4l::FourCC;
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

/// Number of kernel buffers requested for streaming
const BUFFER_COUNT: u32 = 4;

/// Pixel formats accepted from the driver, in preference order
const ACCEPTED_FORMATS: [&[u8; 4]; 2] = [b"MJPG", b"YUYV"];

/// V4L2 capture backend
#[derive(Debug, Default, Clone, Copy)]
pub struct V4l2Backend;

impl CaptureBackend for V4l2Backend {
    fn id(&self) -> BackendId {
        BackendId::V4l2
    }

    fn open(&self, index: u32, width: u32, height: u32) -> BackendResult<Box<dyn CaptureHandle>> {
        let dev = Device::new(index as usize)
            .map_err(|e| BackendError::OpenFailed(format!("/dev/video{}: {}", index, e)))?;

        let caps = dev
            .query_caps()
            .map_err(|e| BackendError::OpenFailed(format!("Failed to query caps: {}", e)))?;
        if !caps
            .capabilities
            .contains(v4l::capability::Flags::VIDEO_CAPTURE)
        {
            return Err(BackendError::OpenFailed(format!(
                "/dev/video{} is not a capture device",
                index
            )));
        }

        let fourcc = negotiate_format(&dev, width, height)?;

        let stream = MmapStream::with_buffers(&dev, Type::VideoCapture, BUFFER_COUNT)
            .map_err(|e| BackendError::OpenFailed(format!("Failed to create stream: {}", e)))?;

        info!(
            index,
            card = %caps.card,
            fourcc = %fourcc,
            width,
            height,
            "V4L2 device opened"
        );

        Ok(Box::new(V4l2Handle {
            stream: Some(stream),
            device: Some(dev),
            fourcc,
            width,
            height,
        }))
    }
}

/// Ask the driver for each accepted format at `width` x `height`
///
/// The device must accept the exact size; drivers silently substitute the
/// nearest size they support, which counts as a rejection here.
fn negotiate_format(dev: &Device, width: u32, height: u32) -> BackendResult<FourCC> {
    let mut fmt = dev
        .format()
        .map_err(|e| BackendError::OpenFailed(format!("Failed to get format: {}", e)))?;

    for code in ACCEPTED_FORMATS {
        fmt.width = width;
        fmt.height = height;
        fmt.fourcc = FourCC::new(code);

        match dev.set_format(&fmt) {
            Ok(actual)
                if actual.fourcc == fmt.fourcc
                    && actual.width == width
                    && actual.height == height =>
            {
                return Ok(actual.fourcc);
            }
            Ok(actual) => {
                debug!(
                    requested = %fmt.fourcc,
                    got = %actual.fourcc,
                    width = actual.width,
                    height = actual.height,
                    "Driver substituted format"
                );
            }
            Err(e) => {
                debug!(fourcc = %fmt.fourcc, error = %e, "Format not accepted");
            }
        }
    }

    Err(BackendError::FormatRejected(format!(
        "{}x{} not available as MJPG or YUYV",
        width, height
    )))
}

/// Open V4L2 capture stream
struct V4l2Handle {
    // Declared before the device so it is dropped first
    stream: Option<MmapStream<'static>>,
    device: Option<Device>,
    fourcc: FourCC,
    width: u32,
    height: u32,
}

impl CaptureHandle for V4l2Handle {
    fn read(&mut self) -> BackendResult<Frame> {
        let stream = self.stream.as_mut().ok_or(BackendError::Disconnected)?;

        let (buf, meta) = stream
            .next()
            .map_err(|e| BackendError::ReadFailed(format!("Dequeue failed: {}", e)))?;

        let used = (meta.bytesused as usize).min(buf.len());
        let data = if used > 0 { &buf[..used] } else { buf };

        if self.fourcc == FourCC::new(b"MJPG") {
            mjpeg_to_frame(data)
        } else {
            let rgb = yuyv_to_rgb(data, self.width, self.height);
            Frame::from_rgb(self.width, self.height, rgb)
                .ok_or_else(|| BackendError::ReadFailed("YUYV buffer size mismatch".into()))
        }
    }

    fn release(&mut self) {
        if self.stream.take().is_some() {
            debug!("V4L2 stream stopped");
        }
        if self.device.take().is_some() {
            info!("V4L2 device released");
        }
    }
}

impl Drop for V4l2Handle {
    fn drop(&mut self) {
        if self.device.is_some() {
            warn!("V4L2 handle dropped without release, closing device");
        }
        self.release();
    }
}
