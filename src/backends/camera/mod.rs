// SPDX-License-Identifier: MPL-2.0

//! Capture backend abstraction
//!
//! A device index is opened through one of several capture backends. Each
//! backend knows how to turn an index into an open [`CaptureHandle`]; the
//! [`DeviceManager`] tries them in platform priority order and keeps the
//! first handle that works.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  Streaming / Control │
//! └──────────┬───────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │    DeviceManager     │  ← open / retry backoff / release
//! └──────────┬───────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │ CaptureBackend Trait │  ← index → handle
//! └──────────┬───────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//!   ┌──────┐  ┌──────────┐
//!   │ V4L2 │  │GStreamer │
//!   └──────┘  └──────────┘
//! ```

pub mod enumeration;
pub mod format_converters;
pub mod frame_loop;
pub mod gst_source;
pub mod manager;
pub mod types;
#[cfg(target_os = "linux")]
pub mod v4l2;

pub use manager::{DeviceManager, ProbeSettings};
pub use types::*;

use std::sync::Arc;

/// A way of opening capture devices by index
///
/// Implementations must release anything they partially opened before
/// returning an error from [`CaptureBackend::open`].
pub trait CaptureBackend: Send + Sync {
    /// Which backend this is
    fn id(&self) -> BackendId;

    /// Open the device at `index` and configure it for `width` x `height`
    ///
    /// # Returns
    /// * `Ok(handle)` - Device opened and accepted the requested size
    /// * `Err(BackendError)` - Device missing, busy, or format rejected
    fn open(&self, index: u32, width: u32, height: u32) -> BackendResult<Box<dyn CaptureHandle>>;
}

/// An opened capture device
///
/// Handles release their native resources on drop as well as on
/// [`CaptureHandle::release`]; releasing twice is harmless.
pub trait CaptureHandle: Send {
    /// Block until the next frame is available
    fn read(&mut self) -> BackendResult<Frame>;

    /// Close the device
    fn release(&mut self);
}

/// Backend candidates for the current platform, highest priority first
///
/// The generic `Any` backend always comes last and duplicates are dropped.
pub fn platform_backends() -> Vec<Arc<dyn CaptureBackend>> {
    let mut backends: Vec<Arc<dyn CaptureBackend>> = Vec::new();

    #[cfg(target_os = "linux")]
    backends.push(Arc::new(v4l2::V4l2Backend));

    #[cfg(target_os = "windows")]
    {
        backends.push(Arc::new(gst_source::GstBackend::new(BackendId::DirectShow)));
        backends.push(Arc::new(gst_source::GstBackend::new(
            BackendId::MediaFoundation,
        )));
    }

    #[cfg(target_os = "macos")]
    backends.push(Arc::new(gst_source::GstBackend::new(BackendId::AvFoundation)));

    backends.push(Arc::new(gst_source::GstBackend::new(BackendId::Any)));

    dedup_backends(backends)
}

/// Drop later candidates whose id was already seen
pub fn dedup_backends(backends: Vec<Arc<dyn CaptureBackend>>) -> Vec<Arc<dyn CaptureBackend>> {
    let mut seen = Vec::new();
    backends
        .into_iter()
        .filter(|b| {
            let id = b.id();
            if seen.contains(&id) {
                false
            } else {
                seen.push(id);
                true
            }
        })
        .collect()
}
