// SPDX-License-Identifier: GPL-3.0-only
// Shared types for capture backend abstraction

//! Shared types for capture backends

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// A single RGB8 video frame
///
/// Pixel data is shared behind an `Arc`, so cloning a frame never copies
/// pixels and never hands out a mutable alias. Every transform produces a
/// new frame instead of mutating an existing one.
#[derive(Clone)]
pub struct Frame {
    image: Arc<RgbImage>,
    /// When the frame was produced by its source
    pub captured_at: Instant,
}

impl Frame {
    /// Wrap a freshly produced image
    pub fn new(image: RgbImage) -> Self {
        Self {
            image: Arc::new(image),
            captured_at: Instant::now(),
        }
    }

    /// Build a frame from tightly packed RGB bytes
    ///
    /// Returns `None` when `data` does not hold exactly `width * height * 3` bytes.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        RgbImage::from_raw(width, height, data).map(Self::new)
    }

    /// Frame filled with a single color
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self::new(RgbImage::from_pixel(width, height, image::Rgb(rgb)))
    }

    /// Derive a new frame from this one, keeping the capture instant
    pub fn with_image(&self, image: RgbImage) -> Self {
        Self {
            image: Arc::new(image),
            captured_at: self.captured_at,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Channel count; frames are always RGB
    pub fn channels(&self) -> u8 {
        3
    }

    /// `(width, height)` pair
    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Borrow the underlying image
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Raw packed RGB bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.image, &other.image) || *self.image == *other.image
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Capture backend identifier
///
/// The order of candidates tried for each device index comes from
/// [`super::platform_backends`]; `Any` is always last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendId {
    /// Native Video4Linux2 capture
    V4l2,
    /// DirectShow (Windows)
    DirectShow,
    /// Media Foundation (Windows)
    MediaFoundation,
    /// AVFoundation (macOS)
    AvFoundation,
    /// Whatever the generic source picks
    Any,
}

impl std::fmt::Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendId::V4l2 => write!(f, "V4L2"),
            BackendId::DirectShow => write!(f, "DSHOW"),
            BackendId::MediaFoundation => write!(f, "MSMF"),
            BackendId::AvFoundation => write!(f, "AVFOUNDATION"),
            BackendId::Any => write!(f, "ANY"),
        }
    }
}

/// Immutable device parameters set at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Index tried first when opening
    pub preferred_index: u32,
    /// Requested frame width
    pub width: u32,
    /// Requested frame height
    pub height: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        use crate::constants::device;
        Self {
            preferred_index: device::DEFAULT_INDEX,
            width: device::DEFAULT_WIDTH,
            height: device::DEFAULT_HEIGHT,
        }
    }
}

impl DeviceConfig {
    /// Target `(width, height)`
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Errors from capture backends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// No device is open and none could be opened
    NotAvailable(String),
    /// The backend could not open the device at this index
    OpenFailed(String),
    /// The device opened but refused the requested size or format
    FormatRejected(String),
    /// The device is open but did not deliver a frame
    ReadFailed(String),
    /// The device went away while in use
    Disconnected,
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Device not available: {}", msg),
            BackendError::OpenFailed(msg) => write!(f, "Open failed: {}", msg),
            BackendError::FormatRejected(msg) => write!(f, "Format rejected: {}", msg),
            BackendError::ReadFailed(msg) => write!(f, "Read failed: {}", msg),
            BackendError::Disconnected => write!(f, "Device disconnected"),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;
