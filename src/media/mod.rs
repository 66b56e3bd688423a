// SPDX-License-Identifier: MPL-2.0

//! Frame processing utilities
//!
//! Everything here is pure CPU work over RGB [`Frame`](crate::backends::camera::Frame)s:
//!
//! - [`filters`]: greyscale, negative, mirror, resize, letterbox, crop
//! - [`face`]: face-only cropping behind a pluggable detector
//! - [`text`]: bitmap labels for placeholders and overlays
//! - [`mjpeg`]: JPEG encoding and multipart stream framing

pub mod face;
pub mod filters;
pub mod mjpeg;
pub mod text;

pub use face::{DisabledFaceDetector, FaceDetection, FaceDetector, crop_to_face};
pub use filters::{letterbox, mirror, negative, resize, to_grey};
pub use text::{overlay_text, placeholder};
