// SPDX-License-Identifier: MPL-2.0

//! Video recording
//!
//! - [`recorder`]: background session sampling the latest frame at a fixed rate
//! - [`sink`]: file writers the session appends to

pub mod recorder;
pub mod sink;

// Re-export commonly used types
pub use recorder::{RecordingSession, RecordingSettings};
pub use sink::{AviSinkFactory, EncodeSink, SinkFactory};
