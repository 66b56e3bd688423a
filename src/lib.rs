// SPDX-License-Identifier: MPL-2.0

//! Camera Relay - share one webcam between live viewers, stills and recording
//!
//! This library owns a single capture device and fans its frames out to any
//! number of MJPEG streaming consumers, while a background session can
//! record the same processed frames to disk.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Shared context, user toggles and control actions
//! - [`backends`]: Capture device lifecycle and platform backends
//! - [`media`]: Frame transforms, face cropping, text and JPEG framing
//! - [`pipelines`]: Streaming loop, still capture and recording
//! - [`config`]: Environment-driven configuration
//! - [`storage`]: Timestamped artifact naming
//!
//! # Example
//!
//! ```ignore
//! let ctx = AppContext::new(Config::from_env()?);
//! let consumer = ctx.streaming_pipeline().spawn_consumer()?;
//! // forward consumer.into_stream() as a multipart/x-mixed-replace body
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod media;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use app::{ActionOutcome, AppContext, ControlAction, StatusView, ToggleState};
pub use backends::camera::{BackendId, DeviceConfig, DeviceManager, Frame, ProbeSettings};
pub use config::Config;
pub use errors::{AppError, AppResult, RecordingError};
pub use pipelines::stream::{EmittedFrame, FrameKind, StreamSettings, StreamingPipeline};
pub use pipelines::video::{RecordingSession, RecordingSettings};
