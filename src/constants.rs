// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Device defaults applied when neither the environment nor the CLI set a value
pub mod device {
    /// Preferred capture index
    pub const DEFAULT_INDEX: u32 = 0;
    /// Requested frame width
    pub const DEFAULT_WIDTH: u32 = 640;
    /// Requested frame height
    pub const DEFAULT_HEIGHT: u32 = 480;
    /// Highest index scanned during auto-detection (inclusive)
    pub const DEFAULT_MAX_INDEX: u32 = 5;
    /// Largest accepted value for the auto-detection range
    pub const MAX_SCAN_INDEX: u32 = 63;
}

/// Minimum delay between two failed open attempts
pub const OPEN_RETRY_INTERVAL: Duration = Duration::from_millis(1000);

/// Lower bound for the configurable open retry interval
pub const MIN_OPEN_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Streaming loop timings
pub mod timing {
    use std::time::Duration;

    /// Delay after emitting a placeholder (paused / unavailable)
    pub const PLACEHOLDER_INTERVAL: Duration = Duration::from_millis(100);
    /// Delay after emitting a live frame
    pub const FRAME_INTERVAL: Duration = Duration::from_millis(10);
}

/// Recording defaults
pub mod recording {
    use std::time::Duration;

    /// Target encode rate of the recorder worker
    pub const DEFAULT_FPS: f64 = 20.0;
    /// Worker tick used when the configured rate is not positive
    pub const FALLBACK_INTERVAL: Duration = Duration::from_millis(50);
    /// Upper bound on how long `stop` waits for the worker
    pub const STOP_TIMEOUT: Duration = Duration::from_secs(2);
    /// Container extension of recorded files
    pub const FILE_EXTENSION: &str = "avi";
    /// File name prefix of recorded files
    pub const FILE_PREFIX: &str = "vid";
}

/// Still capture defaults
pub mod still {
    /// Directory stills are written to
    pub const DEFAULT_DIR: &str = "shots";
    /// File name prefix of stills
    pub const FILE_PREFIX: &str = "shot";
}

/// Multipart stream framing
pub mod stream {
    /// Boundary token separating JPEG parts
    pub const BOUNDARY: &str = "frame";
    /// Content type announced for the whole response body
    pub const CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";
    /// JPEG quality used for streamed frames
    pub const JPEG_QUALITY: u8 = 80;
    /// Parts buffered between a consumer thread and its reader
    pub const CHANNEL_CAPACITY: usize = 2;
}

/// Text shown on placeholder frames
pub mod placeholder {
    pub const STREAM_PAUSED: &str = "STREAM PAUSED";
    pub const CAMERA_UNAVAILABLE: &str = "CAMERA NOT AVAILABLE";
    pub const RESIZE_FAILED: &str = "RESIZE FAILED";
    /// Overlay drawn on the display copy while recording
    pub const RECORDING: &str = "RECORDING...";
}

/// Minimum confidence for a face detection to be used for cropping
pub const FACE_MIN_CONFIDENCE: f32 = 0.5;
