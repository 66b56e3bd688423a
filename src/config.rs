// SPDX-License-Identifier: GPL-3.0-only

//! Runtime configuration
//!
//! Values come from `CAMERA_*` environment variables, falling back to the
//! defaults in [`crate::constants`]. Command-line flags are applied on top by
//! the binary.

use crate::backends::camera::{DeviceConfig, ProbeSettings};
use crate::constants::{self, device, recording, still};
use crate::errors::{AppError, AppResult};
use crate::pipelines::video::RecordingSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable names
pub mod env {
    pub const INDEX: &str = "CAMERA_INDEX";
    pub const WIDTH: &str = "CAMERA_WIDTH";
    pub const HEIGHT: &str = "CAMERA_HEIGHT";
    pub const AUTO_DETECT: &str = "CAMERA_AUTO_DETECT";
    pub const MAX_INDEX: &str = "CAMERA_MAX_INDEX";
    pub const OUTPUT_DIR: &str = "CAMERA_OUTPUT_DIR";
    pub const SHOTS_DIR: &str = "CAMERA_SHOTS_DIR";
    pub const RECORD_FPS: &str = "CAMERA_RECORD_FPS";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capture index tried first
    pub camera_index: u32,
    /// Target frame width for streaming and recording
    pub width: u32,
    /// Target frame height for streaming and recording
    pub height: u32,
    /// Scan other indices when the preferred one fails
    pub auto_detect: bool,
    /// Highest index scanned during auto-detection
    pub max_index: u32,
    /// Directory recordings are written to
    pub output_dir: PathBuf,
    /// Directory stills are written to
    pub shots_dir: PathBuf,
    /// Recording sample rate
    pub record_fps: f64,
    /// Delay after a failed open before retrying, in milliseconds
    pub open_retry_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_index: device::DEFAULT_INDEX,
            width: device::DEFAULT_WIDTH,
            height: device::DEFAULT_HEIGHT,
            auto_detect: true,
            max_index: device::DEFAULT_MAX_INDEX,
            output_dir: PathBuf::from("."),
            shots_dir: PathBuf::from(still::DEFAULT_DIR),
            record_fps: recording::DEFAULT_FPS,
            open_retry_ms: constants::OPEN_RETRY_INTERVAL.as_millis() as u64,
        }
    }
}

/// `false` for "0", "false", "no", "off" (any case), `true` otherwise
pub fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> AppResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{} must be a number, got {:?}", name, value)))
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    ///
    /// Unset variables keep their defaults; set but unparseable numbers are
    /// errors. A negative `CAMERA_MAX_INDEX` is treated as 0.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup(env::INDEX) {
            config.camera_index = parse_number(env::INDEX, &v)?;
        }
        if let Some(v) = lookup(env::WIDTH) {
            config.width = parse_number(env::WIDTH, &v)?;
        }
        if let Some(v) = lookup(env::HEIGHT) {
            config.height = parse_number(env::HEIGHT, &v)?;
        }
        if let Some(v) = lookup(env::AUTO_DETECT) {
            config.auto_detect = parse_flag(&v);
        }
        if let Some(v) = lookup(env::MAX_INDEX) {
            let max: i64 = parse_number(env::MAX_INDEX, &v)?;
            config.max_index = max.clamp(0, u32::MAX as i64) as u32;
        }
        if let Some(v) = lookup(env::OUTPUT_DIR) {
            config.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup(env::SHOTS_DIR) {
            config.shots_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup(env::RECORD_FPS) {
            config.record_fps = parse_number(env::RECORD_FPS, &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject sizes the pipeline cannot produce and oversized scan ranges
    pub fn validate(&self) -> AppResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(AppError::Config(format!(
                "frame size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.max_index > device::MAX_SCAN_INDEX {
            return Err(AppError::Config(format!(
                "{} must be at most {}, got {}",
                env::MAX_INDEX,
                device::MAX_SCAN_INDEX,
                self.max_index
            )));
        }
        Ok(())
    }

    /// Target `(width, height)`
    pub fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn device_config(&self) -> DeviceConfig {
        DeviceConfig {
            preferred_index: self.camera_index,
            width: self.width,
            height: self.height,
        }
    }

    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            auto_detect: self.auto_detect,
            max_index: self.max_index,
            open_retry: Duration::from_millis(self.open_retry_ms),
        }
        .normalized()
    }

    pub fn recording_settings(&self) -> RecordingSettings {
        RecordingSettings {
            output_dir: self.output_dir.clone(),
            fps: self.record_fps,
            stop_timeout: recording::STOP_TIMEOUT,
        }
    }
}
