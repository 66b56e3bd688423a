// SPDX-License-Identifier: MPL-2.0

//! Background recording session
//!
//! Streaming consumers publish their processed frames into a single
//! last-write-wins slot; a dedicated worker samples that slot at a fixed rate
//! and appends whatever it finds to the output file.
//!
//! ```text
//! consumer ─┐
//! consumer ─┼─▶ latest frame slot ──(every 1/fps)──▶ worker ──▶ EncodeSink
//! consumer ─┘
//! ```
//!
//! Publishing never waits on encoding. Frames published faster than the
//! worker samples are dropped, and when the stream stalls the last frame is
//! written again, so the file keeps its nominal rate.

use super::sink::{AviSinkFactory, EncodeSink, SinkFactory};
use crate::backends::camera::Frame;
use crate::backends::camera::frame_loop::{LoopAction, LoopController};
use crate::constants::recording as defaults;
use crate::errors::{RecordingError, RecordingResult};
use crate::storage::unique_timestamped_path;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Recording parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSettings {
    /// Directory new files are created in
    pub output_dir: PathBuf,
    /// Sampling and container rate
    pub fps: f64,
    /// Upper bound on how long `stop` waits for the worker
    pub stop_timeout: Duration,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            fps: defaults::DEFAULT_FPS,
            stop_timeout: defaults::STOP_TIMEOUT,
        }
    }
}

impl RecordingSettings {
    /// Worker tick: `1/fps`, or the fallback when the rate is not positive
    pub fn sample_interval(&self) -> Duration {
        if self.fps.is_finite() && self.fps > 0.0 {
            Duration::from_secs_f64(1.0 / self.fps)
        } else {
            defaults::FALLBACK_INTERVAL
        }
    }
}

/// Single-slot mailbox between consumers and the worker
type LatestFrame = Arc<Mutex<Option<Frame>>>;

fn lock_slot(slot: &LatestFrame) -> MutexGuard<'_, Option<Frame>> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

/// State owned by the worker thread
///
/// Dropping it finalises the sink, so the file is closed on the worker
/// thread even when `stop` gives up waiting.
struct RecordingWorker {
    sink: Box<dyn EncodeSink>,
    latest: LatestFrame,
    frames_written: Arc<AtomicU64>,
    interval: Duration,
}

impl RecordingWorker {
    fn tick(&mut self) -> LoopAction {
        let frame = lock_slot(&self.latest).clone();
        if let Some(frame) = frame {
            match self.sink.write(&frame) {
                Ok(()) => {
                    self.frames_written.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => debug!(error = %e, "Dropping frame that failed to encode"),
            }
        }
        std::thread::sleep(self.interval);
        LoopAction::Continue
    }
}

impl Drop for RecordingWorker {
    fn drop(&mut self) {
        self.sink.finish();
        info!(
            frames = self.frames_written.load(Ordering::Relaxed),
            "Recording finalised"
        );
    }
}

/// A recording in progress
struct ActiveRecording {
    controller: LoopController,
    path: PathBuf,
    frame_size: (u32, u32),
    frames_written: Arc<AtomicU64>,
}

/// Background recorder shared by all consumers
///
/// At most one recording is active at a time; `start` while active fails
/// with [`RecordingError::AlreadyRecording`] and `stop` while idle does
/// nothing.
pub struct RecordingSession {
    settings: RecordingSettings,
    factory: Arc<dyn SinkFactory>,
    latest: LatestFrame,
    /// Fast flag read by consumers every frame
    recording: AtomicBool,
    /// Serialises start/stop and holds the worker
    active: Mutex<Option<ActiveRecording>>,
}

impl RecordingSession {
    /// Recorder writing Motion-JPEG AVI files
    pub fn new(settings: RecordingSettings) -> Self {
        Self::with_factory(settings, Arc::new(AviSinkFactory))
    }

    /// Recorder with a custom sink factory
    pub fn with_factory(settings: RecordingSettings, factory: Arc<dyn SinkFactory>) -> Self {
        Self {
            settings,
            factory,
            latest: Arc::new(Mutex::new(None)),
            recording: AtomicBool::new(false),
            active: Mutex::new(None),
        }
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveRecording>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Begin recording frames of `frame_size` into a new file
    ///
    /// # Returns
    /// * `Ok(PathBuf)` - Path of the file being written
    /// * `Err(AlreadyRecording)` - A recording is active
    /// * `Err(SinkOpenFailed)` - Directory or writer could not be opened
    pub fn start(&self, frame_size: (u32, u32)) -> RecordingResult<PathBuf> {
        let mut active = self.lock_active();
        if active.is_some() {
            return Err(RecordingError::AlreadyRecording);
        }

        let dir = &self.settings.output_dir;
        std::fs::create_dir_all(dir).map_err(|e| RecordingError::SinkOpenFailed {
            path: dir.clone(),
            reason: e.to_string(),
        })?;

        let path = unique_timestamped_path(dir, defaults::FILE_PREFIX, defaults::FILE_EXTENSION);
        let sink = self.factory.open(&path, self.settings.fps, frame_size)?;

        lock_slot(&self.latest).take();

        let frames_written = Arc::new(AtomicU64::new(0));
        let worker = RecordingWorker {
            sink,
            latest: Arc::clone(&self.latest),
            frames_written: Arc::clone(&frames_written),
            interval: self.settings.sample_interval(),
        };

        let controller =
            LoopController::start_with_init("recorder", move || Ok(worker), RecordingWorker::tick)
                .map_err(|e| RecordingError::WorkerFailed(e.to_string()))?;

        info!(
            path = %path.display(),
            width = frame_size.0,
            height = frame_size.1,
            fps = self.settings.fps,
            "Recording started"
        );

        *active = Some(ActiveRecording {
            controller,
            path: path.clone(),
            frame_size,
            frames_written,
        });
        self.recording.store(true, Ordering::SeqCst);

        Ok(path)
    }

    /// Stop the active recording
    ///
    /// Waits up to the configured timeout for the worker to finish; a worker
    /// that takes longer is detached and closes the file on its own.
    ///
    /// # Returns
    /// The path of the recording that was stopped, or `None` when idle.
    pub fn stop(&self) -> Option<PathBuf> {
        let mut active = self.lock_active();
        let mut recording = active.take()?;
        self.recording.store(false, Ordering::SeqCst);

        if !recording
            .controller
            .stop_with_timeout(self.settings.stop_timeout)
        {
            warn!(path = %recording.path.display(), "Recorder worker still finishing in background");
        }
        lock_slot(&self.latest).take();

        info!(
            path = %recording.path.display(),
            frames = recording.frames_written.load(Ordering::Relaxed),
            "Recording stopped"
        );
        Some(recording.path)
    }

    /// Publish the most recent processed frame
    ///
    /// Overwrites any frame the worker has not sampled yet. Ignored while
    /// idle, so a consumer racing `stop` cannot leave a stale frame behind.
    pub fn update_frame(&self, frame: Frame) {
        let mut slot = lock_slot(&self.latest);
        if self.recording.load(Ordering::SeqCst) {
            *slot = Some(frame);
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    /// File of the active recording
    pub fn output_path(&self) -> Option<PathBuf> {
        self.lock_active().as_ref().map(|a| a.path.clone())
    }

    /// Frame size of the active recording
    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.lock_active().as_ref().map(|a| a.frame_size)
    }

    /// Frames appended so far by the active recording
    pub fn frames_written(&self) -> u64 {
        self.lock_active()
            .as_ref()
            .map(|a| a.frames_written.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Directory new recordings are written to
    pub fn output_dir(&self) -> &Path {
        &self.settings.output_dir
    }

    pub fn settings(&self) -> &RecordingSettings {
        &self.settings
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for RecordingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingSession")
            .field("settings", &self.settings)
            .field("recording", &self.is_recording())
            .finish()
    }
}
