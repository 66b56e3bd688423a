// SPDX-License-Identifier: MPL-2.0

//! Stub capture backends and video sinks shared by the integration tests

#![allow(dead_code)]

use camera_relay::backends::camera::{
    BackendError, BackendId, BackendResult, CaptureBackend, CaptureHandle, DeviceConfig,
    DeviceManager, Frame, ProbeSettings,
};
use camera_relay::errors::{RecordingError, RecordingResult};
use camera_relay::pipelines::video::{EncodeSink, SinkFactory};
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const WIDTH: u32 = 8;
pub const HEIGHT: u32 = 6;

/// Asymmetric test pattern, so mirroring is observable
pub fn pattern(width: u32, height: u32) -> Frame {
    Frame::new(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 30) as u8, (y * 40) as u8, 90])
    }))
}

/// Backend that opens only the listed indices
pub struct StubBackend {
    id: BackendId,
    working: Vec<u32>,
    frame: Frame,
    /// Every call to `open`, successful or not
    pub opens: AtomicUsize,
    /// Handles released so far
    pub releases: Arc<AtomicUsize>,
    /// Makes every read on every handle fail while set
    pub fail_reads: Arc<AtomicBool>,
}

impl StubBackend {
    pub fn new(id: BackendId, working: &[u32]) -> Arc<Self> {
        Arc::new(Self {
            id,
            working: working.to_vec(),
            frame: pattern(WIDTH, HEIGHT),
            opens: AtomicUsize::new(0),
            releases: Arc::new(AtomicUsize::new(0)),
            fail_reads: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl CaptureBackend for StubBackend {
    fn id(&self) -> BackendId {
        self.id
    }

    fn open(&self, index: u32, _width: u32, _height: u32) -> BackendResult<Box<dyn CaptureHandle>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if !self.working.contains(&index) {
            return Err(BackendError::OpenFailed(format!("stub index {}", index)));
        }
        Ok(Box::new(StubHandle {
            frame: self.frame.clone(),
            fail_reads: Arc::clone(&self.fail_reads),
            releases: Arc::clone(&self.releases),
            released: false,
        }))
    }
}

struct StubHandle {
    frame: Frame,
    fail_reads: Arc<AtomicBool>,
    releases: Arc<AtomicUsize>,
    released: bool,
}

impl CaptureHandle for StubHandle {
    fn read(&mut self) -> BackendResult<Frame> {
        if self.released {
            return Err(BackendError::Disconnected);
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BackendError::ReadFailed("stub read failure".into()));
        }
        Ok(self.frame.clone())
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Probe settings with the shortest retry interval and no auto-detection
pub fn quick_probe(auto_detect: bool, max_index: u32) -> ProbeSettings {
    ProbeSettings {
        auto_detect,
        max_index,
        open_retry: Duration::from_millis(100),
    }
}

pub fn device_config(preferred_index: u32) -> DeviceConfig {
    DeviceConfig {
        preferred_index,
        width: WIDTH,
        height: HEIGHT,
    }
}

/// Manager over a single stub backend
pub fn manager_with(backend: &Arc<StubBackend>, probe: ProbeSettings) -> DeviceManager {
    DeviceManager::with_backends(
        device_config(0),
        probe,
        vec![Arc::clone(backend) as Arc<dyn CaptureBackend>],
    )
}

/// Sink factory that keeps everything in memory
#[derive(Default)]
pub struct StubSinkFactory {
    pub opened: Mutex<Vec<PathBuf>>,
    pub writes: Arc<AtomicUsize>,
    pub finished: Arc<AtomicUsize>,
    pub last_frame: Arc<Mutex<Option<Frame>>>,
    /// Refuse to open while set
    pub fail_open: AtomicBool,
    /// Time each write takes
    pub write_delay: Duration,
}

impl StubSinkFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn slow(write_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            write_delay,
            ..Self::default()
        })
    }

    pub fn opened_paths(&self) -> Vec<PathBuf> {
        self.opened.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn finish_count(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.last_frame.lock().unwrap().clone()
    }
}

impl SinkFactory for StubSinkFactory {
    fn open(
        &self,
        path: &Path,
        _fps: f64,
        frame_size: (u32, u32),
    ) -> RecordingResult<Box<dyn EncodeSink>> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(RecordingError::SinkOpenFailed {
                path: path.to_path_buf(),
                reason: "stub refused".into(),
            });
        }
        self.opened.lock().unwrap().push(path.to_path_buf());
        Ok(Box::new(StubSink {
            frame_size,
            writes: Arc::clone(&self.writes),
            finished: Arc::clone(&self.finished),
            last_frame: Arc::clone(&self.last_frame),
            write_delay: self.write_delay,
            done: false,
        }))
    }
}

struct StubSink {
    frame_size: (u32, u32),
    writes: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
    last_frame: Arc<Mutex<Option<Frame>>>,
    write_delay: Duration,
    done: bool,
}

impl EncodeSink for StubSink {
    fn write(&mut self, frame: &Frame) -> RecordingResult<()> {
        if self.done {
            return Err(RecordingError::EncodeFailed("finished".into()));
        }
        if !self.write_delay.is_zero() {
            std::thread::sleep(self.write_delay);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.last_frame.lock().unwrap() = Some(frame.clone());
        Ok(())
    }

    fn finish(&mut self) {
        if !self.done {
            self.done = true;
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }
}
