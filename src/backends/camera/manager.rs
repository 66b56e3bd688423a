// SPDX-License-Identifier: GPL-3.0-only

//! Capture device lifecycle manager
//!
//! The manager provides:
//! - Lazy opening with backend and index fallback
//! - Backoff between failed open attempts
//! - Thread-safe frame reads shared by every consumer
//! - Idempotent release
//!
//! # Locking
//!
//! Three locks are involved, always taken in this order:
//!
//! 1. `probe_lock` serialises every construction and destruction of native
//!    handles, so two threads never open or close the device at once.
//! 2. `state` guards the active slot and the failure timestamp. It is held
//!    only for short transitions and queries, never across device I/O.
//! 3. The per-handle mutex is held for the duration of one device read.
//!
//! A reader never holds `state` while blocked on the device, so status
//! queries stay responsive even when a read stalls.

use super::types::*;
use super::{CaptureBackend, CaptureHandle, platform_backends};
use crate::constants;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Open handle shared between the manager and in-flight reads
type SharedHandle = Arc<Mutex<Box<dyn CaptureHandle>>>;

/// Device probing behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    /// Scan other indices when the preferred one fails
    pub auto_detect: bool,
    /// Highest index scanned during auto-detection (inclusive)
    pub max_index: u32,
    /// Minimum delay after a failed open before trying again
    pub open_retry: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            auto_detect: true,
            max_index: constants::device::DEFAULT_MAX_INDEX,
            open_retry: constants::OPEN_RETRY_INTERVAL,
        }
    }
}

impl ProbeSettings {
    /// Clamp the retry interval and the scan range to their bounds
    pub fn normalized(mut self) -> Self {
        self.open_retry = self.open_retry.max(constants::MIN_OPEN_RETRY_INTERVAL);
        self.max_index = self.max_index.min(constants::device::MAX_SCAN_INDEX);
        self
    }

    /// Indices to try, in order: preferred first, then the scan range
    pub fn candidate_indices(&self, preferred: u32) -> impl Iterator<Item = u32> + use<> {
        let scan = if self.auto_detect {
            0..=self.max_index
        } else {
            1..=0
        };
        std::iter::once(preferred).chain(scan.filter(move |&i| i != preferred))
    }
}

/// The currently open device
struct ActiveDevice {
    handle: SharedHandle,
    index: u32,
    backend: BackendId,
}

/// Internal manager state
#[derive(Default)]
struct DeviceState {
    /// Handle, index and backend are present together or not at all
    active: Option<ActiveDevice>,
    last_open_failure_at: Option<Instant>,
}

/// Shared capture device manager
///
/// Owns at most one open device. Safe to share across threads; every
/// consumer loop reads through the same manager.
pub struct DeviceManager {
    config: DeviceConfig,
    probe: ProbeSettings,
    backends: Vec<Arc<dyn CaptureBackend>>,
    state: Mutex<DeviceState>,
    probe_lock: Mutex<()>,
}

impl DeviceManager {
    /// Create a manager using the platform's backend candidates
    ///
    /// # Arguments
    /// * `config` - Preferred index and target size
    /// * `probe` - Auto-detection and retry settings
    pub fn new(config: DeviceConfig, probe: ProbeSettings) -> Self {
        Self::with_backends(config, probe, platform_backends())
    }

    /// Create a manager with an explicit backend candidate list
    pub fn with_backends(
        config: DeviceConfig,
        probe: ProbeSettings,
        backends: Vec<Arc<dyn CaptureBackend>>,
    ) -> Self {
        let probe = probe.normalized();
        info!(
            index = config.preferred_index,
            width = config.width,
            height = config.height,
            auto_detect = probe.auto_detect,
            max_index = probe.max_index,
            backends = backends.len(),
            "Creating device manager"
        );

        Self {
            config,
            probe,
            backends,
            state: Mutex::new(DeviceState::default()),
            probe_lock: Mutex::new(()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_probe(&self) -> MutexGuard<'_, ()> {
        self.probe_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Open the device if it is not already open
    ///
    /// Does nothing when a device is open, or when the last failed attempt
    /// is more recent than the retry interval. Otherwise tries every
    /// candidate index with every backend and keeps the first success.
    pub fn open(&self) {
        let _probe = self.lock_probe();

        {
            let state = self.lock_state();
            if state.active.is_some() {
                return;
            }
            if let Some(failed_at) = state.last_open_failure_at
                && failed_at.elapsed() < self.probe.open_retry
            {
                return;
            }
        }

        let (width, height) = self.config.size();
        for index in self.probe.candidate_indices(self.config.preferred_index) {
            for backend in &self.backends {
                match backend.open(index, width, height) {
                    Ok(handle) => {
                        info!(index, backend = %backend.id(), "Capture device opened");
                        let mut state = self.lock_state();
                        state.active = Some(ActiveDevice {
                            handle: Arc::new(Mutex::new(handle)),
                            index,
                            backend: backend.id(),
                        });
                        state.last_open_failure_at = None;
                        return;
                    }
                    Err(e) => {
                        debug!(index, backend = %backend.id(), error = %e, "Open attempt failed");
                    }
                }
            }
        }

        warn!(
            preferred = self.config.preferred_index,
            "No capture device could be opened"
        );
        self.lock_state().last_open_failure_at = Some(Instant::now());
    }

    /// Read one frame, opening the device lazily
    ///
    /// A failed device read releases the handle and starts the retry
    /// backoff; the next call reopens once the interval has passed.
    pub fn read(&self) -> BackendResult<Frame> {
        let handle = match self.current_handle() {
            Some(handle) => handle,
            None => {
                self.open();
                self.current_handle().ok_or_else(|| {
                    BackendError::NotAvailable("no capture device is open".into())
                })?
            }
        };

        let result = handle.lock().unwrap_or_else(|e| e.into_inner()).read();

        match result {
            Ok(frame) if !frame.is_empty() => Ok(frame),
            Ok(_) => {
                self.drop_failed_handle(&handle);
                Err(BackendError::ReadFailed("device returned an empty frame".into()))
            }
            Err(e) => {
                warn!(error = %e, "Frame read failed, releasing device");
                self.drop_failed_handle(&handle);
                Err(match e {
                    BackendError::ReadFailed(_) => e,
                    other => BackendError::ReadFailed(other.to_string()),
                })
            }
        }
    }

    fn current_handle(&self) -> Option<SharedHandle> {
        self.lock_state()
            .active
            .as_ref()
            .map(|active| Arc::clone(&active.handle))
    }

    /// Release `failed` if it is still the active handle and record the failure
    fn drop_failed_handle(&self, failed: &SharedHandle) {
        let _probe = self.lock_probe();

        let taken = {
            let mut state = self.lock_state();
            let is_current = state
                .active
                .as_ref()
                .is_some_and(|active| Arc::ptr_eq(&active.handle, failed));
            if !is_current {
                return;
            }
            state.last_open_failure_at = Some(Instant::now());
            state.active.take()
        };

        if let Some(active) = taken {
            active
                .handle
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .release();
        }
    }

    /// Close the device if open
    pub fn release(&self) {
        let _probe = self.lock_probe();

        let taken = self.lock_state().active.take();
        if let Some(active) = taken {
            info!(index = active.index, backend = %active.backend, "Releasing capture device");
            active
                .handle
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .release();
        }
    }

    /// Index of the open device, if any
    pub fn active_index(&self) -> Option<u32> {
        self.lock_state().active.as_ref().map(|a| a.index)
    }

    /// Backend of the open device, if any
    pub fn active_backend(&self) -> Option<BackendId> {
        self.lock_state().active.as_ref().map(|a| a.backend)
    }

    pub fn is_open(&self) -> bool {
        self.lock_state().active.is_some()
    }

    /// Device parameters this manager was built with
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Probe settings after normalisation
    pub fn probe_settings(&self) -> &ProbeSettings {
        &self.probe
    }
}

impl Drop for DeviceManager {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for DeviceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock_state();
        f.debug_struct("DeviceManager")
            .field("config", &self.config)
            .field("active_index", &state.active.as_ref().map(|a| a.index))
            .field("active_backend", &state.active.as_ref().map(|a| a.backend))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_indices_preferred_first() {
        let probe = ProbeSettings {
            auto_detect: true,
            max_index: 3,
            open_retry: Duration::from_secs(1),
        };
        assert_eq!(probe.candidate_indices(2).collect::<Vec<_>>(), vec![2, 0, 1, 3]);
    }

    #[test]
    fn test_candidate_indices_without_auto_detect() {
        let probe = ProbeSettings {
            auto_detect: false,
            ..ProbeSettings::default()
        };
        assert_eq!(probe.candidate_indices(4).collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn test_huge_scan_range_is_bounded() {
        let probe = ProbeSettings {
            auto_detect: true,
            max_index: u32::MAX,
            open_retry: Duration::ZERO,
        }
        .normalized();

        assert_eq!(probe.max_index, constants::device::MAX_SCAN_INDEX);
        assert_eq!(probe.open_retry, constants::MIN_OPEN_RETRY_INTERVAL);
        assert_eq!(probe.candidate_indices(0).count(), 64);

        // Unnormalized settings are still walked lazily
        let wide = ProbeSettings {
            max_index: u32::MAX,
            ..ProbeSettings::default()
        };
        assert_eq!(wide.candidate_indices(7).take(3).collect::<Vec<_>>(), vec![7, 0, 1]);
    }

    #[test]
    fn test_candidate_indices_preferred_outside_range() {
        let probe = ProbeSettings {
            auto_detect: true,
            max_index: 1,
            open_retry: Duration::from_secs(1),
        };
        assert_eq!(probe.candidate_indices(7).collect::<Vec<_>>(), vec![7, 0, 1]);
    }

    #[test]
    fn test_retry_interval_floor() {
        let probe = ProbeSettings {
            open_retry: Duration::ZERO,
            ..ProbeSettings::default()
        }
        .normalized();
        assert_eq!(probe.open_retry, constants::MIN_OPEN_RETRY_INTERVAL);
    }
}
