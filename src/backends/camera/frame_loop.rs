// SPDX-License-Identifier: GPL-3.0-only
//! Thread lifecycle management for frame loops
//!
//! Streaming consumers and the recording worker both run a closure over and
//! over on a dedicated thread until asked to stop. [`LoopController`] owns
//! that thread: it starts it, signals it, and joins it either without limit
//! or with a deadline after which the thread is left to finish on its own.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Action returned by the loop callback to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Controller for a loop running in a separate thread
///
/// # Example
///
/// ```ignore
/// let mut controller = LoopController::start("consumer", move || {
///     emit(pipeline.next_part());
///     LoopAction::Continue
/// })?;
///
/// // Later, stop the loop
/// controller.stop();
/// ```
pub struct LoopController {
    /// Thread handle for joining
    thread_handle: Option<JoinHandle<()>>,
    /// Signal to stop the loop
    stop_signal: Arc<AtomicBool>,
    /// Disconnects when the thread exits, for bounded joins
    done: Receiver<()>,
    /// Name for logging
    name: String,
}

impl LoopController {
    /// Start a new loop in a separate thread
    ///
    /// The provided closure is called repeatedly until it returns `LoopAction::Stop`
    /// or the controller's `stop()` method is called.
    ///
    /// # Arguments
    ///
    /// * `name` - Thread name, also used in logging
    /// * `loop_fn` - A closure that performs one iteration of the loop
    pub fn start<F>(name: &str, mut loop_fn: F) -> std::io::Result<Self>
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        Self::start_with_init(name, || Ok(()), move |_: &mut ()| loop_fn())
    }

    /// Start a loop with initialization
    ///
    /// The `init_fn` is called once at the start of the thread to set up
    /// resources. If initialization fails, the thread exits immediately.
    /// The state is dropped on the loop thread when the loop ends, so
    /// `Drop` impls on it run there too.
    ///
    /// # Arguments
    ///
    /// * `name` - Thread name, also used in logging
    /// * `init_fn` - Initialization closure, returns Ok(state) or Err(message)
    /// * `loop_fn` - Loop closure that receives the state and returns LoopAction
    pub fn start_with_init<S, I, F>(name: &str, init_fn: I, mut loop_fn: F) -> std::io::Result<Self>
    where
        S: 'static,
        I: FnOnce() -> Result<S, String> + Send + 'static,
        F: FnMut(&mut S) -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let (done_tx, done) = mpsc::sync_channel::<()>(0);
        let name_clone = name.to_string();

        info!(name = %name, "Starting loop thread");

        let thread_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                // Dropped when this closure returns, which wakes bounded joins
                let _done: SyncSender<()> = done_tx;

                let mut state = match init_fn() {
                    Ok(s) => s,
                    Err(e) => {
                        warn!(name = %name_clone, error = %e, "Loop initialization failed");
                        return;
                    }
                };

                while !stop_signal_clone.load(Ordering::SeqCst) {
                    if loop_fn(&mut state) == LoopAction::Stop {
                        debug!(name = %name_clone, "Loop requested stop");
                        break;
                    }
                }

                drop(state);
                info!(name = %name_clone, "Loop thread exiting");
            })?;

        Ok(Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            done,
            name: name.to_string(),
        })
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Signal the loop to stop (non-blocking)
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Stop the loop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Stop the loop, waiting at most `timeout` for the thread
    ///
    /// Returns `true` if the thread finished in time. Otherwise the thread
    /// is detached and keeps running until its current iteration returns.
    pub fn stop_with_timeout(&mut self, timeout: Duration) -> bool {
        self.request_stop();

        match self.done.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => {
                warn!(name = %self.name, ?timeout, "Loop thread did not stop in time, detaching");
                self.thread_handle.take();
                false
            }
            // Disconnected: the thread dropped its sender on exit
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                self.join();
                true
            }
        }
    }

    /// Wait for the thread to finish without sending stop signal
    ///
    /// Useful if the loop stops itself via `LoopAction::Stop`.
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            debug!(name = %self.name, "Waiting for loop thread to finish");
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Loop thread panicked: {:?}", e);
            }
        }
    }
}

impl Drop for LoopController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "LoopController dropped, stopping loop");
            self.stop();
        }
    }
}
