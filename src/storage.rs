// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for stills and recordings
//!
//! Artifact names carry a local timestamp with microsecond resolution. The
//! stamp is taken from a process-wide counter that never repeats, so two
//! captures in the same microsecond still get distinct names.

use chrono::{DateTime, Local, Utc};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::debug;

/// Last microsecond stamp handed out
static LAST_STAMP_MICROS: AtomicI64 = AtomicI64::new(0);

/// Next strictly increasing wall-clock stamp in microseconds since the epoch
fn next_stamp_micros() -> i64 {
    let now = Utc::now().timestamp_micros();
    let mut last = LAST_STAMP_MICROS.load(Ordering::SeqCst);
    loop {
        let next = now.max(last + 1);
        match LAST_STAMP_MICROS.compare_exchange_weak(last, next, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// Local timestamp formatted as `YYYYmmdd_HHMMSS_ffffff`
pub fn timestamp() -> String {
    let micros = next_stamp_micros();
    DateTime::from_timestamp_micros(micros)
        .map(|t| t.with_timezone(&Local))
        .unwrap_or_else(Local::now)
        .format("%Y%m%d_%H%M%S_%6f")
        .to_string()
}

/// `dir/<prefix>_<timestamp>.<ext>`, unique within this process
pub fn unique_timestamped_path(dir: &Path, prefix: &str, ext: &str) -> PathBuf {
    let path = dir.join(format!("{}_{}.{}", prefix, timestamp(), ext));
    debug!(path = %path.display(), "Allocated artifact path");
    path
}
