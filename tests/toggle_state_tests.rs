// SPDX-License-Identifier: MPL-2.0

//! Concurrency tests for the shared toggles

use camera_relay::ToggleState;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

#[test]
fn test_concurrent_toggles_are_not_lost() {
    let toggles = Arc::new(ToggleState::new());

    // 8 threads x 25 flips = 200, an even count, so grey ends where it started
    let workers: Vec<_> = (0..8)
        .map(|_| {
            let toggles = Arc::clone(&toggles);
            thread::spawn(move || {
                for _ in 0..25 {
                    toggles.toggle_grey();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    assert!(!toggles.snapshot().grey_on);

    let workers: Vec<_> = (0..3)
        .map(|_| {
            let toggles = Arc::clone(&toggles);
            thread::spawn(move || {
                toggles.toggle_negative();
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    assert!(toggles.snapshot().negative_on);
}

#[test]
fn test_capture_request_consumed_exactly_once() {
    let toggles = Arc::new(ToggleState::new());
    let consumed = Arc::new(AtomicUsize::new(0));

    toggles.request_capture();
    toggles.request_capture();

    let workers: Vec<_> = (0..16)
        .map(|_| {
            let toggles = Arc::clone(&toggles);
            let consumed = Arc::clone(&consumed);
            thread::spawn(move || {
                if toggles.consume_capture_request() {
                    consumed.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(consumed.load(Ordering::SeqCst), 1);
    assert!(!toggles.consume_capture_request());
}

#[test]
fn test_snapshot_is_consistent_copy() {
    let toggles = ToggleState::new();
    let before = toggles.snapshot();

    toggles.toggle_face_only();
    toggles.toggle_stream();

    assert!(before.stream_on);
    assert!(!before.face_only_on);

    let after = toggles.snapshot();
    assert!(!after.stream_on);
    assert!(after.face_only_on);
}

#[test]
fn test_ensure_stream_on_reports_change() {
    let toggles = ToggleState::new();
    assert!(!toggles.ensure_stream_on());

    toggles.toggle_stream();
    assert!(toggles.ensure_stream_on());
    assert!(toggles.snapshot().stream_on);
}
