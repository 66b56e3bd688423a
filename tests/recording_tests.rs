// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the background recording session

mod support;

use camera_relay::errors::RecordingError;
use camera_relay::pipelines::video::{RecordingSession, RecordingSettings, SinkFactory};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, Instant};
use support::{HEIGHT, StubSinkFactory, WIDTH, pattern};

fn session(dir: &Path, fps: f64, factory: &Arc<StubSinkFactory>) -> RecordingSession {
    RecordingSession::with_factory(
        RecordingSettings {
            output_dir: dir.to_path_buf(),
            fps,
            stop_timeout: Duration::from_secs(2),
        },
        Arc::clone(factory) as Arc<dyn SinkFactory>,
    )
}

#[test]
fn test_start_twice_is_already_recording() {
    let dir = tempfile::tempdir().unwrap();
    let factory = StubSinkFactory::new();
    let recorder = session(dir.path(), 20.0, &factory);

    let path = recorder.start((WIDTH, HEIGHT)).unwrap();
    assert!(recorder.is_recording());
    assert_eq!(recorder.output_path(), Some(path.clone()));
    assert_eq!(recorder.frame_size(), Some((WIDTH, HEIGHT)));

    assert_eq!(
        recorder.start((WIDTH, HEIGHT)),
        Err(RecordingError::AlreadyRecording)
    );
    assert_eq!(factory.opened_paths().len(), 1);

    assert_eq!(recorder.stop(), Some(path));
    assert!(!recorder.is_recording());
    assert_eq!(recorder.output_path(), None);
    assert_eq!(factory.finish_count(), 1);
}

#[test]
fn test_stop_when_idle_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let factory = StubSinkFactory::new();
    let recorder = session(dir.path(), 20.0, &factory);

    assert_eq!(recorder.stop(), None);
    assert_eq!(recorder.stop(), None);
    assert!(!recorder.is_recording());
    assert_eq!(factory.finish_count(), 0);
}

#[test]
fn test_start_stop_start_uses_distinct_files() {
    let dir = tempfile::tempdir().unwrap();
    let factory = StubSinkFactory::new();
    let recorder = session(dir.path(), 20.0, &factory);

    let first = recorder.start((WIDTH, HEIGHT)).unwrap();
    recorder.stop();
    let second = recorder.start((WIDTH, HEIGHT)).unwrap();
    recorder.stop();

    assert_ne!(first, second);
    assert_eq!(factory.opened_paths(), vec![first.clone(), second]);
    assert_eq!(factory.finish_count(), 2);

    let name = first.file_name().unwrap().to_string_lossy().into_owned();
    assert!(first.starts_with(dir.path()));
    assert!(name.starts_with("vid_"));
    assert!(name.ends_with(".avi"));
}

#[test]
fn test_output_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let factory = StubSinkFactory::new();
    let recorder = session(&nested, 20.0, &factory);

    let path = recorder.start((WIDTH, HEIGHT)).unwrap();

    assert!(nested.is_dir());
    assert_eq!(path.parent(), Some(nested.as_path()));
    recorder.stop();
}

#[test]
fn test_worker_samples_latest_frame() {
    let dir = tempfile::tempdir().unwrap();
    let factory = StubSinkFactory::new();
    let recorder = session(dir.path(), 100.0, &factory);

    recorder.start((WIDTH, HEIGHT)).unwrap();
    let frame = pattern(WIDTH, HEIGHT);
    recorder.update_frame(frame.clone());
    thread::sleep(Duration::from_millis(200));
    recorder.stop();

    assert!(factory.write_count() > 0);
    assert_eq!(factory.last_frame(), Some(frame));
}

#[test]
fn test_nothing_written_without_frames() {
    let dir = tempfile::tempdir().unwrap();
    let factory = StubSinkFactory::new();
    let recorder = session(dir.path(), 100.0, &factory);

    recorder.start((WIDTH, HEIGHT)).unwrap();
    thread::sleep(Duration::from_millis(100));
    recorder.stop();

    assert_eq!(factory.write_count(), 0);
    assert_eq!(factory.finish_count(), 1);
}

#[test]
fn test_frames_from_previous_session_are_not_reused() {
    let dir = tempfile::tempdir().unwrap();
    let factory = StubSinkFactory::new();
    let recorder = session(dir.path(), 100.0, &factory);

    recorder.start((WIDTH, HEIGHT)).unwrap();
    recorder.update_frame(pattern(WIDTH, HEIGHT));
    thread::sleep(Duration::from_millis(50));
    recorder.stop();
    let written = factory.write_count();

    recorder.start((WIDTH, HEIGHT)).unwrap();
    thread::sleep(Duration::from_millis(100));
    recorder.stop();

    assert_eq!(factory.write_count(), written);
}

#[test]
fn test_sink_open_failure_leaves_session_idle() {
    let dir = tempfile::tempdir().unwrap();
    let factory = StubSinkFactory::new();
    factory.fail_open.store(true, Ordering::SeqCst);
    let recorder = session(dir.path(), 20.0, &factory);

    let result = recorder.start((WIDTH, HEIGHT));

    assert!(matches!(result, Err(RecordingError::SinkOpenFailed { .. })));
    assert!(!recorder.is_recording());

    factory.fail_open.store(false, Ordering::SeqCst);
    assert!(recorder.start((WIDTH, HEIGHT)).is_ok());
    recorder.stop();
}

#[test]
fn test_stop_is_bounded_when_encoding_stalls() {
    let dir = tempfile::tempdir().unwrap();
    let factory = StubSinkFactory::slow(Duration::from_millis(1500));
    let recorder = RecordingSession::with_factory(
        RecordingSettings {
            output_dir: dir.path().to_path_buf(),
            fps: 20.0,
            stop_timeout: Duration::from_millis(100),
        },
        Arc::clone(&factory) as Arc<dyn SinkFactory>,
    );

    recorder.start((WIDTH, HEIGHT)).unwrap();
    recorder.update_frame(pattern(WIDTH, HEIGHT));
    thread::sleep(Duration::from_millis(100));

    let started = Instant::now();
    recorder.stop();

    assert!(started.elapsed() < Duration::from_millis(1000));
    assert!(!recorder.is_recording());
}

#[test]
fn test_update_frame_does_not_wait_for_encoder() {
    let dir = tempfile::tempdir().unwrap();
    let factory = StubSinkFactory::slow(Duration::from_millis(300));
    let recorder = session(dir.path(), 20.0, &factory);

    recorder.start((WIDTH, HEIGHT)).unwrap();
    recorder.update_frame(pattern(WIDTH, HEIGHT));
    thread::sleep(Duration::from_millis(60));

    let started = Instant::now();
    for _ in 0..100 {
        recorder.update_frame(pattern(WIDTH, HEIGHT));
    }
    assert!(started.elapsed() < Duration::from_millis(200));

    recorder.stop();
}
