// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Probing capture indices and backends
//! - Writing the MJPEG stream without a web server
//! - Taking stills
//! - Recording videos

use camera_relay::backends::camera::enumeration::{probe_devices, troubleshooting_hints};
use camera_relay::backends::camera::platform_backends;
use camera_relay::{ActionOutcome, AppContext, Config, ControlAction};
use std::io::Write;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Delay before a still is taken, so auto-exposure can settle
const PHOTO_WARMUP: Duration = Duration::from_millis(500);

/// Give up on a still after this long without a live frame
const PHOTO_TIMEOUT: Duration = Duration::from_secs(5);

/// Probe every index with every backend and print the result
pub fn list_cameras(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let backends = platform_backends();
    let reports = probe_devices(&backends, config.max_index, config.width, config.height);

    for report in &reports {
        for line in report.lines() {
            println!("{}", line);
        }
    }

    if !reports.iter().any(|r| r.is_usable()) {
        println!();
        for hint in troubleshooting_hints() {
            println!("{}", hint);
        }
    }

    Ok(())
}

/// Write the multipart stream until Ctrl+C or `frames` parts
pub fn stream(
    config: Config,
    frames: Option<u64>,
    output: Option<PathBuf>,
    actions: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = AppContext::new(config);
    apply_actions(&ctx, actions)?;

    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(std::io::BufWriter::new(std::fs::File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };

    let stop_flag = install_stop_flag()?;
    let pipeline = ctx.streaming_pipeline();
    let mut written = 0u64;
    let mut write_error = None;

    pipeline.run(|part| {
        if stop_flag.load(Ordering::SeqCst) {
            return ControlFlow::Break(());
        }
        if let Err(e) = out.write_all(&part).and_then(|_| out.flush()) {
            write_error = Some(e);
            return ControlFlow::Break(());
        }
        written += 1;
        match frames {
            Some(limit) if written >= limit => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    });

    ctx.shutdown();
    eprintln!("Wrote {} parts", written);

    match write_error {
        // A closed pipe just means the reader went away
        Some(e) if e.kind() != std::io::ErrorKind::BrokenPipe => Err(e.into()),
        _ => Ok(()),
    }
}

/// Capture one processed still
pub fn take_photo(config: Config, actions: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = AppContext::new(config);
    apply_actions(&ctx, actions)?;

    let pipeline = ctx.streaming_pipeline();
    let start = Instant::now();

    println!("Capturing...");
    while start.elapsed() < PHOTO_WARMUP {
        let emitted = pipeline.next_frame();
        std::thread::sleep(pipeline.delay_after(emitted.kind));
    }

    ctx.apply(ControlAction::RequestStillCapture)?;
    let result = loop {
        if start.elapsed() > PHOTO_TIMEOUT {
            break Err("No live frame from camera".into());
        }
        let emitted = pipeline.next_frame();
        match emitted.still {
            Some(Ok(path)) => {
                println!("Still saved: {}", path.display());
                break Ok(());
            }
            Some(Err(e)) => break Err(e.into()),
            None => std::thread::sleep(pipeline.delay_after(emitted.kind)),
        }
    };

    ctx.shutdown();
    result
}

/// Record for `duration` seconds, or until Ctrl+C
///
/// Recording samples frames produced by a streaming loop, so a headless
/// loop runs for the whole duration.
pub fn record_video(
    config: Config,
    duration: u64,
    actions: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = AppContext::new(config);
    apply_actions(&ctx, actions)?;

    match ctx.apply(ControlAction::ToggleRecording)? {
        ActionOutcome::RecordingStarted(path) => println!("Output: {}", path.display()),
        other => return Err(format!("Unexpected outcome: {:?}", other).into()),
    }

    println!("Duration: {} seconds", duration);
    println!();
    println!("Recording... (press Ctrl+C to stop early)");

    let stop_flag = install_stop_flag()?;
    let pipeline = ctx.streaming_pipeline();
    let start = Instant::now();
    let target_duration = Duration::from_secs(duration);
    let mut last_second = u64::MAX;

    pipeline.run(|_part| {
        if stop_flag.load(Ordering::SeqCst) {
            println!();
            println!("Stopping early...");
            return ControlFlow::Break(());
        }
        if start.elapsed() >= target_duration {
            return ControlFlow::Break(());
        }

        let elapsed = start.elapsed().as_secs();
        if elapsed != last_second {
            last_second = elapsed;
            print!("\rRecording: {:02}:{:02}", elapsed / 60, elapsed % 60);
            let _ = std::io::stdout().flush();
        }
        ControlFlow::Continue(())
    });
    println!();

    let frames = ctx.recorder.frames_written();
    if let ActionOutcome::RecordingStopped(path) = ctx.apply(ControlAction::ToggleRecording)? {
        println!("Video saved: {} ({} frames)", path.display(), frames);
    }

    ctx.shutdown();
    Ok(())
}

/// Open the device and print the status view
pub fn status(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = AppContext::new(config);
    ctx.device.open();
    println!("{}", serde_json::to_string_pretty(&ctx.status())?);
    ctx.shutdown();
    Ok(())
}

fn apply_actions(ctx: &AppContext, actions: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    for name in actions {
        let action: ControlAction = name.parse()?;
        ctx.apply(action)?;
    }
    Ok(())
}

fn install_stop_flag() -> Result<Arc<AtomicBool>, Box<dyn std::error::Error>> {
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = Arc::clone(&stop_flag);
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;
    Ok(stop_flag)
}
