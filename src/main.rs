// SPDX-License-Identifier: GPL-3.0-only

use camera_relay::Config;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "camera-relay")]
#[command(about = "Share one webcam between MJPEG viewers, stills and recording")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    device: DeviceArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for the `CAMERA_*` environment variables
#[derive(Args)]
struct DeviceArgs {
    /// Preferred capture index
    #[arg(short, long, global = true)]
    camera: Option<u32>,

    /// Frame width
    #[arg(long, global = true)]
    width: Option<u32>,

    /// Frame height
    #[arg(long, global = true)]
    height: Option<u32>,

    /// Only try the preferred index
    #[arg(long, global = true)]
    no_auto_detect: bool,

    /// Highest index scanned during auto-detection
    #[arg(long, global = true)]
    max_index: Option<u32>,

    /// Directory recordings are written to
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Directory stills are written to
    #[arg(long, global = true)]
    shots_dir: Option<PathBuf>,
}

impl DeviceArgs {
    fn apply(self, config: &mut Config) {
        if let Some(camera) = self.camera {
            config.camera_index = camera;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if self.no_auto_detect {
            config.auto_detect = false;
        }
        if let Some(max_index) = self.max_index {
            config.max_index = max_index;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(dir) = self.shots_dir {
            config.shots_dir = dir;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Probe capture indices and backends
    List,

    /// Write the multipart MJPEG stream to a file or stdout
    Stream {
        /// Stop after this many parts (default: until Ctrl+C)
        #[arg(short, long)]
        frames: Option<u64>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Toggle actions applied before streaming (e.g. grey, neg, face)
        #[arg(short, long)]
        action: Vec<String>,
    },

    /// Save a single processed still
    Photo {
        /// Toggle actions applied before capturing (e.g. grey, neg)
        #[arg(short, long)]
        action: Vec<String>,
    },

    /// Record a video
    Record {
        /// Recording duration in seconds
        #[arg(short, long, default_value = "10")]
        duration: u64,

        /// Recording frame rate
        #[arg(long)]
        fps: Option<f64>,

        /// Toggle actions applied before recording (e.g. grey, neg)
        #[arg(short, long)]
        action: Vec<String>,
    },

    /// Open the device and print the status as JSON
    Status,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=camera_relay=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    cli.device.apply(&mut config);
    config.validate()?;

    match cli.command {
        Commands::List => cli::list_cameras(&config),
        Commands::Stream {
            frames,
            output,
            action,
        } => cli::stream(config, frames, output, &action),
        Commands::Photo { action } => cli::take_photo(config, &action),
        Commands::Record {
            duration,
            fps,
            action,
        } => {
            if let Some(fps) = fps {
                config.record_fps = fps;
            }
            cli::record_video(config, duration, &action)
        }
        Commands::Status => cli::status(config),
    }
}
