// SPDX-License-Identifier: MPL-2.0

//! Still capture
//!
//! When a capture is pending, the streaming loop hands the processed frame
//! (after grey/negative, before mirroring) to [`save_still`], which writes it
//! losslessly as PNG under a timestamped name.

use crate::backends::camera::Frame;
use crate::constants::still::FILE_PREFIX;
use crate::errors::StillError;
use crate::storage::unique_timestamped_path;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::info;

/// Save `frame` as `<dir>/shot_<timestamp>.png`
///
/// The directory is created when missing.
///
/// # Returns
/// * `Ok(PathBuf)` - Path to saved file
/// * `Err(StillError)` - Directory, encoding, or write failure
pub fn save_still(frame: &Frame, dir: &Path) -> Result<PathBuf, StillError> {
    std::fs::create_dir_all(dir)?;

    let path = unique_timestamped_path(dir, FILE_PREFIX, "png");
    frame.image().save_with_format(&path, ImageFormat::Png)?;

    info!(path = %path.display(), width = frame.width(), height = frame.height(), "Still saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_still_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let shots = dir.path().join("shots");
        let frame = Frame::solid(8, 6, [12, 34, 56]);

        let path = save_still(&frame, &shots).unwrap();

        assert_eq!(path.extension().unwrap(), "png");
        let loaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(loaded.dimensions(), (8, 6));
        assert_eq!(loaded.get_pixel(3, 3).0, [12, 34, 56]);
    }

    #[test]
    fn test_save_still_into_file_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"x").unwrap();

        assert!(save_still(&Frame::solid(2, 2, [0, 0, 0]), &blocker).is_err());
    }
}
