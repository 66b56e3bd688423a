// SPDX-License-Identifier: MPL-2.0

//! JPEG encoding and multipart framing for the live stream
//!
//! Each streamed frame becomes one part of a
//! `multipart/x-mixed-replace` body:
//!
//! ```text
//! --frame\r\n
//! Content-Type: image/jpeg\r\n
//! \r\n
//! <jpeg bytes>\r\n
//! ```

use crate::backends::camera::Frame;
use crate::constants::stream::BOUNDARY;
use image::codecs::jpeg::JpegEncoder;
use tracing::warn;

/// Encode a frame as baseline JPEG
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Vec::with_capacity(frame.as_bytes().len() / 8);
    let encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    frame.image().write_with_encoder(encoder)?;
    Ok(out)
}

/// Wrap JPEG bytes in one multipart part
pub fn multipart_part(jpeg: &[u8]) -> Vec<u8> {
    let header = format!("--{}\r\nContent-Type: image/jpeg\r\n\r\n", BOUNDARY);
    let mut part = Vec::with_capacity(header.len() + jpeg.len() + 2);
    part.extend_from_slice(header.as_bytes());
    part.extend_from_slice(jpeg);
    part.extend_from_slice(b"\r\n");
    part
}

/// Encode and frame in one step
///
/// An encode failure yields an empty chunk, which callers skip.
pub fn frame_to_part(frame: &Frame, quality: u8) -> Vec<u8> {
    if frame.is_empty() {
        return Vec::new();
    }
    match encode_jpeg(frame, quality) {
        Ok(jpeg) => multipart_part(&jpeg),
        Err(e) => {
            warn!(error = %e, "JPEG encoding failed, dropping frame");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_framing() {
        let part = multipart_part(b"JPEG");
        assert_eq!(
            part,
            b"--frame\r\nContent-Type: image/jpeg\r\n\r\nJPEG\r\n".to_vec()
        );
    }

    #[test]
    fn test_encoded_part_carries_jpeg_markers() {
        let part = frame_to_part(&Frame::solid(16, 8, [10, 200, 30]), 80);
        let header_len = "--frame\r\nContent-Type: image/jpeg\r\n\r\n".len();
        assert_eq!(&part[header_len..header_len + 2], &[0xFF, 0xD8]);
        assert!(part.ends_with(&[0xFF, 0xD9, b'\r', b'\n']));
    }

    #[test]
    fn test_empty_frame_yields_empty_chunk() {
        assert!(frame_to_part(&Frame::solid(0, 0, [0, 0, 0]), 80).is_empty());
    }
}
