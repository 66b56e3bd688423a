// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion for raw capture buffers
//!
//! Native capture hands out whatever the driver negotiated. These helpers turn
//! those buffers into packed RGB8 so every later stage sees one layout.

use super::types::{BackendError, BackendResult, Frame};

/// Convert YUYV (YUV 4:2:2) to packed RGB
///
/// YUYV format: Y0 U0 Y1 V0 - each 4-byte group encodes 2 pixels.
/// Uses BT.601 coefficients for YUV to RGB conversion. Trailing bytes that
/// do not form a full group are ignored and missing pixels stay black.
pub fn yuyv_to_rgb(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let pixel_count = (width as usize) * (height as usize);
    let mut rgb = Vec::with_capacity(pixel_count * 3);

    'outer: for chunk in data.chunks_exact(4) {
        let y0 = chunk[0] as f32;
        let u = chunk[1] as f32 - 128.0;
        let y1 = chunk[2] as f32;
        let v = chunk[3] as f32 - 128.0;

        for y in [y0, y1] {
            if rgb.len() >= pixel_count * 3 {
                break 'outer;
            }
            rgb.push((y + 1.402 * v).clamp(0.0, 255.0) as u8);
            rgb.push((y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8);
            rgb.push((y + 1.772 * u).clamp(0.0, 255.0) as u8);
        }
    }

    rgb.resize(pixel_count * 3, 0);
    rgb
}

/// Decode one MJPEG buffer into an RGB frame
pub fn mjpeg_to_frame(data: &[u8]) -> BackendResult<Frame> {
    let decoded = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
        .map_err(|e| BackendError::ReadFailed(format!("MJPEG decode failed: {}", e)))?;
    Ok(Frame::new(decoded.to_rgb8()))
}

/// Copy a strided RGB buffer into a packed one
///
/// Returns `None` when `data` is too short for `height` rows of `stride` bytes.
pub fn pack_rgb_rows(data: &[u8], width: u32, height: u32, stride: usize) -> Option<Vec<u8>> {
    let row_len = width as usize * 3;
    if stride < row_len {
        return None;
    }
    if stride == row_len {
        return data.get(..row_len * height as usize).map(<[u8]>::to_vec);
    }

    let mut packed = Vec::with_capacity(row_len * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        packed.extend_from_slice(data.get(start..start + row_len)?);
    }
    Some(packed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_to_rgb() {
        // Two gray pixels (Y=128, U=V=128)
        let yuyv = [128u8, 128, 128, 128];
        let rgb = yuyv_to_rgb(&yuyv, 2, 1);

        assert_eq!(rgb.len(), 6);
        for value in rgb {
            assert!((value as i32 - 128).abs() <= 1);
        }
    }

    #[test]
    fn test_yuyv_short_buffer_is_padded() {
        let rgb = yuyv_to_rgb(&[255, 128, 255, 128], 4, 1);
        assert_eq!(rgb.len(), 12);
        assert_eq!(&rgb[6..], &[0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_pack_rgb_rows_strips_padding() {
        // 1x2 image with 4 bytes of row padding
        let data = [1, 2, 3, 0, 4, 5, 6, 0];
        let packed = pack_rgb_rows(&data, 1, 2, 4).unwrap();
        assert_eq!(packed, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_pack_rgb_rows_rejects_short_data() {
        assert!(pack_rgb_rows(&[1, 2, 3], 1, 2, 3).is_none());
    }

    #[test]
    fn test_mjpeg_garbage_is_read_failure() {
        assert!(matches!(
            mjpeg_to_frame(&[0, 1, 2, 3]),
            Err(BackendError::ReadFailed(_))
        ));
    }
}
