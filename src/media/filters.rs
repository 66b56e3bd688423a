// SPDX-License-Identifier: MPL-2.0

//! Pure frame transforms
//!
//! Every function takes a frame by reference and returns a new one; none of
//! them touch shared state, so any consumer thread may call them freely.

use crate::backends::camera::Frame;
use crate::errors::TransformError;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

/// BT.601 luma weights, matching common greyscale conversions
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// Greyscale, replicated back to three channels so the layout never changes
pub fn to_grey(frame: &Frame) -> Frame {
    let mut out = frame.image().clone();
    for pixel in out.pixels_mut() {
        let [r, g, b] = pixel.0;
        let y = (LUMA_R * r as f32 + LUMA_G * g as f32 + LUMA_B * b as f32)
            .round()
            .clamp(0.0, 255.0) as u8;
        *pixel = Rgb([y, y, y]);
    }
    frame.with_image(out)
}

/// Per-channel bitwise negation
pub fn negative(frame: &Frame) -> Frame {
    let mut out = frame.image().clone();
    for value in out.iter_mut() {
        *value = !*value;
    }
    frame.with_image(out)
}

/// Horizontal flip (selfie view)
pub fn mirror(frame: &Frame) -> Frame {
    frame.with_image(imageops::flip_horizontal(frame.image()))
}

/// Scale to exactly `width` x `height`, ignoring aspect ratio
pub fn resize(frame: &Frame, width: u32, height: u32) -> Result<Frame, TransformError> {
    if frame.is_empty() || width == 0 || height == 0 {
        return Err(TransformError::EmptyFrame);
    }
    if frame.size() == (width, height) {
        return Ok(frame.clone());
    }
    Ok(frame.with_image(imageops::resize(
        frame.image(),
        width,
        height,
        FilterType::Triangle,
    )))
}

/// Fit inside `width` x `height` keeping aspect ratio, centered on black
///
/// An empty source yields an all-black canvas of the target size.
pub fn letterbox(frame: &Frame, width: u32, height: u32) -> Result<Frame, TransformError> {
    if width == 0 || height == 0 {
        return Err(TransformError::EmptyFrame);
    }

    let mut canvas = RgbImage::new(width, height);
    if frame.is_empty() {
        return Ok(frame.with_image(canvas));
    }

    let (src_w, src_h) = frame.size();
    let scale = f64::min(width as f64 / src_w as f64, height as f64 / src_h as f64);
    let new_w = ((src_w as f64 * scale) as u32).clamp(1, width);
    let new_h = ((src_h as f64 * scale) as u32).clamp(1, height);

    let scaled = imageops::resize(frame.image(), new_w, new_h, FilterType::Triangle);
    let x0 = (width - new_w) / 2;
    let y0 = (height - new_h) / 2;
    imageops::replace(&mut canvas, &scaled, x0 as i64, y0 as i64);

    Ok(frame.with_image(canvas))
}

/// Copy out the region `[x0, x1) x [y0, y1)`, clamped to the frame
///
/// Returns `None` when the clamped region is empty.
pub fn crop(frame: &Frame, x0: i64, y0: i64, x1: i64, y1: i64) -> Option<Frame> {
    let (w, h) = frame.size();
    let x0 = x0.clamp(0, w as i64) as u32;
    let y0 = y0.clamp(0, h as i64) as u32;
    let x1 = x1.clamp(0, w as i64) as u32;
    let y1 = y1.clamp(0, h as i64) as u32;
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    let region = imageops::crop_imm(frame.image(), x0, y0, x1 - x0, y1 - y0).to_image();
    Some(frame.with_image(region))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> Frame {
        Frame::new(RgbImage::from_fn(w, h, |x, y| {
            Rgb([(x * 10) as u8, (y * 10) as u8, 7])
        }))
    }

    #[test]
    fn test_negative_twice_is_identity() {
        let frame = gradient(6, 4);
        assert_eq!(negative(&negative(&frame)), frame);
        assert_eq!(negative(&frame).image().get_pixel(0, 0).0, [255, 255, 248]);
    }

    #[test]
    fn test_grey_is_three_equal_channels() {
        let grey = to_grey(&Frame::solid(2, 2, [255, 0, 0]));
        assert_eq!(grey.channels(), 3);
        assert_eq!(grey.image().get_pixel(1, 1).0, [76, 76, 76]);
    }

    #[test]
    fn test_mirror_swaps_columns() {
        let frame = gradient(3, 1);
        let mirrored = mirror(&frame);
        assert_eq!(mirrored.image().get_pixel(0, 0), frame.image().get_pixel(2, 0));
        assert_eq!(mirror(&mirrored), frame);
    }

    #[test]
    fn test_resize_rejects_empty() {
        assert_eq!(
            resize(&Frame::solid(0, 4, [0, 0, 0]), 4, 4),
            Err(TransformError::EmptyFrame)
        );
        assert_eq!(
            resize(&gradient(4, 4), 0, 4),
            Err(TransformError::EmptyFrame)
        );
        assert_eq!(resize(&gradient(8, 4), 4, 2).unwrap().size(), (4, 2));
    }

    #[test]
    fn test_letterbox_centers_and_pads() {
        // 4x2 white into 4x4: scaled stays 4x2, rows 1..3 filled
        let out = letterbox(&Frame::solid(4, 2, [255, 255, 255]), 4, 4).unwrap();
        assert_eq!(out.size(), (4, 4));
        assert_eq!(out.image().get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(out.image().get_pixel(0, 1).0, [255, 255, 255]);
        assert_eq!(out.image().get_pixel(3, 2).0, [255, 255, 255]);
        assert_eq!(out.image().get_pixel(3, 3).0, [0, 0, 0]);
    }

    #[test]
    fn test_letterbox_empty_source_is_black_canvas() {
        let out = letterbox(&Frame::solid(0, 0, [9, 9, 9]), 3, 2).unwrap();
        assert_eq!(out.size(), (3, 2));
        assert!(out.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_crop_clamps_to_bounds() {
        let frame = gradient(10, 10);
        let roi = crop(&frame, -5, 2, 4, 50).unwrap();
        assert_eq!(roi.size(), (4, 8));
        assert!(crop(&frame, 12, 0, 20, 5).is_none());
    }
}
