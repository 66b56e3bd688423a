// SPDX-License-Identifier: MPL-2.0

//! Minimal bitmap text rendering
//!
//! Placeholder frames and the recording overlay only need a few short
//! uppercase labels, so a built-in 5x7 font is enough. Lowercase input is
//! drawn as uppercase and unsupported characters as blanks.

use crate::backends::camera::Frame;
use image::{Rgb, RgbImage};

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
/// Blank columns between glyphs
const GLYPH_SPACING: u32 = 1;

/// Text color on placeholders
pub const WHITE: [u8; 3] = [255, 255, 255];
/// Recording overlay color
pub const RED: [u8; 3] = [255, 0, 0];

/// Rows of a glyph, top to bottom; bit 4 is the leftmost column
fn glyph(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        _ => [0; 7],
    }
}

/// Pixel width of `text` at `scale`
pub fn text_width(text: &str, scale: u32) -> u32 {
    let chars = text.chars().count() as u32;
    if chars == 0 {
        return 0;
    }
    (chars * (GLYPH_WIDTH + GLYPH_SPACING) - GLYPH_SPACING) * scale
}

/// Draw `text` with its top-left corner at `(x, y)`, clipped to the image
pub fn draw_text(image: &mut RgbImage, text: &str, x: u32, y: u32, scale: u32, color: [u8; 3]) {
    let scale = scale.max(1);
    let (w, h) = image.dimensions();

    for (i, c) in text.chars().enumerate() {
        let gx = x + i as u32 * (GLYPH_WIDTH + GLYPH_SPACING) * scale;
        if gx >= w {
            break;
        }
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (0x10 >> col) == 0 {
                    continue;
                }
                let px = gx + col * scale;
                let py = y + row as u32 * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        let (cx, cy) = (px + dx, py + dy);
                        if cx < w && cy < h {
                            image.put_pixel(cx, cy, Rgb(color));
                        }
                    }
                }
            }
        }
    }
}

/// Largest integer scale (at most 3) at which `text` fits `width` with margins
fn fitting_scale(text: &str, width: u32, margin: u32) -> u32 {
    (1..=3)
        .rev()
        .find(|&s| text_width(text, s) + 2 * margin <= width)
        .unwrap_or(1)
}

/// Black frame of `width` x `height` with a white label near the top-left
pub fn placeholder(width: u32, height: u32, text: &str) -> Frame {
    let mut image = RgbImage::new(width, height);
    let margin = 20;
    let scale = fitting_scale(text, width, margin);
    draw_text(&mut image, text, margin, margin, scale, WHITE);
    Frame::new(image)
}

/// Copy of `frame` with a label drawn near the top-left
pub fn overlay_text(frame: &Frame, text: &str, color: [u8; 3]) -> Frame {
    let mut image = frame.image().clone();
    let margin = 10;
    let scale = fitting_scale(text, frame.width(), margin);
    draw_text(&mut image, text, margin, margin, scale, color);
    frame.with_image(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_width() {
        assert_eq!(text_width("", 2), 0);
        assert_eq!(text_width("A", 1), 5);
        assert_eq!(text_width("AB", 2), 22);
    }

    #[test]
    fn test_placeholder_has_label_pixels() {
        let frame = placeholder(320, 240, "STREAM PAUSED");
        assert_eq!(frame.size(), (320, 240));
        assert!(frame.as_bytes().iter().any(|&b| b == 255));
        // bottom-right corner stays black
        assert_eq!(frame.image().get_pixel(319, 239).0, [0, 0, 0]);
    }

    #[test]
    fn test_draw_text_clips_on_tiny_image() {
        let mut image = RgbImage::new(3, 3);
        draw_text(&mut image, "CAMERA NOT AVAILABLE", 0, 0, 3, WHITE);
        assert_eq!(image.dimensions(), (3, 3));
    }

    #[test]
    fn test_overlay_leaves_source_untouched() {
        let frame = Frame::solid(200, 100, [0, 0, 0]);
        let overlaid = overlay_text(&frame, "RECORDING...", RED);
        assert!(frame.as_bytes().iter().all(|&b| b == 0));
        assert!(overlaid.image().pixels().any(|p| p.0 == RED));
    }
}
