// SPDX-License-Identifier: MPL-2.0

//! Face-only cropping
//!
//! Detection is a pluggable capability: a [`FaceDetector`] returns candidate
//! boxes in normalised coordinates and [`crop_to_face`] picks the most
//! confident one and cuts it out. No detection engine is bundled; the
//! default [`DisabledFaceDetector`] always fails, which makes the streaming
//! loop fall back to letterboxing the unmodified frame.

use super::filters::crop;
use crate::backends::camera::Frame;
use crate::errors::TransformError;

/// A candidate face box
///
/// Coordinates are fractions of the frame size in `[0, 1]`; values outside
/// that range are clamped when cropping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceDetection {
    pub confidence: f32,
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

/// Something that can find faces in a frame
pub trait FaceDetector: Send + Sync {
    fn detect(&self, frame: &Frame) -> Result<Vec<FaceDetection>, TransformError>;
}

/// Detector used when no model is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledFaceDetector;

impl FaceDetector for DisabledFaceDetector {
    fn detect(&self, _frame: &Frame) -> Result<Vec<FaceDetection>, TransformError> {
        Err(TransformError::DetectorFailed(
            "no face detection model configured".into(),
        ))
    }
}

/// Crop `frame` to its most confident face
///
/// Returns the frame unchanged when there are no detections, when the best
/// one is below `min_confidence`, or when its clamped box is empty. Only a
/// detector failure is reported as an error.
pub fn crop_to_face(
    detector: &dyn FaceDetector,
    frame: &Frame,
    min_confidence: f32,
) -> Result<Frame, TransformError> {
    let detections = detector.detect(frame)?;

    let Some(best) = detections
        .iter()
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
    else {
        return Ok(frame.clone());
    };
    if best.confidence < min_confidence {
        return Ok(frame.clone());
    }

    let (w, h) = (frame.width() as f32, frame.height() as f32);
    let roi = crop(
        frame,
        (best.x_min * w) as i64,
        (best.y_min * h) as i64,
        (best.x_max * w) as i64,
        (best.y_max * h) as i64,
    );

    Ok(roi.unwrap_or_else(|| frame.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<FaceDetection>);

    impl FaceDetector for Fixed {
        fn detect(&self, _: &Frame) -> Result<Vec<FaceDetection>, TransformError> {
            Ok(self.0.clone())
        }
    }

    fn det(confidence: f32, x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> FaceDetection {
        FaceDetection {
            confidence,
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    #[test]
    fn test_picks_most_confident() {
        let frame = Frame::solid(100, 50, [1, 2, 3]);
        let detector = Fixed(vec![
            det(0.6, 0.0, 0.0, 0.1, 0.1),
            det(0.9, 0.5, 0.5, 1.0, 1.0),
        ]);
        let out = crop_to_face(&detector, &frame, 0.5).unwrap();
        assert_eq!(out.size(), (50, 25));
    }

    #[test]
    fn test_low_confidence_returns_original() {
        let frame = Frame::solid(10, 10, [1, 2, 3]);
        let detector = Fixed(vec![det(0.4, 0.0, 0.0, 0.5, 0.5)]);
        assert_eq!(crop_to_face(&detector, &frame, 0.5).unwrap().size(), (10, 10));
    }

    #[test]
    fn test_no_detections_or_empty_box_returns_original() {
        let frame = Frame::solid(10, 10, [1, 2, 3]);
        assert_eq!(
            crop_to_face(&Fixed(vec![]), &frame, 0.5).unwrap().size(),
            (10, 10)
        );
        let outside = Fixed(vec![det(0.9, 1.2, 1.2, 1.5, 1.5)]);
        assert_eq!(crop_to_face(&outside, &frame, 0.5).unwrap().size(), (10, 10));
    }

    #[test]
    fn test_disabled_detector_fails() {
        let frame = Frame::solid(4, 4, [0, 0, 0]);
        assert!(crop_to_face(&DisabledFaceDetector, &frame, 0.5).is_err());
    }
}
