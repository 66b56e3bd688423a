// SPDX-License-Identifier: MPL-2.0

//! Error types for the camera relay
//!
//! Device errors live next to the backends as [`BackendError`]; everything
//! else is defined here and folds into [`AppError`].

use crate::backends::camera::BackendError;
use std::fmt;
use std::path::PathBuf;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type for recording operations
pub type RecordingResult<T> = Result<T, RecordingError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Capture device errors
    Camera(BackendError),
    /// Recording-related errors
    Recording(RecordingError),
    /// Frame transform errors
    Transform(TransformError),
    /// Still capture errors
    Still(StillError),
    /// Configuration errors
    Config(String),
    /// A control action name that is not recognised
    UnknownAction(String),
}

/// Recording-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingError {
    /// A recording session is already active
    AlreadyRecording,
    /// The output file or encoder could not be opened
    SinkOpenFailed { path: PathBuf, reason: String },
    /// A single frame could not be encoded
    EncodeFailed(String),
    /// The worker thread could not be spawned
    WorkerFailed(String),
}

/// Frame transform errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// Source or target has a zero dimension
    EmptyFrame,
    /// The face detector itself failed
    DetectorFailed(String),
}

/// Still capture errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StillError {
    /// Could not create the output directory or write the file
    SaveFailed(String),
    /// Image encoding failed
    EncodingFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Recording(e) => write!(f, "Recording error: {}", e),
            AppError::Transform(e) => write!(f, "Transform error: {}", e),
            AppError::Still(e) => write!(f, "Still capture error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::UnknownAction(name) => write!(f, "Unknown action: {}", name),
        }
    }
}

impl fmt::Display for RecordingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingError::AlreadyRecording => write!(f, "Recording already in progress"),
            RecordingError::SinkOpenFailed { path, reason } => {
                write!(f, "Failed to open {}: {}", path.display(), reason)
            }
            RecordingError::EncodeFailed(msg) => write!(f, "Encoding failed: {}", msg),
            RecordingError::WorkerFailed(msg) => write!(f, "Recording worker failed: {}", msg),
        }
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::EmptyFrame => write!(f, "Frame has a zero dimension"),
            TransformError::DetectorFailed(msg) => write!(f, "Face detector failed: {}", msg),
        }
    }
}

impl fmt::Display for StillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StillError::SaveFailed(msg) => write!(f, "Save failed: {}", msg),
            StillError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for RecordingError {}
impl std::error::Error for TransformError {}
impl std::error::Error for StillError {}

// Conversions from sub-errors to AppError
impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Camera(err)
    }
}

impl From<RecordingError> for AppError {
    fn from(err: RecordingError) -> Self {
        AppError::Recording(err)
    }
}

impl From<TransformError> for AppError {
    fn from(err: TransformError) -> Self {
        AppError::Transform(err)
    }
}

impl From<StillError> for AppError {
    fn from(err: StillError) -> Self {
        AppError::Still(err)
    }
}

impl From<std::io::Error> for StillError {
    fn from(err: std::io::Error) -> Self {
        StillError::SaveFailed(err.to_string())
    }
}

impl From<image::ImageError> for StillError {
    fn from(err: image::ImageError) -> Self {
        StillError::EncodingFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_nests_source() {
        let err: AppError = RecordingError::AlreadyRecording.into();
        assert_eq!(
            err.to_string(),
            "Recording error: Recording already in progress"
        );
    }

    #[test]
    fn test_sink_open_failed_names_path() {
        let err = RecordingError::SinkOpenFailed {
            path: PathBuf::from("out/vid.avi"),
            reason: "no encoder".into(),
        };
        assert_eq!(err.to_string(), "Failed to open out/vid.avi: no encoder");
    }

    #[test]
    fn test_sub_errors_fold_into_app_error() {
        assert!(matches!(
            AppError::from(BackendError::Disconnected),
            AppError::Camera(BackendError::Disconnected)
        ));
        assert!(matches!(
            AppError::from(TransformError::EmptyFrame),
            AppError::Transform(TransformError::EmptyFrame)
        ));

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let still: AppError = StillError::from(io).into();
        assert!(matches!(still, AppError::Still(StillError::SaveFailed(_))));
    }
}
