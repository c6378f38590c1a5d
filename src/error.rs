//! Error types for socialqr operations

use thiserror::Error;

/// Result type alias using socialqr's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for socialqr operations
#[derive(Error, Debug)]
pub enum Error {
    /// A required wizard field was empty or a transition was not allowed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Platform name is not part of the registry
    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    /// Camera access was refused by the operating system
    #[error("Camera access denied: {0}")]
    CameraDenied(String),

    /// Camera-related errors
    #[error("Camera error: {0}")]
    Camera(String),

    /// Camera device not found
    #[error("Camera device not found: {0}")]
    CameraNotFound(String),

    /// Failed to capture frame from camera
    #[error("Frame capture failed: {0}")]
    FrameCapture(String),

    /// QR code decoding failed
    #[error("Failed to decode QR code: {0}")]
    QrDecode(String),

    /// No QR code found in frame
    #[error("No QR code found in the image")]
    NoQrCodeFound,

    /// QR code encoding failed
    #[error("Failed to encode QR code: {0}")]
    QrEncode(String),

    /// Vector image could not be loaded or rasterized
    #[error("Failed to load QR code image: {0}")]
    RenderLoad(String),

    /// No installed font can draw the caption text
    #[error("No font available for captions: {0}")]
    CaptionFont(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image processing error
    #[error("Image processing error: {0}")]
    Image(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Other(format!("JSON error: {}", e))
    }
}

impl From<qrcode::types::QrError> for Error {
    fn from(e: qrcode::types::QrError) -> Self {
        Error::QrEncode(e.to_string())
    }
}
