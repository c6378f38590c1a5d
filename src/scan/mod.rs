//! Capture loops feeding frames to the QR decoder
//!
//! Two variants exist: [`ScanSession`] samples a live camera until a code is
//! decoded or the scan is stopped, and [`scan_image`] decodes an already
//! rendered QR image exactly once.

mod session;
mod source;
mod still;

pub use session::{DecodedCallback, ScanHandle, ScanSession};
pub use source::{CameraSource, CapturedFrame, StreamGuard, VideoStream};
pub use still::{scan_file, scan_image, scan_image_paced};

use crate::platform::{self, PlatformEntry};
use serde::Serialize;

/// Result of a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// A QR code was read
    Decoded {
        /// Decoded payload
        text: String,
    },
    /// The image held no readable QR code
    NotFound,
    /// Camera permission was refused before any frame was captured
    CameraDenied,
    /// The scan was stopped before anything was decoded
    Cancelled,
}

impl ScanOutcome {
    /// Decoded text, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Decoded { text } => Some(text),
            _ => None,
        }
    }

    /// Platform whose profile the decoded link points at
    pub fn platform(&self) -> Option<&'static PlatformEntry> {
        self.text().and_then(platform::identify)
    }

    /// User-facing alert text for outcomes that did not produce a result
    pub fn alert(&self) -> Option<&'static str> {
        match self {
            Self::Decoded { .. } | Self::Cancelled => None,
            Self::NotFound => Some("No QR code found in the image"),
            Self::CameraDenied => {
                Some("Camera access denied. Please enable camera permissions and try again.")
            }
        }
    }
}
