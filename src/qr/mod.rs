//! QR code rendering and decoding
//!
//! Rendering produces an SVG [`VectorImage`] through the `qrcode` crate;
//! decoding runs `rqrr` over raster pixel buffers. Both are thin wrappers:
//! the QR algorithms themselves live in those crates.

mod decoder;
mod encoder;

pub use decoder::QrDecoder;
pub use encoder::QrEncoder;

use serde::{Deserialize, Serialize};

/// A decoded QR code payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    /// The raw decoded data
    pub data: Vec<u8>,
    /// String representation if valid UTF-8
    pub text: Option<String>,
}

impl QrPayload {
    /// Create a new QR payload from raw bytes
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let text = String::from_utf8(data.clone()).ok();
        Self { data, text }
    }

    /// Get the payload as a string, if valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Background fill of a rendered QR code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    /// Opaque white light modules
    #[default]
    White,
    /// Light modules left unpainted
    Transparent,
}

impl Background {
    /// Pick the background for a "transparent" toggle
    pub fn from_transparent(transparent: bool) -> Self {
        if transparent {
            Self::Transparent
        } else {
            Self::White
        }
    }

    /// Whether the light modules are left transparent
    pub fn is_transparent(self) -> bool {
        matches!(self, Self::Transparent)
    }

    pub(crate) fn svg_fill(self) -> &'static str {
        match self {
            Self::White => "#ffffff",
            Self::Transparent => "none",
        }
    }
}

/// A rendered QR code kept in vector form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorImage {
    svg: String,
    size: u32,
    background: Background,
}

impl VectorImage {
    /// Wrap SVG markup meant to be displayed at `size × size` pixels
    pub fn from_svg(svg: impl Into<String>, size: u32, background: Background) -> Self {
        Self {
            svg: svg.into(),
            size,
            background,
        }
    }

    /// SVG markup
    pub fn as_svg(&self) -> &str {
        &self.svg
    }

    /// Display size in pixels (the image is square)
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Background the image was rendered with
    pub fn background(&self) -> Background {
        self.background
    }
}

/// Anything able to turn an RGBA8 pixel buffer into decoded text.
///
/// The capture loop only depends on this trait, so it can be driven by the
/// `rqrr`-backed [`QrDecoder`] or by a test double.
pub trait FrameDecoder: Send + Sync {
    /// Try to decode a QR code from `width × height` RGBA8 pixels.
    /// Returns `None` when no code could be read.
    fn decode_frame(&self, pixels: &[u8], width: u32, height: u32) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_payload_from_bytes() {
        let payload = QrPayload::from_bytes(b"hello world".to_vec());
        assert_eq!(payload.as_str(), Some("hello world"));

        let payload = QrPayload::from_bytes(vec![0xFF, 0xFE]);
        assert!(payload.as_str().is_none());
        assert_eq!(payload.as_bytes(), &[0xFF, 0xFE]);
    }

    #[test]
    fn test_background_from_toggle() {
        assert_eq!(Background::from_transparent(false), Background::White);
        assert!(Background::from_transparent(true).is_transparent());
        assert_eq!(Background::Transparent.svg_fill(), "none");
    }
}
