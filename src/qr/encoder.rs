//! QR code renderer

use crate::error::{Error, Result};
use crate::qr::{Background, VectorImage};
use image::{DynamicImage, Luma};
use qrcode::QrCode;
use qrcode::render::svg;

/// QR code renderer producing SVG images
pub struct QrEncoder {
    /// Error correction level
    ecc_level: qrcode::EcLevel,
}

impl QrEncoder {
    /// Create a new QR encoder with default settings (Medium ECC)
    pub fn new() -> Self {
        Self {
            ecc_level: qrcode::EcLevel::M,
        }
    }

    /// Create a new QR encoder with a specific error correction level
    pub fn with_ecc_level(ecc_level: qrcode::EcLevel) -> Self {
        Self { ecc_level }
    }

    fn code(&self, payload: &str) -> Result<QrCode> {
        if payload.is_empty() {
            return Err(Error::QrEncode("payload is empty".to_string()));
        }
        Ok(QrCode::with_error_correction_level(
            payload.as_bytes(),
            self.ecc_level,
        )?)
    }

    /// Render `payload` as an SVG QR code displayed at `size × size` pixels
    pub fn render(&self, payload: &str, size: u32, background: Background) -> Result<VectorImage> {
        let code = self.code(payload)?;

        let markup = code
            .render::<svg::Color>()
            .min_dimensions(size, size)
            .dark_color(svg::Color("#000000"))
            .light_color(svg::Color(background.svg_fill()))
            .build();

        tracing::debug!(
            version = ?code.version(),
            modules = code.width(),
            size,
            ?background,
            "Rendered QR code"
        );

        Ok(VectorImage::from_svg(markup, size, background))
    }

    /// Render `payload` straight to a grayscale raster of at least `min_size` pixels
    pub fn render_raster(&self, payload: &str, min_size: u32) -> Result<DynamicImage> {
        let code = self.code(payload)?;

        let image = code
            .render::<Luma<u8>>()
            .min_dimensions(min_size, min_size)
            .build();

        Ok(DynamicImage::ImageLuma8(image))
    }
}

impl Default for QrEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_svg() {
        let encoder = QrEncoder::new();
        let image = encoder
            .render("https://www.instagram.com/alice/", 200, Background::White)
            .unwrap();
        assert_eq!(image.size(), 200);
        assert!(image.as_svg().contains("<svg"));
        assert!(image.as_svg().contains("#000000"));
        assert!(image.as_svg().contains("#ffffff"));
    }

    #[test]
    fn test_render_transparent_leaves_background_unpainted() {
        let encoder = QrEncoder::new();
        let image = encoder
            .render("https://example.com/x", 300, Background::Transparent)
            .unwrap();
        assert!(image.background().is_transparent());
        assert!(!image.as_svg().contains("#ffffff"));
    }

    #[test]
    fn test_empty_payload_rejected() {
        let encoder = QrEncoder::new();
        assert!(matches!(
            encoder.render("", 200, Background::White),
            Err(Error::QrEncode(_))
        ));
    }

    #[test]
    fn test_render_raster_round_trip() {
        use crate::qr::QrDecoder;

        let encoder = QrEncoder::new();
        let decoder = QrDecoder::new();

        let original = "Test payload for round trip";
        let qr_image = encoder.render_raster(original, 400).unwrap();
        let decoded = decoder.decode(&qr_image).unwrap();

        assert_eq!(decoded.as_str(), Some(original));
    }
}
