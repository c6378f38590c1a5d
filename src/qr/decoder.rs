//! QR code decoder using rqrr

use crate::error::{Error, Result};
use crate::qr::{FrameDecoder, QrPayload};
use image::{DynamicImage, GrayImage, Luma};

/// QR code decoder
pub struct QrDecoder {}

impl QrDecoder {
    /// Create a new QR decoder with default settings
    pub fn new() -> Self {
        Self {}
    }

    /// Decode a QR code from an image
    pub fn decode(&self, img: &DynamicImage) -> Result<QrPayload> {
        match img {
            DynamicImage::ImageLuma8(gray) => self.decode_gray(gray),
            other => self.decode_gray(&flatten_over_white(&other.to_rgba8())),
        }
    }

    /// Decode a QR code from raw RGBA8 pixels
    pub fn decode_rgba(&self, pixels: &[u8], width: u32, height: u32) -> Result<QrPayload> {
        let rgba = image::RgbaImage::from_raw(width, height, pixels.to_vec()).ok_or_else(|| {
            Error::Image(format!(
                "pixel buffer of {} bytes does not match {width}x{height} RGBA",
                pixels.len()
            ))
        })?;
        self.decode_gray(&flatten_over_white(&rgba))
    }

    /// Decode a QR code from a grayscale image
    pub fn decode_gray(&self, img: &GrayImage) -> Result<QrPayload> {
        let mut prepared = rqrr::PreparedImage::prepare(img.clone());

        let grids = prepared.detect_grids();

        if grids.is_empty() {
            return Err(Error::NoQrCodeFound);
        }

        // Noise can produce spurious grids; keep the first one that decodes
        let mut last_error = None;
        for grid in &grids {
            match grid.decode() {
                Ok((meta, content)) => {
                    tracing::debug!(
                        "Decoded QR: version={:?}, ecc_level={:?}, length={}",
                        meta.version,
                        meta.ecc_level,
                        content.len()
                    );
                    return Ok(QrPayload::from_bytes(content.into_bytes()));
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(Error::QrDecode(format!("Decode failed: {:?}", last_error)))
    }
}

impl Default for QrDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder for QrDecoder {
    fn decode_frame(&self, pixels: &[u8], width: u32, height: u32) -> Option<String> {
        match self.decode_rgba(pixels, width, height) {
            Ok(payload) => payload.text,
            Err(Error::NoQrCodeFound) => None,
            Err(err) => {
                tracing::trace!("Frame not decoded: {err}");
                None
            }
        }
    }
}

/// Convert to luma, compositing transparent pixels over white so light
/// modules of a transparent QR code stay light.
fn flatten_over_white(rgba: &image::RgbaImage) -> GrayImage {
    GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let luma = (299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000;
        let alpha = a as u32;
        Luma([((luma * alpha + 255 * (255 - alpha)) / 255) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_buffer_not_found() {
        let decoder = QrDecoder::new();
        let pixels = vec![255u8; 64 * 64 * 4];
        assert!(matches!(
            decoder.decode_rgba(&pixels, 64, 64),
            Err(Error::NoQrCodeFound)
        ));
        assert_eq!(decoder.decode_frame(&pixels, 64, 64), None);
    }

    #[test]
    fn test_noise_buffer_not_found() {
        let decoder = QrDecoder::new();
        let mut state: u32 = 0x9E37_79B9;
        let pixels: Vec<u8> = (0..96 * 96)
            .flat_map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                let v = (state >> 24) as u8;
                [v, v.wrapping_mul(7), v.wrapping_add(91), 255]
            })
            .collect();

        assert!(matches!(
            decoder.decode_rgba(&pixels, 96, 96),
            Err(Error::NoQrCodeFound | Error::QrDecode(_))
        ));
        assert_eq!(decoder.decode_frame(&pixels, 96, 96), None);
    }

    #[test]
    fn test_mismatched_buffer_is_error() {
        let decoder = QrDecoder::new();
        assert!(matches!(
            decoder.decode_rgba(&[0u8; 10], 64, 64),
            Err(Error::Image(_))
        ));
        assert_eq!(decoder.decode_frame(&[0u8; 10], 64, 64), None);
    }

    #[test]
    fn test_transparent_pixels_flatten_to_white() {
        let rgba = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 0, 0]));
        let gray = flatten_over_white(&rgba);
        assert!(gray.pixels().all(|p| p.0[0] == 255));

        let rgba = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 0, 255]));
        let gray = flatten_over_white(&rgba);
        assert!(gray.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_decode_rgba_hello() {
        let encoder = crate::qr::QrEncoder::new();
        let decoder = QrDecoder::new();
        let rgba = encoder.render_raster("hello", 300).unwrap().to_rgba8();
        let text = decoder.decode_frame(rgba.as_raw(), rgba.width(), rgba.height());
        assert_eq!(text.as_deref(), Some("hello"));
    }
}
