//! Single-attempt scan of a still image

use crate::error::Result;
use crate::qr::{FrameDecoder, VectorImage};
use crate::raster;
use crate::scan::ScanOutcome;
use std::path::Path;
use std::time::Duration;

/// Rasterize `image` once and try to decode it
pub fn scan_image(image: &VectorImage, decoder: &dyn FrameDecoder) -> Result<ScanOutcome> {
    let rgba = raster::rasterize(image)?;
    Ok(decode_once(&rgba, decoder))
}

/// Same as [`scan_image`] but reports only after `delay`, giving the user
/// time to see the scanning overlay
pub async fn scan_image_paced(
    image: &VectorImage,
    decoder: &dyn FrameDecoder,
    delay: Duration,
) -> Result<ScanOutcome> {
    let outcome = scan_image(image, decoder)?;
    tokio::time::sleep(delay).await;
    Ok(outcome)
}

/// Decode a raster image file (PNG, JPEG, ...) from disk
pub fn scan_file(path: &Path, decoder: &dyn FrameDecoder) -> Result<ScanOutcome> {
    let rgba = image::open(path)?.to_rgba8();
    tracing::debug!(path = %path.display(), width = rgba.width(), height = rgba.height(), "Loaded image");
    Ok(decode_once(&rgba, decoder))
}

fn decode_once(rgba: &image::RgbaImage, decoder: &dyn FrameDecoder) -> ScanOutcome {
    match decoder.decode_frame(rgba.as_raw(), rgba.width(), rgba.height()) {
        Some(text) => ScanOutcome::Decoded { text },
        None => ScanOutcome::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::qr::{Background, QrDecoder, QrEncoder};

    #[test]
    fn test_scan_rendered_image() {
        let image = QrEncoder::new()
            .render("hello", 200, Background::White)
            .unwrap();
        let outcome = scan_image(&image, &QrDecoder::new()).unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::Decoded {
                text: "hello".to_string()
            }
        );
    }

    #[test]
    fn test_scan_transparent_image() {
        let image = QrEncoder::new()
            .render("https://www.youtube.com/c/alice", 300, Background::Transparent)
            .unwrap();
        let outcome = scan_image(&image, &QrDecoder::new()).unwrap();
        assert_eq!(outcome.text(), Some("https://www.youtube.com/c/alice"));
    }

    #[test]
    fn test_blank_image_not_found() {
        let blank = VectorImage::from_svg(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100"><rect width="100" height="100" fill="#ffffff"/></svg>"##,
            100,
            Background::White,
        );
        assert_eq!(
            scan_image(&blank, &QrDecoder::new()).unwrap(),
            ScanOutcome::NotFound
        );
    }

    #[test]
    fn test_unloadable_image_is_error() {
        let broken = VectorImage::from_svg("garbage", 100, Background::White);
        assert!(matches!(
            scan_image(&broken, &QrDecoder::new()),
            Err(Error::RenderLoad(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_paced_scan_waits() {
        let image = QrEncoder::new()
            .render("hello", 200, Background::White)
            .unwrap();
        let started = tokio::time::Instant::now();
        let outcome = scan_image_paced(&image, &QrDecoder::new(), Duration::from_millis(2000))
            .await
            .unwrap();
        assert_eq!(outcome.text(), Some("hello"));
        assert!(started.elapsed() >= Duration::from_millis(2000));
    }

    #[test]
    fn test_scan_file() {
        let path = std::env::temp_dir().join("socialqr-scan-file-test.png");
        QrEncoder::new()
            .render_raster("https://twitter.com/alice", 300)
            .unwrap()
            .save(&path)
            .unwrap();
        let outcome = scan_file(&path, &QrDecoder::new());
        let _ = std::fs::remove_file(&path);
        assert_eq!(outcome.unwrap().text(), Some("https://twitter.com/alice"));
    }

    #[test]
    fn test_noise_file_not_found() {
        let noise = image::RgbaImage::from_fn(120, 120, |x, y| {
            let v = (x.wrapping_mul(2_654_435_761) ^ y.wrapping_mul(40_503)).rotate_left(x % 13) as u8;
            image::Rgba([v, v, v, 255])
        });
        let path = std::env::temp_dir().join("socialqr-scan-noise-test.png");
        noise.save(&path).unwrap();

        let outcome = scan_file(&path, &QrDecoder::new()).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(outcome, ScanOutcome::NotFound);
    }
}
