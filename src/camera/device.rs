//! Camera device implementation

use crate::camera::{self, CameraConfig, PixelFormat};
use crate::config::Facing;
use crate::error::{Error, Result};
use crate::scan::{CameraSource, CapturedFrame, VideoStream};
use async_trait::async_trait;
use image::{DynamicImage, ImageBuffer};
use serde::{Deserialize, Serialize};
use std::io;
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

/// Mapped buffers kept in flight by the driver
const STREAM_BUFFERS: u32 = 4;

/// Information about a camera device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraDevice {
    /// Device index (e.g., 0 for /dev/video0)
    pub index: usize,
    /// Device path (e.g., "/dev/video0")
    pub path: String,
    /// Device name as reported by the driver
    pub name: String,
    /// Driver name
    pub driver: String,
    /// Bus information
    pub bus_info: String,
}

/// Camera source handing out at most one live stream at a time
pub struct V4l2Camera {
    config: CameraConfig,
    in_use: Arc<AtomicBool>,
}

impl V4l2Camera {
    /// Create a source for the configured device. Nothing is opened until a
    /// stream is acquired.
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            in_use: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Camera configuration
    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    fn open(&self) -> Result<CameraStream> {
        let config = &self.config;
        let info = camera::resolve(&config.device)?;

        tracing::info!("Opening camera: {} at {}", info.name, info.path);

        let dev = Device::new(info.index).map_err(|e| device_error(&info, e))?;

        let mut fmt = dev
            .format()
            .map_err(|e| Error::Camera(format!("Failed to get format: {}", e)))?;

        fmt.width = config.width;
        fmt.height = config.height;
        fmt.fourcc = config.format.fourcc();

        let fmt = dev
            .set_format(&fmt)
            .map_err(|e| Error::Camera(format!("Failed to set format: {}", e)))?;

        let mut params = dev
            .params()
            .map_err(|e| Error::Camera(format!("Failed to get params: {}", e)))?;

        params.interval = v4l::Fraction::new(1, config.fps.max(1));

        dev.set_params(&params)
            .map_err(|e| Error::Camera(format!("Failed to set params: {}", e)))?;

        tracing::info!(
            "Camera configured: {}x{} @ {} fps ({})",
            fmt.width,
            fmt.height,
            config.fps,
            String::from_utf8_lossy(&fmt.fourcc.repr)
        );

        // SAFETY: the boxed device outlives the mmap stream; both live in
        // StreamInner, which declares the stream first so it is dropped first.
        let device = Box::new(dev);
        let static_device: &'static Device =
            unsafe { mem::transmute::<&Device, &'static Device>(device.as_ref()) };

        let stream =
            MmapStream::with_buffers(static_device, Type::VideoCapture, STREAM_BUFFERS)
                .map_err(|e| Error::FrameCapture(format!("Failed to create stream: {}", e)))?;

        Ok(CameraStream {
            inner: Some(StreamInner {
                stream,
                _device: device,
            }),
            width: fmt.width,
            height: fmt.height,
            format: config.format,
            info,
            in_use: self.in_use.clone(),
        })
    }
}

#[async_trait]
impl CameraSource for V4l2Camera {
    async fn acquire_stream(&self, facing: Facing) -> Result<Box<dyn VideoStream>> {
        if self
            .in_use
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::Camera(
                "camera is already held by another scan".to_string(),
            ));
        }

        // V4L2 has no notion of facing; the configured device is used as-is.
        tracing::debug!(?facing, "Acquiring V4L2 stream");

        match self.open() {
            Ok(stream) => Ok(Box::new(stream)),
            Err(err) => {
                self.in_use.store(false, Ordering::Release);
                Err(err)
            }
        }
    }
}

fn device_error(info: &CameraDevice, err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::PermissionDenied {
        Error::CameraDenied(format!("{}: {}", info.path, err))
    } else {
        Error::Camera(format!("Failed to open device: {}", err))
    }
}

struct StreamInner {
    /// Memory-mapped V4L2 stream kept warm between captures
    stream: MmapStream<'static>,
    /// Owning handle to the V4L device. Drop order ensures the stream is released first.
    _device: Box<Device>,
}

/// Live V4L2 stream owned by one capture loop
pub struct CameraStream {
    inner: Option<StreamInner>,
    width: u32,
    height: u32,
    format: PixelFormat,
    info: CameraDevice,
    in_use: Arc<AtomicBool>,
}

impl CameraStream {
    /// Device the stream was opened on
    pub fn info(&self) -> &CameraDevice {
        &self.info
    }

    /// Decode a frame buffer into an image
    fn decode_frame(&self, buf: &[u8]) -> Result<DynamicImage> {
        match self.format {
            PixelFormat::Mjpeg => {
                image::load_from_memory_with_format(buf, image::ImageFormat::Jpeg)
                    .map_err(|e| Error::Image(format!("MJPEG decode failed: {}", e)))
            }
            PixelFormat::Yuyv => self.yuyv_to_rgb(buf),
            PixelFormat::Rgb24 => ImageBuffer::from_raw(self.width, self.height, buf.to_vec())
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| Error::Image("Failed to create RGB image".to_string())),
        }
    }

    /// Convert YUYV to RGB
    fn yuyv_to_rgb(&self, yuyv: &[u8]) -> Result<DynamicImage> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Image(format!(
                "invalid YUYV frame size {}x{}",
                self.width, self.height
            )));
        }
        let width = self.width as usize;
        let height = self.height as usize;
        let mut rgb = vec![0u8; width * height * 3];

        for (row, out_row) in yuyv
            .chunks_exact(width * 2)
            .zip(rgb.chunks_exact_mut(width * 3))
            .take(height)
        {
            for (pair, out) in row.chunks_exact(4).zip(out_row.chunks_exact_mut(6)) {
                let u = pair[1] as i32 - 128;
                let v = pair[3] as i32 - 128;
                for (luma, px) in [pair[0], pair[2]].into_iter().zip(out.chunks_exact_mut(3)) {
                    let y = luma as i32;
                    px[0] = (y + ((v * 1436) >> 10)).clamp(0, 255) as u8;
                    px[1] = (y - ((u * 352 + v * 731) >> 10)).clamp(0, 255) as u8;
                    px[2] = (y + ((u * 1814) >> 10)).clamp(0, 255) as u8;
                }
            }
        }

        ImageBuffer::from_raw(self.width, self.height, rgb)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| Error::Image("Failed to create RGB image from YUYV".to_string()))
    }
}

#[async_trait]
impl VideoStream for CameraStream {
    async fn next_frame(&mut self) -> Result<CapturedFrame> {
        let inner = self
            .inner
            .as_mut()
            .ok_or_else(|| Error::FrameCapture("stream already stopped".to_string()))?;

        let (buf, _meta) = inner
            .stream
            .next()
            .map_err(|e| Error::FrameCapture(format!("Failed to capture: {}", e)))?;

        // The driver may hand out an empty buffer while the stream warms up
        if buf.is_empty() {
            return Ok(CapturedFrame::empty());
        }

        let buf = buf.to_vec();
        match self.decode_frame(&buf) {
            Ok(img) => Ok(CapturedFrame::from_rgba(img.to_rgba8())),
            Err(Error::Image(reason)) => {
                // Broken frames are skipped like frames that are not ready
                tracing::debug!(%reason, "Skipping undecodable frame");
                Ok(CapturedFrame::empty())
            }
            Err(err) => Err(err),
        }
    }

    fn stop_tracks(&mut self) {
        if self.inner.take().is_some() {
            self.in_use.store(false, Ordering::Release);
            tracing::info!("Stopped camera stream on {}", self.info.path);
        }
    }
}

impl Drop for CameraStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detached_stream(width: u32, height: u32, format: PixelFormat) -> CameraStream {
        CameraStream {
            inner: None,
            width,
            height,
            format,
            info: CameraDevice {
                index: 0,
                path: "/dev/video0".to_string(),
                name: "test".to_string(),
                driver: "none".to_string(),
                bus_info: String::new(),
            },
            in_use: Arc::new(AtomicBool::new(false)),
        }
    }

    #[test]
    fn test_yuyv_zero_size_is_an_error() {
        let stream = detached_stream(0, 0, PixelFormat::Yuyv);
        assert!(matches!(stream.yuyv_to_rgb(&[16, 128, 16, 128]), Err(Error::Image(_))));
    }

    #[test]
    fn test_yuyv_gray_pair() {
        let stream = detached_stream(2, 1, PixelFormat::Yuyv);
        let img = stream.yuyv_to_rgb(&[200, 128, 50, 128]).unwrap().to_rgb8();
        assert_eq!(img.get_pixel(0, 0).0, [200, 200, 200]);
        assert_eq!(img.get_pixel(1, 0).0, [50, 50, 50]);
    }

    #[test]
    fn test_truncated_mjpeg_is_an_image_error() {
        let stream = detached_stream(4, 4, PixelFormat::Mjpeg);
        assert!(matches!(stream.decode_frame(&[0xFF, 0xD8, 0xFF]), Err(Error::Image(_))));
    }

    #[tokio::test]
    async fn test_camera_acquire_is_exclusive() {
        // Only meaningful where a camera is present
        let camera = V4l2Camera::new(CameraConfig::default());
        match camera.acquire_stream(Facing::Environment).await {
            Ok(mut stream) => {
                assert!(camera.acquire_stream(Facing::Environment).await.is_err());
                stream.stop_tracks();
                drop(stream);
                assert!(!camera.in_use.load(Ordering::Acquire));
            }
            Err(e) => {
                println!("No camera available (expected on CI): {}", e);
                assert!(!camera.in_use.load(Ordering::Acquire));
            }
        }
    }
}
