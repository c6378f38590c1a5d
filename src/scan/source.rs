//! Camera abstraction consumed by the capture loop

use crate::config::Facing;
use crate::error::Result;
use async_trait::async_trait;

/// One raw RGBA8 frame sampled from a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Row-major RGBA8 pixels
    pub pixels: Vec<u8>,
}

impl CapturedFrame {
    /// Wrap an RGBA image
    pub fn from_rgba(image: image::RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            pixels: image.into_raw(),
        }
    }

    /// A frame with no pixels, as produced before the stream has dimensions
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            pixels: Vec::new(),
        }
    }

    /// Whether the frame carries any pixels worth decoding
    pub fn is_ready(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Something that can hand out a live video stream
#[async_trait]
pub trait CameraSource: Send + Sync {
    /// Acquire a stream from the camera facing `facing`.
    ///
    /// Permission problems must be reported as [`crate::Error::CameraDenied`].
    async fn acquire_stream(&self, facing: Facing) -> Result<Box<dyn VideoStream>>;
}

/// A live video stream owned by exactly one capture loop
#[async_trait]
pub trait VideoStream: Send {
    /// Sample the current frame
    async fn next_frame(&mut self) -> Result<CapturedFrame>;

    /// Stop every track of the stream. Must be idempotent.
    fn stop_tracks(&mut self);
}

/// Owns a [`VideoStream`] and stops its tracks when dropped
pub struct StreamGuard {
    stream: Box<dyn VideoStream>,
}

impl StreamGuard {
    /// Take ownership of `stream`
    pub fn new(stream: Box<dyn VideoStream>) -> Self {
        Self { stream }
    }

    /// Sample the next frame from the guarded stream
    pub async fn next_frame(&mut self) -> Result<CapturedFrame> {
        self.stream.next_frame().await
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.stream.stop_tracks();
        tracing::debug!("Camera stream released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Tracked(Arc<AtomicUsize>);

    #[async_trait]
    impl VideoStream for Tracked {
        async fn next_frame(&mut self) -> Result<CapturedFrame> {
            Ok(CapturedFrame::empty())
        }

        fn stop_tracks(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_guard_stops_tracks_on_drop() {
        let stops = Arc::new(AtomicUsize::new(0));
        let guard = StreamGuard::new(Box::new(Tracked(stops.clone())));
        assert_eq!(stops.load(Ordering::SeqCst), 0);
        drop(guard);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_frame_readiness() {
        assert!(!CapturedFrame::empty().is_ready());
        let frame = CapturedFrame::from_rgba(image::RgbaImage::new(4, 2));
        assert!(frame.is_ready());
        assert_eq!(frame.pixels.len(), 4 * 2 * 4);
    }
}
